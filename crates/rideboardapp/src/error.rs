use thiserror::Error;

#[derive(Error, Debug)]
pub enum RideboardError {
    /// Network or transport failure. Recoverable: triggers the local fallback.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// The store answered, but refused the request (4xx-class).
    #[error("Remote store rejected the request ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    #[error("Could not write local backup: {0}")]
    BackupWriteFailed(String),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RideboardError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            status,
            message: message.into(),
        }
    }
}

impl From<confique::Error> for RideboardError {
    fn from(err: confique::Error) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RideboardError>;
