//! # Configuration
//!
//! Rideboard configuration is managed by [`confique`], which layers environment
//! variables, TOML files and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `RIDEBOARD_BACKEND`, `RIDEBOARD_ENDPOINT`, ...
//! 2. **Explicit file**: passed by the client (`rideboard --config board.toml`).
//! 3. **User file**: `rideboard.toml` in the OS config directory (via `directories`).
//! 4. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `backend` | `local` | `local`, `document` or `bin` |
//! | `endpoint` | (none) | Base URL of the hosted store |
//! | `dialect` | `keyed` | Document store flavor: `keyed` or `rows` |
//! | `collection` | `entries` | Collection / table name for document stores |
//! | `bin_id` | (none) | Bin id for the bin store |
//! | `api_key` | (none) | Static key sent with every request |
//! | `write_policy` | `resilient` | What a failed remote write does: `strict` or `resilient` |
//! | `refresh_secs` | `10` | Auto-refresh period |
//! | `request_timeout_secs` | `15` | Per-request timeout |
//! | `retry_attempts` | `3` | Attempts for idempotent requests |
//! | `retry_backoff_ms` | `120` | Linear backoff step between attempts |
//! | `data_dir` | OS data dir | Where the backup and the local board live |

use crate::error::{RideboardError, Result};
use crate::repository::WritePolicy;
use crate::store::document::Dialect;
use crate::store::http::RetryPolicy;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "rideboard.toml";
pub const BACKUP_FILE_NAME: &str = "backup.json";
pub const LOCAL_BOARD_FILE_NAME: &str = "board.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Board stored only on this machine.
    Local,
    /// Hosted collection with per-entry create/delete.
    Document,
    /// Hosted whole-document bin.
    Bin,
}

/// Configuration for rideboard, stored in `rideboard.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RideboardConfig {
    #[config(default = "local", env = "RIDEBOARD_BACKEND")]
    pub backend: BackendKind,

    #[config(env = "RIDEBOARD_ENDPOINT")]
    pub endpoint: Option<String>,

    #[config(default = "keyed", env = "RIDEBOARD_DIALECT")]
    pub dialect: Dialect,

    #[config(default = "entries", env = "RIDEBOARD_COLLECTION")]
    pub collection: String,

    #[config(env = "RIDEBOARD_BIN_ID")]
    pub bin_id: Option<String>,

    #[config(env = "RIDEBOARD_API_KEY")]
    pub api_key: Option<String>,

    #[config(default = "resilient", env = "RIDEBOARD_WRITE_POLICY")]
    pub write_policy: WritePolicy,

    #[config(default = 10, env = "RIDEBOARD_REFRESH_SECS")]
    pub refresh_secs: u64,

    #[config(default = 15, env = "RIDEBOARD_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    #[config(default = 3, env = "RIDEBOARD_RETRY_ATTEMPTS")]
    pub retry_attempts: usize,

    #[config(default = 120, env = "RIDEBOARD_RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: u64,

    #[config(env = "RIDEBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Default for RideboardConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            endpoint: None,
            dialect: Dialect::Keyed,
            collection: "entries".to_string(),
            bin_id: None,
            api_key: None,
            write_policy: WritePolicy::Resilient,
            refresh_secs: 10,
            request_timeout_secs: 15,
            retry_attempts: 3,
            retry_backoff_ms: 120,
            data_dir: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "rideboard", "rideboard")
}

impl RideboardConfig {
    /// Loads from the environment, an optional explicit file, and the user config file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RideboardError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.file(path);
        }
        if let Some(user) = Self::user_config_path() {
            builder = builder.file(user);
        }
        Ok(builder.load()?)
    }

    /// Loads from one file and the compiled defaults only.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::builder().file(path).load()?)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        project_dirs().map(|d| d.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| project_dirs().map(|d| d.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".rideboard"))
    }

    pub fn backup_path(&self) -> PathBuf {
        self.data_dir().join(BACKUP_FILE_NAME)
    }

    pub fn local_board_path(&self) -> PathBuf {
        self.data_dir().join(LOCAL_BOARD_FILE_NAME)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts.max(1),
            base_backoff_ms: self.retry_backoff_ms,
        }
    }

    /// The endpoint, or a configuration error naming the backend that needs it.
    pub fn require_endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                RideboardError::Config(format!(
                    "backend '{}' needs an endpoint (RIDEBOARD_ENDPOINT)",
                    self.backend_name()
                ))
            })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            BackendKind::Local => "local",
            BackendKind::Document => "document",
            BackendKind::Bin => "bin",
        }
    }

    /// Key/value pairs for display. The api key is masked.
    pub fn display_pairs(&self) -> Vec<(&'static str, String)> {
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        vec![
            ("backend", self.backend_name().to_string()),
            ("endpoint", opt(&self.endpoint)),
            (
                "dialect",
                match self.dialect {
                    Dialect::Keyed => "keyed".to_string(),
                    Dialect::Rows => "rows".to_string(),
                },
            ),
            ("collection", self.collection.clone()),
            ("bin_id", opt(&self.bin_id)),
            (
                "api_key",
                if self.api_key.is_some() {
                    "********".to_string()
                } else {
                    "-".to_string()
                },
            ),
            (
                "write_policy",
                match self.write_policy {
                    WritePolicy::Strict => "strict".to_string(),
                    WritePolicy::Resilient => "resilient".to_string(),
                },
            ),
            ("refresh_secs", self.refresh_secs.to_string()),
            ("request_timeout_secs", self.request_timeout_secs.to_string()),
            ("retry_attempts", self.retry_attempts.to_string()),
            ("retry_backoff_ms", self.retry_backoff_ms.to_string()),
            ("data_dir", self.data_dir().display().to_string()),
        ]
    }
}
