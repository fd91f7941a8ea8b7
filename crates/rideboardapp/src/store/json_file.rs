use crate::error::{RideboardError, Result};
use crate::model::Entry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// On-disk layout shared by the local store and the backup cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDocument {
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Ids of entries kept locally whose remote write is unconfirmed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<String>,
}

impl EntryDocument {
    pub fn new(entries: Vec<Entry>, pending: Vec<String>) -> Self {
        Self {
            entries,
            last_updated: Some(Utc::now()),
            pending,
        }
    }
}

/// A single JSON document on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. `Ok(None)` if the file does not exist.
    pub fn read(&self) -> Result<Option<EntryDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(RideboardError::Io)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let doc = serde_json::from_str(&content).map_err(RideboardError::Serialization)?;
        Ok(Some(doc))
    }

    pub fn write(&self, doc: &EntryDocument) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(RideboardError::Io)?;
        }

        let content = serde_json::to_string_pretty(doc).map_err(RideboardError::Serialization)?;

        // Atomic write
        let tmp = dir.join(format!(".rideboard-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(RideboardError::Io)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(RideboardError::Io(e));
        }
        Ok(())
    }
}
