//! Local backup of the last-known-good working set.
//!
//! The backup is a mirror, never a source of truth while the remote store answers.
//! Reads never fail: a missing or corrupt file is an empty backup.

use crate::error::{RideboardError, Result};
use crate::model::Entry;
use crate::store::json_file::{EntryDocument, JsonFile};
use std::path::{Path, PathBuf};
use tracing::warn;

/// What a backup read yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupSnapshot {
    pub entries: Vec<Entry>,
    pub pending: Vec<String>,
}

impl BackupSnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LocalBackupCache {
    file: JsonFile,
}

impl LocalBackupCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn read(&self) -> BackupSnapshot {
        match self.file.read() {
            Ok(Some(doc)) => BackupSnapshot {
                entries: doc.entries,
                pending: doc.pending,
            },
            Ok(None) => BackupSnapshot::default(),
            Err(e) => {
                warn!(path = %self.path().display(), error = %e, "unreadable backup, treating as empty");
                BackupSnapshot::default()
            }
        }
    }

    pub fn write(&self, entries: &[Entry], pending: &[String]) -> Result<()> {
        self.file
            .write(&EntryDocument::new(entries.to_vec(), pending.to_vec()))
            .map_err(|e| RideboardError::BackupWriteFailed(e.to_string()))
    }
}
