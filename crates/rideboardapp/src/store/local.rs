use super::json_file::{EntryDocument, JsonFile};
use super::{DeleteOutcome, RemoteStore, StoreSemantics};
use crate::error::{RideboardError, Result};
use crate::model::Entry;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Local-only store: the whole board lives in one JSON document on this machine.
///
/// Other processes sharing the file see each other's writes on their next `load()`.
pub struct LocalStore {
    file: JsonFile,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
            write_lock: Mutex::new(()),
        }
    }

    fn read_doc(&self) -> Result<EntryDocument> {
        match self.file.read() {
            Ok(doc) => Ok(doc.unwrap_or_default()),
            Err(RideboardError::Serialization(e)) => {
                warn!(path = %self.file.path().display(), error = %e, "local board is corrupt, reading as empty");
                Ok(EntryDocument::default())
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    fn write_doc(&self, entries: Vec<Entry>) -> Result<()> {
        self.file
            .write(&EntryDocument::new(entries, Vec::new()))
            .map_err(unavailable)
    }
}

fn unavailable(err: RideboardError) -> RideboardError {
    RideboardError::RemoteUnavailable(format!("local board: {}", err))
}

#[async_trait]
impl RemoteStore for LocalStore {
    fn tag(&self) -> &'static str {
        "local"
    }

    fn semantics(&self) -> StoreSemantics {
        StoreSemantics::LocalOnly
    }

    async fn list(&self) -> Result<Vec<Entry>> {
        Ok(self.read_doc()?.entries)
    }

    async fn create(&self, entry: &Entry) -> Result<Entry> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_doc()?.entries;
        entries.retain(|e| e.id != entry.id);
        entries.insert(0, entry.clone());
        self.write_doc(entries)?;
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_doc()?.entries;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(DeleteOutcome::NotFound);
        }
        self.write_doc(entries)?;
        Ok(DeleteOutcome::Deleted)
    }
}
