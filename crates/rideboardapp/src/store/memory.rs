use super::{DeleteOutcome, RemoteStore, StoreSemantics};
use crate::error::{RideboardError, Result};
use crate::model::Entry;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// How a [`MemStore`] operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Behave like a dropped connection.
    Unavailable,
    /// Behave like a 4xx answer with the given status.
    Rejected(u16),
    /// Apply the write, then report the connection as lost.
    LostAck,
}

impl Failure {
    fn to_error(self, op: &str) -> RideboardError {
        match self {
            Failure::Unavailable | Failure::LostAck => {
                RideboardError::RemoteUnavailable(format!("simulated {} failure", op))
            }
            Failure::Rejected(status) => {
                RideboardError::rejected(status, format!("simulated {} rejection", op))
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    list: Option<Failure>,
    create: Option<Failure>,
    delete: Option<Failure>,
}

/// In-memory store for tests, with failure injection and call counters.
pub struct MemStore {
    entries: Mutex<Vec<Entry>>,
    faults: Mutex<Faults>,
    semantics: StoreSemantics,
    assign_ids: bool,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl Default for MemStore {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            faults: Mutex::new(Faults::default()),
            semantics: StoreSemantics::FullReadWrite,
            assign_ids: false,
            next_id: AtomicUsize::new(1),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_semantics(mut self, semantics: StoreSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Make the store replace client ids with its own (`mem-1`, `mem-2`, ...).
    pub fn with_store_ids(mut self) -> Self {
        self.assign_ids = true;
        self
    }

    pub fn seed(&self, entries: Vec<Entry>) {
        *self.lock_entries() = entries;
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.lock_entries().clone()
    }

    /// Fail every operation as unreachable (or stop doing so).
    pub fn set_offline(&self, offline: bool) {
        let failure = offline.then_some(Failure::Unavailable);
        let mut faults = self.lock_faults();
        faults.list = failure;
        faults.create = failure;
        faults.delete = failure;
    }

    pub fn fail_list(&self, failure: Option<Failure>) {
        self.lock_faults().list = failure;
    }

    pub fn fail_create(&self, failure: Option<Failure>) {
        self.lock_faults().create = failure;
    }

    pub fn fail_delete(&self, failure: Option<Failure>) {
        self.lock_faults().delete = failure;
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_faults(&self) -> std::sync::MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn store_entry(&self, entry: &Entry) -> Entry {
        let mut stored = entry.clone();
        if self.assign_ids {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            stored.id = format!("mem-{}", n);
        }
        self.lock_entries().push(stored.clone());
        stored
    }
}

#[async_trait]
impl RemoteStore for MemStore {
    fn tag(&self) -> &'static str {
        "memory"
    }

    fn semantics(&self) -> StoreSemantics {
        self.semantics
    }

    async fn list(&self) -> Result<Vec<Entry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.lock_faults().list {
            return Err(failure.to_error("list"));
        }
        Ok(self.entries())
    }

    async fn create(&self, entry: &Entry) -> Result<Entry> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.lock_faults().create;
        match fault {
            None => Ok(self.store_entry(entry)),
            Some(Failure::LostAck) => {
                self.store_entry(entry);
                Err(Failure::LostAck.to_error("create"))
            }
            Some(failure) => Err(failure.to_error("create")),
        }
    }

    async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.lock_faults().delete;
        match fault {
            None => {}
            Some(Failure::LostAck) => {
                self.lock_entries().retain(|e| e.id != id);
                return Err(Failure::LostAck.to_error("delete"));
            }
            Some(failure) => return Err(failure.to_error("delete")),
        }

        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            Ok(DeleteOutcome::NotFound)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }
}
