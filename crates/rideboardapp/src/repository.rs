//! # Entry Repository
//!
//! The repository owns the in-memory working set and decides, for every operation,
//! what happens when the remote store does not cooperate.
//!
//! ## State
//!
//! - `entries`: the working set, newest first, ids unique.
//! - `sync_state`: [`SyncState::Unknown`] until the first load, then `Synced` or
//!   `LocalOnly`.
//! - `pending`: entries kept locally whose remote create is unconfirmed, oldest first.
//! - `version`: bumped by every change to the working set.
//!
//! ## Fallback Rules
//!
//! | Operation | Remote ok | Remote fails |
//! |-----------|-----------|--------------|
//! | `load` | listing + pending, `Synced`, mirrored to backup | backup (or current set), `LocalOnly` |
//! | `add` | confirmed entry replaces the optimistic one | `strict`: rolled back. `resilient`: kept as pending |
//! | `remove` | removed, backup refreshed | re-load to reconcile |
//!
//! Against append-only stores a failed create may still have landed, so `add` re-lists
//! after applying the write policy and trusts what the store reports.
//!
//! ## Pending Entries
//!
//! Pending entries are persisted in the backup (`pending` ids) and adopted when a
//! repository is opened over that backup. `load` lists first, then pushes the ones
//! the listing does not already hold, oldest first, so a create whose acknowledgment
//! was lost is not sent twice. The first failed push stops the round.
//!
//! ## Concurrency
//!
//! `load`, `add` and `remove` are serialized by an async operation guard. The working
//! set sits behind a separate lock that is never held across a remote call, so
//! [`EntryRepository::filter`] and [`EntryRepository::snapshot`] never wait on the
//! network. A listing is committed only if the working set has not changed since the
//! listing was requested.

use crate::backup::LocalBackupCache;
use crate::error::{RideboardError, Result};
use crate::filter::EntryFilter;
use crate::model::{sort_newest_first, Entry, EntryDraft, SyncState};
use crate::notify::Notification;
use crate::store::{RemoteStore, StoreSemantics};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

pub const MSG_SHARED: &str = "Travel plan shared with all classmates!";
pub const MSG_SAVED_OFFLINE: &str = "Saved locally. Will sync when online.";
pub const MSG_SAVED_SETUP: &str = "Saved locally. Database setup needed.";
pub const MSG_SAVE_FAILED: &str = "Error saving. Please try again.";
pub const MSG_LOADED_BACKUP: &str = "Loaded from local backup";
pub const MSG_SETUP_NEEDED: &str = "Database setup needed.";
pub const MSG_LOAD_FAILED: &str = "Error loading data. Please refresh.";
pub const MSG_DELETE_FAILED: &str = "Error deleting. Please try again.";
pub const MSG_BACKUP_FAILED: &str = "Could not update the local backup.";

/// What a failed remote create does to the optimistic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Roll the entry back and report the failure.
    Strict,
    /// Keep the entry locally and sync it later.
    #[default]
    Resilient,
}

/// Where the working set came from after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Backup,
    /// Remote and backup both failed; the previous working set was kept.
    Memory,
    /// The listing arrived after the working set changed and was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: LoadSource,
    pub sync_state: SyncState,
    /// Pending entries confirmed by the store during this load.
    pub pushed: usize,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Synced,
    Pending,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct AddReport {
    pub entry: Entry,
    pub outcome: AddOutcome,
    pub sync_state: SyncState,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Deleted,
    NotFound,
    /// The store failed and the entry is still on the board after reconciling.
    Failed,
}

#[derive(Debug, Clone)]
pub struct RemoveReport {
    pub removed: Option<Entry>,
    pub outcome: RemoveOutcome,
    pub sync_state: SyncState,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
    pub sync_state: SyncState,
    pub pending: usize,
}

#[derive(Debug)]
struct State {
    entries: Vec<Entry>,
    sync_state: SyncState,
    pending: Vec<Entry>,
    version: u64,
}

impl State {
    fn touch(&mut self) {
        self.version += 1;
    }

    fn is_pending(&self, id: &str) -> bool {
        self.pending.iter().any(|e| e.id == id)
    }

    fn pending_ids(&self) -> Vec<String> {
        self.pending.iter().map(|e| e.id.clone()).collect()
    }

    /// Replaces the working set with `base` plus any pending entries it lacks.
    fn adopt(&mut self, base: Vec<Entry>) {
        let mut seen = HashSet::new();
        let mut merged: Vec<Entry> = base
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect();
        for entry in &self.pending {
            if seen.insert(entry.id.clone()) {
                merged.push(entry.clone());
            }
        }
        sort_newest_first(&mut merged);
        self.entries = merged;
        self.touch();
    }
}

pub struct EntryRepository {
    store: Arc<dyn RemoteStore>,
    backup: LocalBackupCache,
    policy: WritePolicy,
    op_guard: Mutex<()>,
    state: RwLock<State>,
}

impl EntryRepository {
    /// Opens a repository. Pending entries recorded in the backup are adopted so the
    /// next load can push them.
    pub fn new(store: Arc<dyn RemoteStore>, backup: LocalBackupCache, policy: WritePolicy) -> Self {
        let snapshot = backup.read();
        let pending: Vec<Entry> = snapshot
            .pending
            .iter()
            .filter_map(|id| snapshot.entries.iter().find(|e| &e.id == id).cloned())
            .collect();
        if !pending.is_empty() {
            info!(count = pending.len(), "adopting pending entries from backup");
        }
        Self {
            store,
            backup,
            policy,
            op_guard: Mutex::new(()),
            state: RwLock::new(State {
                entries: Vec::new(),
                sync_state: SyncState::Unknown,
                pending,
                version: 0,
            }),
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.read_state().sync_state
    }

    pub fn version(&self) -> u64 {
        self.read_state().version
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.read_state();
        Snapshot {
            entries: state.entries.clone(),
            sync_state: state.sync_state,
            pending: state.pending.len(),
        }
    }

    /// Entries matching `filter`, in working-set order.
    pub fn filter(&self, filter: &EntryFilter) -> Vec<Entry> {
        filter.apply(&self.read_state().entries)
    }

    pub fn find(&self, id: &str) -> Option<Entry> {
        self.read_state().entries.iter().find(|e| e.id == id).cloned()
    }

    #[instrument(skip(self), fields(store = self.store.tag()))]
    pub async fn load(&self) -> LoadReport {
        let _op = self.op_guard.lock().await;
        self.load_locked().await
    }

    #[instrument(skip(self, draft), fields(store = self.store.tag()))]
    pub async fn add(&self, draft: EntryDraft) -> Result<AddReport> {
        let entry = draft.into_entry()?;
        let _op = self.op_guard.lock().await;
        let mut notifications = self.ensure_loaded().await;

        {
            let mut state = self.write_state();
            state.entries.retain(|e| e.id != entry.id);
            state.entries.insert(0, entry.clone());
            sort_newest_first(&mut state.entries);
            state.touch();
        }

        let mut outcome = match self.store.create(&entry).await {
            Ok(stored) => {
                {
                    let mut state = self.write_state();
                    replace_entry(&mut state.entries, &entry.id, stored.clone());
                    sort_newest_first(&mut state.entries);
                    state.sync_state = if state.pending.is_empty() {
                        SyncState::Synced
                    } else {
                        SyncState::LocalOnly
                    };
                    state.touch();
                }
                debug!(id = %stored.id, "entry confirmed by store");
                self.persist(&mut notifications);
                return Ok(AddReport {
                    entry: stored,
                    outcome: AddOutcome::Synced,
                    sync_state: self.sync_state(),
                    notifications: with_first(notifications, Notification::success(MSG_SHARED)),
                });
            }
            Err(e) => self.apply_write_policy(&entry, &e, &mut notifications),
        };

        let mut entry = entry;
        if self.store.semantics() == StoreSemantics::AppendOnly {
            if let Some(landed) = self.reconcile_append(&entry.id).await {
                debug!(id = %landed.id, "create landed despite the error");
                outcome = AddOutcome::Synced;
                entry = landed;
                notifications = vec![Notification::success(MSG_SHARED)];
            }
        }
        self.persist(&mut notifications);

        Ok(AddReport {
            entry,
            outcome,
            sync_state: self.sync_state(),
            notifications,
        })
    }

    /// Removes an entry. Confirmation is the caller's job.
    #[instrument(skip(self), fields(store = self.store.tag()))]
    pub async fn remove(&self, id: &str) -> RemoveReport {
        let _op = self.op_guard.lock().await;
        let mut notifications = self.ensure_loaded().await;

        let (removed, pending_only) = {
            let mut state = self.write_state();
            let pending_only = state.is_pending(id);
            let removed = take_entry(&mut state.entries, id);
            if pending_only {
                state.pending.retain(|e| e.id != id);
            }
            if removed.is_some() || pending_only {
                state.touch();
            }
            (removed, pending_only)
        };

        let Some(removed) = removed else {
            debug!(%id, "remove of unknown id");
            return RemoveReport {
                removed: None,
                outcome: RemoveOutcome::NotFound,
                sync_state: self.sync_state(),
                notifications,
            };
        };

        if pending_only {
            // Never reached the store, so there is nothing to delete remotely.
            self.persist(&mut notifications);
            notifications.push(deleted_message(&removed));
            return RemoveReport {
                removed: Some(removed),
                outcome: RemoveOutcome::Deleted,
                sync_state: self.sync_state(),
                notifications,
            };
        }

        match self.store.delete(id).await {
            Ok(outcome) => {
                debug!(%id, ?outcome, "entry deleted");
                {
                    let mut state = self.write_state();
                    if state.pending.is_empty() {
                        state.sync_state = SyncState::Synced;
                    }
                }
                self.persist(&mut notifications);
                notifications.push(deleted_message(&removed));
                RemoveReport {
                    removed: Some(removed),
                    outcome: RemoveOutcome::Deleted,
                    sync_state: self.sync_state(),
                    notifications,
                }
            }
            Err(e) => {
                warn!(%id, error = %e, "delete failed, reconciling");
                let report = self.load_locked().await;
                let still_there = self.find(id).is_some();
                if still_there {
                    notifications.push(Notification::error(MSG_DELETE_FAILED));
                    notifications.extend(report.notifications);
                    RemoveReport {
                        removed: None,
                        outcome: RemoveOutcome::Failed,
                        sync_state: self.sync_state(),
                        notifications,
                    }
                } else {
                    notifications.push(deleted_message(&removed));
                    RemoveReport {
                        removed: Some(removed),
                        outcome: RemoveOutcome::Deleted,
                        sync_state: self.sync_state(),
                        notifications,
                    }
                }
            }
        }
    }

    /// Commits a listing requested at `stamp`. Returns false if the working set has
    /// changed since then and the listing was discarded.
    pub fn commit_listing(&self, stamp: u64, listing: Vec<Entry>) -> bool {
        self.commit(stamp, listing, &[])
    }

    /// Commits a listing and drops from `pending` every entry it already holds, plus
    /// the ids in `confirmed`.
    fn commit(&self, stamp: u64, listing: Vec<Entry>, confirmed: &[String]) -> bool {
        let mut state = self.write_state();
        if state.version != stamp {
            debug!(
                stamp,
                current = state.version,
                "discarding stale listing"
            );
            return false;
        }
        state
            .pending
            .retain(|e| !confirmed.contains(&e.id) && !is_listed(&listing, e));
        state.adopt(listing);
        state.sync_state = if state.pending.is_empty() {
            SyncState::Synced
        } else {
            SyncState::LocalOnly
        };
        true
    }

    async fn ensure_loaded(&self) -> Vec<Notification> {
        if self.sync_state() == SyncState::Unknown {
            self.load_locked().await.notifications
        } else {
            Vec::new()
        }
    }

    async fn load_locked(&self) -> LoadReport {
        let mut notifications = Vec::new();

        let stamp = self.version();
        match self.store.list().await {
            Ok(mut listing) => {
                debug!(count = listing.len(), "store listing received");
                let (confirmed, stored) = self.push_pending(&listing).await;
                let pushed = confirmed.len();
                listing.extend(stored);
                if !self.commit(stamp, listing, &confirmed) {
                    return LoadReport {
                        source: LoadSource::Stale,
                        sync_state: self.sync_state(),
                        pushed,
                        notifications,
                    };
                }
                if pushed > 0 {
                    info!(pushed, "pending entries synced");
                }
                self.persist(&mut notifications);
                LoadReport {
                    source: LoadSource::Remote,
                    sync_state: self.sync_state(),
                    pushed,
                    notifications,
                }
            }
            Err(e) => {
                warn!(error = %e, "listing failed, falling back to local backup");
                let source = self.fall_back();
                let has_entries = !self.read_state().entries.is_empty();
                notifications.push(match (&e, has_entries) {
                    (RideboardError::RemoteRejected { .. }, true) => {
                        Notification::warning(format!("{} {}", MSG_SETUP_NEEDED, MSG_LOADED_BACKUP))
                    }
                    (RideboardError::RemoteRejected { .. }, false) => {
                        Notification::warning(MSG_SETUP_NEEDED)
                    }
                    (_, true) => Notification::warning(MSG_LOADED_BACKUP),
                    (_, false) => Notification::error(MSG_LOAD_FAILED),
                });
                LoadReport {
                    source,
                    sync_state: SyncState::LocalOnly,
                    pushed: 0,
                    notifications,
                }
            }
        }
    }

    fn fall_back(&self) -> LoadSource {
        let backup = self.backup.read();
        let mut state = self.write_state();
        state.sync_state = SyncState::LocalOnly;
        if backup.is_empty() {
            state.touch();
            return LoadSource::Memory;
        }
        for id in &backup.pending {
            if state.is_pending(id) {
                continue;
            }
            if let Some(entry) = backup.entries.iter().find(|e| &e.id == id) {
                state.pending.push(entry.clone());
            }
        }
        state.adopt(backup.entries);
        LoadSource::Backup
    }

    /// Pushes pending entries the listing does not already hold, oldest first.
    /// Returns the client ids the store confirmed and the entries it stored. The
    /// working set is left alone; the caller commits both with the listing.
    async fn push_pending(&self, listing: &[Entry]) -> (Vec<String>, Vec<Entry>) {
        let queue: Vec<Entry> = self.read_state().pending.clone();
        let mut confirmed = Vec::new();
        let mut stored = Vec::new();
        for entry in queue.into_iter().filter(|e| !is_listed(listing, e)) {
            match self.store.create(&entry).await {
                Ok(landed) => {
                    confirmed.push(entry.id);
                    stored.push(landed);
                }
                Err(e) => {
                    debug!(id = %entry.id, error = %e, "pending push failed, will retry later");
                    break;
                }
            }
        }
        (confirmed, stored)
    }

    fn apply_write_policy(
        &self,
        entry: &Entry,
        err: &RideboardError,
        notifications: &mut Vec<Notification>,
    ) -> AddOutcome {
        let mut state = self.write_state();
        match self.policy {
            WritePolicy::Strict => {
                warn!(id = %entry.id, error = %err, "create failed, rolling back");
                take_entry(&mut state.entries, &entry.id);
                state.touch();
                notifications.push(Notification::error(MSG_SAVE_FAILED));
                AddOutcome::RolledBack
            }
            WritePolicy::Resilient => {
                warn!(id = %entry.id, error = %err, "create failed, keeping entry locally");
                if !state.is_pending(&entry.id) {
                    state.pending.push(entry.clone());
                }
                state.sync_state = SyncState::LocalOnly;
                state.touch();
                let message = match err {
                    RideboardError::RemoteRejected { .. } => MSG_SAVED_SETUP,
                    _ => MSG_SAVED_OFFLINE,
                };
                notifications.push(Notification::warning(message));
                AddOutcome::Pending
            }
        }
    }

    /// Re-lists after a failed create on an append-only store. Returns the entry if
    /// the store has it after all.
    async fn reconcile_append(&self, id: &str) -> Option<Entry> {
        let stamp = self.version();
        let listing = match self.store.list().await {
            Ok(listing) => listing,
            Err(e) => {
                debug!(error = %e, "reconcile listing failed");
                return None;
            }
        };
        let landed = listing.iter().find(|e| e.id == id).cloned();
        self.commit_listing(stamp, listing);
        landed
    }

    /// Mirrors the working set to the backup. Failure is reported, never fatal.
    fn persist(&self, notifications: &mut Vec<Notification>) {
        let (entries, pending) = {
            let state = self.read_state();
            (state.entries.clone(), state.pending_ids())
        };
        if let Err(e) = self.backup.write(&entries, &pending) {
            warn!(error = %e, "backup write failed");
            notifications.push(Notification::warning(MSG_BACKUP_FAILED));
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// True if `listing` already holds `entry`: same id, or a store-assigned id on a
/// record with the same author and creation instant.
fn is_listed(listing: &[Entry], entry: &Entry) -> bool {
    listing.iter().any(|listed| {
        listed.id == entry.id
            || (listed.created_at == entry.created_at && listed.name == entry.name)
    })
}

fn take_entry(entries: &mut Vec<Entry>, id: &str) -> Option<Entry> {
    let pos = entries.iter().position(|e| e.id == id)?;
    Some(entries.remove(pos))
}

/// Swaps the entry with `id` for `stored`, dropping any other copy of `stored.id`.
fn replace_entry(entries: &mut Vec<Entry>, id: &str, stored: Entry) {
    entries.retain(|e| e.id == id || e.id != stored.id);
    match entries.iter_mut().find(|e| e.id == id) {
        Some(slot) => *slot = stored,
        None => entries.push(stored),
    }
}

fn deleted_message(entry: &Entry) -> Notification {
    Notification::success(format!("Deleted {}'s travel plan.", entry.display_name()))
}

fn with_first(mut rest: Vec<Notification>, first: Notification) -> Vec<Notification> {
    rest.insert(0, first);
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TypeFilter;
    use crate::model::EntryType;
    use crate::notify::Severity;
    use crate::store::memory::{Failure, MemStore};
    use chrono::{DateTime, NaiveDate, Utc};
    use std::sync::atomic::Ordering;
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        store: Arc<MemStore>,
        backup: LocalBackupCache,
        repo: EntryRepository,
    }

    fn fixture_with(store: MemStore, policy: WritePolicy) -> Fixture {
        let dir = tempdir().unwrap();
        let backup = LocalBackupCache::new(dir.path().join("backup.json"));
        let store = Arc::new(store);
        let repo = EntryRepository::new(store.clone(), backup.clone(), policy);
        Fixture {
            _dir: dir,
            store,
            backup,
            repo,
        }
    }

    fn fixture(policy: WritePolicy) -> Fixture {
        fixture_with(MemStore::new(), policy)
    }

    fn draft(name: &str, kind: &str) -> EntryDraft {
        EntryDraft {
            name: name.into(),
            kind: kind.into(),
            from: "Campus".into(),
            to: "Airport".into(),
            ..Default::default()
        }
    }

    fn stamped(id: &str, micros: i64) -> Entry {
        draft(id, "offering-ride")
            .build(
                id.to_string(),
                DateTime::<Utc>::from_timestamp_micros(micros).unwrap(),
            )
            .unwrap()
    }

    fn ids(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[tokio::test]
    async fn starts_unknown_and_empty() {
        let f = fixture(WritePolicy::Resilient);
        let snap = f.repo.snapshot();
        assert_eq!(snap.sync_state, SyncState::Unknown);
        assert!(snap.entries.is_empty());
    }

    #[tokio::test]
    async fn load_sorts_newest_first() {
        let f = fixture(WritePolicy::Resilient);
        f.store
            .seed(vec![stamped("t", 1_000), stamped("t1", 1_001)]);

        let report = f.repo.load().await;
        assert_eq!(report.source, LoadSource::Remote);
        assert_eq!(report.sync_state, SyncState::Synced);
        assert_eq!(ids(&f.repo.snapshot().entries), vec!["t1", "t"]);
    }

    #[tokio::test]
    async fn ties_keep_listing_order() {
        let f = fixture(WritePolicy::Resilient);
        f.store.seed(vec![
            stamped("a", 5),
            stamped("b", 5),
            stamped("c", 9),
            stamped("d", 5),
        ]);
        f.repo.load().await;
        assert_eq!(ids(&f.repo.snapshot().entries), vec!["c", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn adds_stay_sorted_after_load() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.load().await;
        for name in ["Ana", "Ben", "Cy"] {
            f.repo.add(draft(name, "seeking-ride")).await.unwrap();
        }
        f.repo.load().await;
        let names: Vec<_> = f
            .repo
            .snapshot()
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect();
        assert_eq!(names, vec!["Cy", "Ben", "Ana"]);
    }

    #[tokio::test]
    async fn wildcard_filter_is_identity() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        f.repo.add(draft("Ben", "flight-info")).await.unwrap();
        assert_eq!(
            f.repo.filter(&EntryFilter::default()),
            f.repo.snapshot().entries
        );
    }

    #[tokio::test]
    async fn filter_applies_type_and_date() {
        let f = fixture(WritePolicy::Resilient);
        let mut d = draft("Ana", "offering-ride");
        d.date = "2026-03-04".into();
        f.repo.add(d).await.unwrap();
        let mut d = draft("Ben", "offering-ride");
        d.date = "2026-03-05".into();
        f.repo.add(d).await.unwrap();
        f.repo.add(draft("Cy", "flight-info")).await.unwrap();

        let filter = EntryFilter::new(
            TypeFilter::Only(EntryType::OfferingRide),
            NaiveDate::from_ymd_opt(2026, 3, 4),
        );
        let hits = f.repo.filter(&filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ana");
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_store() {
        let f = fixture(WritePolicy::Resilient);
        let err = f.repo.add(draft("  ", "offering-ride")).await.unwrap_err();
        assert!(matches!(err, RideboardError::InvalidEntry(_)));
        assert_eq!(f.store.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn add_synced_writes_backup() {
        let f = fixture(WritePolicy::Resilient);
        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.outcome, AddOutcome::Synced);
        assert_eq!(report.sync_state, SyncState::Synced);
        assert_eq!(report.notifications[0].message, MSG_SHARED);
        assert_eq!(f.backup.read().entries, vec![report.entry]);
    }

    #[tokio::test]
    async fn add_against_unloaded_repository_loads_first() {
        let f = fixture(WritePolicy::Resilient);
        f.store.seed(vec![stamped("old", 1)]);
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();

        assert_eq!(f.store.list_calls.load(Ordering::SeqCst), 1);
        let backup = f.backup.read();
        assert_eq!(backup.entries.len(), 2);
    }

    #[tokio::test]
    async fn store_assigned_id_replaces_client_id() {
        let f = fixture_with(MemStore::new().with_store_ids(), WritePolicy::Resilient);
        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.entry.id, "mem-1");
        assert_eq!(ids(&f.repo.snapshot().entries), vec!["mem-1"]);
    }

    #[tokio::test]
    async fn remove_twice_is_remove_once() {
        let f = fixture(WritePolicy::Resilient);
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;
        f.repo.add(draft("Ben", "offering-ride")).await.unwrap();

        let first = f.repo.remove(&ana.id).await;
        assert_eq!(first.outcome, RemoveOutcome::Deleted);
        assert_eq!(
            first.notifications.last().unwrap().message,
            "Deleted Ana's travel plan."
        );
        let after_once = f.repo.snapshot().entries;

        let second = f.repo.remove(&ana.id).await;
        assert_eq!(second.outcome, RemoveOutcome::NotFound);
        assert_eq!(f.repo.snapshot().entries, after_once);
        assert_eq!(f.store.entries().len(), 1);
    }

    #[tokio::test]
    async fn remove_unknown_id_changes_nothing() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        let before = f.repo.snapshot();

        let report = f.repo.remove("no-such-id").await;
        assert_eq!(report.outcome, RemoveOutcome::NotFound);
        assert_eq!(f.repo.snapshot(), before);
    }

    #[tokio::test]
    async fn offline_load_uses_backup() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        f.repo.add(draft("Ben", "seeking-ride")).await.unwrap();
        f.store.set_offline(true);

        let report = f.repo.load().await;
        assert_eq!(report.source, LoadSource::Backup);
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        assert_eq!(report.notifications[0].severity, Severity::Warning);
        assert_eq!(f.repo.snapshot().entries, f.backup.read().entries);
    }

    #[tokio::test]
    async fn offline_load_with_nothing_anywhere_is_empty() {
        let f = fixture(WritePolicy::Resilient);
        f.store.set_offline(true);
        let report = f.repo.load().await;
        assert_eq!(report.source, LoadSource::Memory);
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        assert_eq!(report.notifications[0].message, MSG_LOAD_FAILED);
        assert!(f.repo.snapshot().entries.is_empty());
    }

    #[tokio::test]
    async fn rejected_listing_reports_setup_needed() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        f.store.fail_list(Some(Failure::Rejected(404)));

        let report = f.repo.load().await;
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        assert!(report.notifications[0]
            .message
            .starts_with("Database setup needed."));
    }

    #[tokio::test]
    async fn rejected_listing_on_fresh_board_reports_setup_needed() {
        let f = fixture(WritePolicy::Resilient);
        f.store.fail_list(Some(Failure::Rejected(404)));

        let report = f.repo.load().await;
        assert_eq!(report.source, LoadSource::Memory);
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        assert_eq!(
            report.notifications,
            vec![Notification::warning(MSG_SETUP_NEEDED)]
        );
    }

    #[tokio::test]
    async fn resilient_add_survives_in_backup() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::Unavailable));

        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.outcome, AddOutcome::Pending);
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        assert_eq!(report.notifications[0].message, MSG_SAVED_OFFLINE);

        let backup = f.backup.read();
        assert_eq!(backup.entries, vec![report.entry.clone()]);
        assert_eq!(backup.pending, vec![report.entry.id.clone()]);
        assert_eq!(f.repo.snapshot().pending, 1);
    }

    #[tokio::test]
    async fn resilient_add_rejected_needs_setup() {
        let f = fixture(WritePolicy::Resilient);
        f.store.fail_create(Some(Failure::Rejected(401)));
        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.notifications[0].message, MSG_SAVED_SETUP);
    }

    #[tokio::test]
    async fn strict_add_rolls_back() {
        let f = fixture(WritePolicy::Strict);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::Unavailable));

        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.outcome, AddOutcome::RolledBack);
        assert_eq!(report.notifications[0].severity, Severity::Error);
        assert!(f.repo.snapshot().entries.is_empty());
        assert!(f.backup.read().entries.is_empty());
    }

    #[tokio::test]
    async fn append_only_lost_ack_is_reconciled_by_listing() {
        let store = MemStore::new().with_semantics(StoreSemantics::AppendOnly);
        let f = fixture_with(store, WritePolicy::Strict);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::LostAck));

        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.outcome, AddOutcome::Synced);
        assert_eq!(ids(&f.repo.snapshot().entries), vec![report.entry.id.clone()]);
        assert_eq!(f.repo.snapshot().pending, 0);
        assert_eq!(f.backup.read().entries.len(), 1);
    }

    #[tokio::test]
    async fn append_only_real_failure_stays_pending() {
        let store = MemStore::new().with_semantics(StoreSemantics::AppendOnly);
        let f = fixture_with(store, WritePolicy::Resilient);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::Unavailable));

        let report = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.outcome, AddOutcome::Pending);
        // The re-list succeeded but did not contain the entry.
        assert_eq!(f.store.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(f.repo.snapshot().entries.len(), 1);
        assert_eq!(f.repo.snapshot().pending, 1);
    }

    #[tokio::test]
    async fn pending_entries_are_pushed_on_next_load() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::Unavailable));
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;
        f.store.fail_create(None);

        let report = f.repo.load().await;
        assert_eq!(report.pushed, 1);
        assert_eq!(report.sync_state, SyncState::Synced);
        assert_eq!(f.store.entries(), vec![ana]);
        assert_eq!(f.repo.snapshot().pending, 0);
        assert!(f.backup.read().pending.is_empty());
    }

    #[tokio::test]
    async fn pending_entries_survive_a_restart() {
        let f = fixture(WritePolicy::Resilient);
        f.store.set_offline(true);
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;

        let reopened = EntryRepository::new(f.store.clone(), f.backup.clone(), WritePolicy::Resilient);
        assert_eq!(reopened.snapshot().pending, 1);
        f.store.set_offline(false);

        let report = reopened.load().await;
        assert_eq!(report.pushed, 1);
        assert_eq!(ids(&reopened.snapshot().entries), vec![ana.id]);
    }

    #[tokio::test]
    async fn pending_listed_remotely_is_not_pushed_twice() {
        let store = MemStore::new().with_semantics(StoreSemantics::AppendOnly);
        let f = fixture_with(store, WritePolicy::Resilient);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::Unavailable));
        f.store.fail_list(Some(Failure::Unavailable));
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;
        assert_eq!(f.repo.snapshot().pending, 1);

        // Someone else got it there.
        f.store.seed(vec![ana.clone()]);
        f.store.fail_list(None);
        f.store.fail_create(Some(Failure::Unavailable));
        let report = f.repo.load().await;
        assert_eq!(report.pushed, 0);
        assert_eq!(report.sync_state, SyncState::Synced);
        assert_eq!(f.repo.snapshot().pending, 0);
    }

    #[tokio::test]
    async fn lost_create_ack_is_not_pushed_again() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::LostAck));
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(ana.outcome, AddOutcome::Pending);
        f.store.fail_create(None);

        let report = f.repo.load().await;
        assert_eq!(report.pushed, 0);
        assert_eq!(report.sync_state, SyncState::Synced);
        assert_eq!(f.store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.store.entries(), vec![ana.entry]);
        assert_eq!(f.repo.snapshot().pending, 0);
    }

    #[tokio::test]
    async fn lost_create_ack_with_store_ids_matches_on_creation_time() {
        let f = fixture_with(MemStore::new().with_store_ids(), WritePolicy::Resilient);
        f.repo.load().await;
        f.store.fail_create(Some(Failure::LostAck));
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        f.store.fail_create(None);

        f.repo.load().await;
        assert_eq!(f.store.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ids(&f.repo.snapshot().entries), vec!["mem-1".to_string()]);
        assert!(f.backup.read().pending.is_empty());
    }

    #[tokio::test]
    async fn ana_survives_unreachable_remote() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.load().await;
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();
        f.store.set_offline(true);

        let report = f.repo.load().await;
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        let entries = f.repo.snapshot().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Ana");
    }

    #[tokio::test]
    async fn removing_pending_entry_skips_store() {
        let f = fixture(WritePolicy::Resilient);
        f.store.set_offline(true);
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;

        let report = f.repo.remove(&ana.id).await;
        assert_eq!(report.outcome, RemoveOutcome::Deleted);
        assert_eq!(f.store.delete_calls.load(Ordering::SeqCst), 0);
        assert!(f.backup.read().entries.is_empty());
        assert!(f.backup.read().pending.is_empty());
    }

    #[tokio::test]
    async fn failed_delete_reconciles_from_backup() {
        let f = fixture(WritePolicy::Resilient);
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;
        f.store.set_offline(true);

        let report = f.repo.remove(&ana.id).await;
        assert_eq!(report.outcome, RemoveOutcome::Failed);
        assert_eq!(report.notifications[0].message, MSG_DELETE_FAILED);
        assert_eq!(report.sync_state, SyncState::LocalOnly);
        assert!(f.repo.find(&ana.id).is_some());
    }

    #[tokio::test]
    async fn delete_with_lost_ack_is_reconciled_as_deleted() {
        let f = fixture(WritePolicy::Resilient);
        let ana = f.repo.add(draft("Ana", "offering-ride")).await.unwrap().entry;
        f.store.fail_delete(Some(Failure::LostAck));

        let report = f.repo.remove(&ana.id).await;
        assert_eq!(report.outcome, RemoveOutcome::Deleted);
        assert!(f.repo.snapshot().entries.is_empty());
        assert_eq!(report.sync_state, SyncState::Synced);
    }

    #[tokio::test]
    async fn stale_listing_is_discarded() {
        let f = fixture(WritePolicy::Resilient);
        f.repo.load().await;
        let stamp = f.repo.version();
        f.repo.add(draft("Ana", "offering-ride")).await.unwrap();

        assert!(!f.repo.commit_listing(stamp, Vec::new()));
        assert_eq!(f.repo.snapshot().entries.len(), 1);

        assert!(f.repo.commit_listing(f.repo.version(), Vec::new()));
        assert!(f.repo.snapshot().entries.is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_in_listing_are_collapsed() {
        let f = fixture(WritePolicy::Resilient);
        f.store.seed(vec![stamped("x", 2), stamped("x", 2), stamped("y", 1)]);
        f.repo.load().await;
        assert_eq!(ids(&f.repo.snapshot().entries), vec!["x", "y"]);
    }

    #[tokio::test]
    async fn backup_failure_does_not_abort_add() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let store = Arc::new(MemStore::new());
        let repo = EntryRepository::new(
            store.clone(),
            LocalBackupCache::new(blocker.join("backup.json")),
            WritePolicy::Resilient,
        );

        let report = repo.add(draft("Ana", "offering-ride")).await.unwrap();
        assert_eq!(report.outcome, AddOutcome::Synced);
        assert!(report
            .notifications
            .iter()
            .any(|n| n.message == MSG_BACKUP_FAILED));
        assert_eq!(repo.snapshot().entries.len(), 1);
    }
}
