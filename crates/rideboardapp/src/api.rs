//! # API Facade
//!
//! [`RideboardApi`] is the single entry point for any UI. It holds the current filter,
//! turns UI events into repository calls, and returns a [`CmdResult`]: the entries to
//! render plus the notifications to show.
//!
//! ## What the API Does NOT Do
//!
//! - **Fallback policy**: that belongs in [`crate::repository`].
//! - **Presentation**: no stdout, no formatting. Dates stay dates.
//! - **Confirmation**: asking "are you sure?" before a delete is the UI's job;
//!   [`RideboardApi::find`] gives it the name to ask about.
//!
//! ## Event Mapping
//!
//! | UI event | Method | Notifications |
//! |----------|--------|---------------|
//! | startup | [`RideboardApi::load`] | fallback warnings only |
//! | form submit | [`RideboardApi::submit`] | shared / saved locally / error |
//! | type or date select | [`RideboardApi::set_type_filter`], [`RideboardApi::set_date_filter`] | none |
//! | clear filters | [`RideboardApi::clear_filters`] | none |
//! | refresh button | [`RideboardApi::refresh`] | "Refreshed! ..." on success |
//! | delete | [`RideboardApi::delete`] | "Deleted {name}'s travel plan." |
//! | auto-refresh tick | [`RideboardApi::on_refresh`] | fallback warnings only |

use crate::backup::LocalBackupCache;
use crate::config::RideboardConfig;
use crate::error::Result;
use crate::filter::{EntryFilter, TypeFilter};
use crate::model::{Entry, EntryDraft, SyncState};
use crate::notify::Notification;
use crate::refresh::AutoRefresh;
use crate::repository::{EntryRepository, LoadReport, LoadSource};
use crate::store::open_store;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const MSG_REFRESHED: &str = "Refreshed! Showing latest travel plans.";

/// Result of an API call.
#[derive(Debug, Clone, Default)]
pub struct CmdResult {
    /// Entries touched by the call (the submitted or deleted entry).
    pub affected_entries: Vec<Entry>,
    /// The filtered listing to render, newest first.
    pub listed_entries: Vec<Entry>,
    pub messages: Vec<Notification>,
    pub sync_state: Option<SyncState>,
    pub pending: usize,
}

impl CmdResult {
    pub fn add_message(&mut self, message: Notification) {
        self.messages.push(message);
    }

    pub fn with_affected_entries(mut self, entries: Vec<Entry>) -> Self {
        self.affected_entries = entries;
        self
    }

    pub fn with_messages(mut self, messages: Vec<Notification>) -> Self {
        self.messages.extend(messages);
        self
    }
}

pub struct RideboardApi {
    repo: Arc<EntryRepository>,
    filter: EntryFilter,
}

impl RideboardApi {
    pub fn new(repo: Arc<EntryRepository>) -> Self {
        Self {
            repo,
            filter: EntryFilter::default(),
        }
    }

    /// Wires store, backup and write policy from configuration.
    pub fn open(config: &RideboardConfig) -> Result<Self> {
        let store = open_store(config)?;
        let backup = LocalBackupCache::new(config.backup_path());
        Ok(Self::new(Arc::new(EntryRepository::new(
            store,
            backup,
            config.write_policy,
        ))))
    }

    pub fn repository(&self) -> Arc<EntryRepository> {
        self.repo.clone()
    }

    pub fn filter(&self) -> &EntryFilter {
        &self.filter
    }

    pub fn find(&self, id: &str) -> Option<Entry> {
        self.repo.find(id)
    }

    /// Initial load. Only fallback conditions produce notifications.
    pub async fn load(&self) -> CmdResult {
        let report = self.repo.load().await;
        self.on_refresh(report)
    }

    /// Manual refresh.
    pub async fn refresh(&self) -> CmdResult {
        let report = self.repo.load().await;
        let refreshed = report.source == LoadSource::Remote;
        let mut result = self.on_refresh(report);
        if refreshed {
            result.add_message(Notification::success(MSG_REFRESHED));
        }
        result
    }

    /// Turns a load report (from an auto-refresh tick) into a listing.
    pub fn on_refresh(&self, report: LoadReport) -> CmdResult {
        let mut result = self.listing();
        if report.pushed > 0 {
            result.add_message(Notification::info(format!(
                "Synced {} saved travel plan{}.",
                report.pushed,
                if report.pushed == 1 { "" } else { "s" }
            )));
        }
        result.with_messages(report.notifications)
    }

    pub async fn submit(&self, draft: EntryDraft) -> Result<CmdResult> {
        let report = self.repo.add(draft).await?;
        let affected = self
            .repo
            .find(&report.entry.id)
            .map(|e| vec![e])
            .unwrap_or_default();
        Ok(self
            .listing()
            .with_affected_entries(affected)
            .with_messages(report.notifications))
    }

    pub async fn delete(&self, id: &str) -> CmdResult {
        let report = self.repo.remove(id).await;
        self.listing()
            .with_affected_entries(report.removed.into_iter().collect())
            .with_messages(report.notifications)
    }

    pub fn set_type_filter(&mut self, kind: TypeFilter) -> CmdResult {
        self.filter.kind = kind;
        self.listing()
    }

    pub fn set_date_filter(&mut self, date: Option<NaiveDate>) -> CmdResult {
        self.filter.date = date;
        self.listing()
    }

    pub fn set_filter(&mut self, filter: EntryFilter) -> CmdResult {
        self.filter = filter;
        self.listing()
    }

    pub fn clear_filters(&mut self) -> CmdResult {
        self.filter = EntryFilter::default();
        self.listing()
    }

    /// The current filtered listing, without touching the store.
    pub fn listing(&self) -> CmdResult {
        let snapshot = self.repo.snapshot();
        CmdResult {
            listed_entries: self.filter.apply(&snapshot.entries),
            sync_state: Some(snapshot.sync_state),
            pending: snapshot.pending,
            ..Default::default()
        }
    }

    /// Starts periodic reloads with the given period.
    pub fn auto_refresh(
        &self,
        period: std::time::Duration,
    ) -> (AutoRefresh, mpsc::Receiver<LoadReport>) {
        AutoRefresh::spawn(self.repo.clone(), period)
    }
}
