//! # Storage Layer
//!
//! This module defines the [`RemoteStore`] abstraction: one uniform interface over every
//! place a board can live. The repository never knows which product is behind it; it
//! only looks at [`StoreSemantics`] to decide how to reconcile a failed write.
//!
//! ## Contract
//!
//! - `list` returns entries in unspecified order. An empty store is an empty list.
//! - `create` is at-least-once. It returns the stored entry, possibly with a
//!   store-assigned id.
//! - `delete` is idempotent: deleting a missing id is [`DeleteOutcome::NotFound`], not
//!   an error.
//! - Transport failures are `RemoteUnavailable`. Refusals (4xx) are `RemoteRejected`.
//!
//! ## Implementations
//!
//! | Adapter | Semantics | Backing |
//! |---------|-----------|---------|
//! | [`local::LocalStore`] | `LocalOnly` | JSON file in the data dir |
//! | [`document::DocumentStore`] | `FullReadWrite` | Hosted collection, `keyed` or `rows` dialect |
//! | [`bin::BinStore`] | `AppendOnly` | Hosted whole-document bin |
//! | [`memory::MemStore`] | configurable | In memory, for tests |
//!
//! [`open_store`] picks one from [`RideboardConfig`].

use crate::config::{BackendKind, RideboardConfig};
use crate::error::{RideboardError, Result};
use crate::model::Entry;
use async_trait::async_trait;
use std::sync::Arc;

pub mod bin;
pub mod document;
pub mod http;
pub mod json_file;
pub mod local;
pub mod memory;
pub mod wire;

/// How a store behaves under writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSemantics {
    /// Individual creates and deletes, confirmed by the store.
    FullReadWrite,
    /// Whole-document writes; a failed create may or may not have landed.
    AppendOnly,
    /// Lives on this machine only.
    LocalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Short name used in logs.
    fn tag(&self) -> &'static str;

    fn semantics(&self) -> StoreSemantics;

    async fn list(&self) -> Result<Vec<Entry>>;

    async fn create(&self, entry: &Entry) -> Result<Entry>;

    async fn delete(&self, id: &str) -> Result<DeleteOutcome>;
}

/// Builds the store selected by `config.backend`.
pub fn open_store(config: &RideboardConfig) -> Result<Arc<dyn RemoteStore>> {
    let api_key = config.api_key.as_deref();
    let store: Arc<dyn RemoteStore> = match config.backend {
        BackendKind::Local => Arc::new(local::LocalStore::new(config.local_board_path())),
        BackendKind::Document => Arc::new(document::DocumentStore::new(
            config.require_endpoint()?,
            &config.collection,
            config.dialect,
            api_key,
            config.request_timeout(),
            config.retry_policy(),
        )?),
        BackendKind::Bin => {
            let bin_id = config.bin_id.as_deref().ok_or_else(|| {
                RideboardError::Config("backend 'bin' needs a bin_id (RIDEBOARD_BIN_ID)".into())
            })?;
            Arc::new(bin::BinStore::new(
                config.require_endpoint()?,
                bin_id,
                api_key,
                config.request_timeout(),
                config.retry_policy(),
            )?)
        }
    };
    Ok(store)
}
