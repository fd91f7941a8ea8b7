//! # Rideboard Architecture
//!
//! Rideboard is a **UI-agnostic listing board** for transportation-sharing entries:
//! ride offers, ride requests, rideshare splits and flight info. The library owns the
//! data and its synchronization policy; the CLI in `crates/rideboard` is one client.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/rideboard)                               │
//! │  - Parses arguments, renders cards, prompts, exit codes     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Holds filter state, maps UI events to repository calls   │
//! │  - Returns CmdResult: entries to render + notifications     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repository (repository.rs, refresh.rs)                     │
//! │  - Working set, optimistic mutations, fallback policy       │
//! │  - Pending entries, periodic reload                         │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                           │
//!                  ▼                           ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Storage Layer (store/)       │ │  Backup (backup.rs)       │
//! │  - RemoteStore trait          │ │  - Last-known-good mirror │
//! │  - local, document, bin, mem  │ │  - Pending ids            │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never writes to stdout/stderr and never exits the
//! process. Store failures never surface as `Err`: the repository turns them into a
//! [`model::SyncState`] and [`notify::Notification`]s. Only invalid input and
//! configuration problems are errors.
//!
//! ## Module Overview
//!
//! - [`api`]: facade for UI clients
//! - [`repository`]: load/add/remove with fallback and reconciliation
//! - [`refresh`]: cancellable auto-refresh task
//! - [`store`]: the `RemoteStore` trait and its adapters
//! - [`backup`]: local backup cache
//! - [`model`]: `Entry`, `EntryDraft`, ids and ordering
//! - [`filter`]: type/date predicates
//! - [`config`]: layered configuration
//! - [`notify`]: UI notifications
//! - [`error`]: error type

pub mod api;
pub mod backup;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod notify;
pub mod refresh;
pub mod repository;
pub mod store;
