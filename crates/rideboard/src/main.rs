//! # Rideboard CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this file only
//! starts the runtime, invokes `cli::run()` and handles process termination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/rideboard/src/cli/)                      │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - handlers + confirmation prompt (commands.rs)             │
//! │  - cards and notifications via console (render.rs)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/rideboardapp/src/api.rs)                 │
//! │  - Filter state, CmdResult values                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from `api.rs` inward is UI agnostic. The CLI layer owns argument
//! parsing, logging setup, rendering and exit codes.

mod cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
