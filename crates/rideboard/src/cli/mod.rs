//! # CLI Behavior
//!
//! This is **one possible UI client** for rideboard, not the application itself.
//!
//! ## Naked Execution (`rideboard`)
//!
//! Running `rideboard` with no arguments is `rideboard list`: load the board and show
//! every card, newest first.
//!
//! ## Deleting
//!
//! `rideboard delete <id>` asks "Delete Ana's travel plan? [y/N]" on stderr before
//! calling the API. `--yes` skips the prompt. Unknown ids are not an error.
//!
//! ## Offline Behavior
//!
//! When the configured store cannot be reached, commands still succeed against the
//! local backup and print a warning. Plans added while offline are marked as waiting
//! to sync and are pushed on the next successful load.
//!
//! ## Module Structure
//!
//! - `commands`: handlers that call the API and print results
//! - `render`: cards, status line, notifications
//! - `setup`: argument parsing via clap
//! - `styles`: terminal styles

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
