//! devloop CLI - live-reload static server and restart-on-change runner.
//!
//! This crate provides the `devloop` command-line tool and the pieces it is
//! built from, usable on their own.
//!
//! # Architecture
//!
//! The CLI is organized into several key modules:
//!
//! - [`error`] - Comprehensive error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Terminal status lines and screen control
//! - [`dev`] - Static server with the live-reload adapter and event bus
//! - [`process`] - Process-group supervisor for the watched command
//! - [`watch`] - File watching, change filtering and dispatch
//! - `commands` - Individual CLI command implementations
//! - `config` - `devloop.toml` and environment handling
//!
//! # Features
//!
//! - **Live reload**: HTML pages get a reload client; changes are pushed over SSE
//! - **Whole-tree restarts**: the watched command and everything it spawned are killed
//! - **Include/exclude patterns**: globs or plain substrings
//! - **Layered configuration**: flags over environment over `devloop.toml`
//!
//! # Example
//!
//! ```rust
//! use devloop_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     // CLI command implementations...
//!     Ok(())
//! }
//! ```

// Public modules
pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod process;
pub mod ui;
pub mod watch;

// Re-export commonly used types
pub use error::{CliError, ConfigError, ProcessError, Result, ResultExt, ServerError};
