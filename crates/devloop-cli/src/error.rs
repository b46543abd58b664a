//! Comprehensive error handling for the devloop CLI.
//!
//! This module provides a hierarchical error type system using `thiserror` for
//! structured error handling with actionable messages.
//!
//! # Architecture
//!
//! - **Top-level errors** (`CliError`) represent broad categories of failures
//! - **Domain-specific errors** (`ConfigError`, `ServerError`, `ProcessError`)
//!   provide detailed context
//! - **Error conversion** is automatic via `#[from]` attributes
//! - **Context helpers** allow attaching additional information to errors
//!
//! Configuration errors are raised before any listener, watcher or child
//! process exists. Process errors raised while watching are reported and do not
//! stop the watch loop.
//!
//! # Example
//!
//! ```rust,no_run
//! use devloop_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_index(dir: &Path) -> Result<String> {
//!     let path = dir.join("index.html");
//!     std::fs::read_to_string(&path)
//!         .with_path(&path)
//!         .with_hint("Serve a directory that contains an index.html")
//! }
//! ```

mod miette;

pub use self::miette::cli_error_to_miette;

use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
///
/// This is the primary error type returned by CLI commands. It automatically
/// converts from domain-specific errors via `From` implementations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (bad listen address, invalid pattern, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dev server errors (no free port, serve loop failure)
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Supervised process errors (spawn, kill, wait)
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
///
/// All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `--listen` value is not `host:port`
    #[error("Invalid listen address '{address}': {reason}\n\nHint: Use host:port, :port or [v6]:port (e.g. :3000 or localhost:8080)")]
    InvalidListenAddress {
        /// The rejected address
        address: String,
        /// What was wrong with it
        reason: String,
    },

    /// An include or exclude glob failed to compile
    #[error("Invalid pattern '{pattern}': {reason}\n\nHint: Patterns without wildcards match as plain substrings")]
    InvalidPattern {
        /// The rejected pattern
        pattern: String,
        /// Glob compiler message
        reason: String,
    },

    /// The command string could not be tokenized
    #[error("Invalid command '{command}': {reason}\n\nHint: Check for unbalanced quotes")]
    InvalidCommand {
        /// The rejected command string
        command: String,
        /// Tokenizer message
        reason: String,
    },

    /// The command string was empty or only whitespace
    #[error("No command to run\n\nHint: Pass the command after the flags, e.g. devloop watch cargo run")]
    EmptyCommand,

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// The config file or environment could not be merged
    #[error("Failed to load configuration: {0}\n\nHint: Check devloop.toml syntax and DEVLOOP_* environment variables")]
    Load(String),
}

/// Dev server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Every port in the scan window refused to bind
    #[error("No port available on '{host}' between {start} and {end}\n\nHint: Stop the other servers or pass --listen with a different port")]
    NoPortAvailable {
        /// Host the scan bound against
        host: String,
        /// First port tried
        start: u16,
        /// Last port tried
        end: u16,
    },

    /// The HTTP serve loop failed after binding
    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Supervised process errors.
///
/// None of these stop the watch loop; they are reported and the next
/// qualifying change retries.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be spawned (not found, not executable, ...)
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// `restart` was called before any `start`
    #[error("Cannot restart: no command has been started")]
    NotStarted,

    /// An interrupt was received; the supervisor no longer launches commands
    #[error("Not starting the command: interrupted")]
    Interrupted,

    /// Signalling the process group failed
    #[error("Failed to kill process group {pgid}: {source}")]
    Kill {
        /// Process group id
        pgid: i32,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Reaping the killed child failed
    #[error("Failed to wait for process {pid}: {source}")]
    Wait {
        /// Process id
        pid: u32,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Add a file path to the error context.
    ///
    /// `NotFound` I/O errors become [`CliError::FileNotFound`].
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Add a helpful hint to the error context.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error with a message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
