//! Command implementations for the devloop CLI.
//!
//! - [`serve`] - Static server with live reload
//! - [`watch`] - Restart a command on file changes
//!
//! Each command is implemented in its own module and provides an `execute`
//! function that takes the parsed command arguments and returns a Result.

pub mod serve;
pub mod watch;

// Re-export execute functions for convenience
pub use serve::execute as serve_execute;
pub use watch::execute as watch_execute;
