//! Command-line interface definition for devloop.
//!
//! This module defines the complete CLI structure using clap v4's derive macros.
//! Values given here sit on top of `devloop.toml` and `DEVLOOP_*` environment
//! variables, so every option is optional.
//!
//! # Command Structure
//!
//! - `devloop serve` - Static server with live reload
//! - `devloop watch` - Run a command and restart it on changes

mod commands;
mod validation;

use clap::Parser;
use std::path::PathBuf;

pub use commands::{Command, ServeArgs, WatchArgs};
pub use validation::{parse_debounce, parse_listen_arg};

/// devloop - live reload for static sites and restart-on-change for commands
#[derive(Parser, Debug)]
#[command(
    name = "devloop",
    version,
    about = "Live-reload static server and restart-on-change command runner",
    long_about = "devloop keeps a development loop running.\n\
                  `serve` hosts a directory and reloads open pages when files change;\n\
                  `watch` runs a command and restarts it, with its whole process group,\n\
                  whenever a matching file changes."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows change batches, restarts and served requests.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (defaults to ./devloop.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
