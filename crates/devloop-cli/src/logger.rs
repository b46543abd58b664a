//! Logging infrastructure for the devloop CLI.
//!
//! This module provides a structured logging setup using the `tracing` ecosystem.
//! Status lines meant for humans go through [`crate::ui`]; `tracing` carries the
//! diagnostic detail (batches received, restarts, requests served).
//!
//! # Example
//!
//! ```rust,no_run
//! use devloop_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Starting server");
//! debug!(path = "index.html", "Serving file");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "devloop=debug,devloop_cli=debug,tower_http=debug";
const QUIET_FILTER: &str = "devloop=error,devloop_cli=error";
const DEFAULT_FILTER: &str = "devloop=info,devloop_cli=info";

/// Initialize the tracing subscriber with the specified options.
///
/// It should be called once at the start of the program, before any logging
/// occurs.
///
/// # Verbosity Levels
///
/// The logging level is determined in this order:
/// 1. `--verbose` flag: DEBUG for devloop and request tracing
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable: custom filter
/// 4. Default: INFO for devloop
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    init_logger_with_filter(filter, no_color);
}

/// Initialize logger with custom environment filter.
///
/// Uses `try_init` so a second call (tests, embedding) is ignored instead of
/// panicking.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
