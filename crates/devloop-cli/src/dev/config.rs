//! Development server configuration.
//!
//! The resolved settings one `serve` session runs with, after the config file,
//! environment and CLI flags have been merged.

use crate::dev::ListenAddr;
use crate::error::{CliError, Result};
use crate::watch::ChangeFilter;
use std::path::PathBuf;
use std::time::Duration;

/// Development server configuration.
#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Requested address; the port is where the free-port scan starts
    pub listen: ListenAddr,

    /// Directory being served and watched
    pub root: PathBuf,

    /// Mount the live-reload endpoint and inject the client into pages
    pub live: bool,

    /// Open the browser once the listener is bound
    pub open: bool,

    /// Which changes trigger a reload
    pub filter: ChangeFilter,

    /// Quiet period that closes a batch of changes
    pub debounce: Duration,
}

impl DevConfig {
    /// Settings for serving `root` on `:3000` with live reload on.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            listen: ListenAddr::new("", 3000),
            root: root.into(),
            live: true,
            open: false,
            filter: ChangeFilter::allow_all(),
            debounce: Duration::from_millis(100),
        }
    }

    /// Validate the dev server configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the served directory doesn't exist or is a file.
    pub fn validate(&self) -> Result<()> {
        if !self.root.exists() {
            return Err(CliError::FileNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }
}
