//! Configuration system for devloop with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and `devloop.toml`.
//! Priority: CLI > Environment > File > Defaults

mod conversions;
mod defaults;
mod loading;
mod tests;
mod validation;

use serde::{Deserialize, Serialize};

pub use conversions::*;
pub use defaults::*;
pub use loading::{CONFIG_FILE, ConfigOverrides, ENV_PREFIX, ServeOverrides, WatchOverrides};
pub use validation::*;

/// devloop configuration, one table per subcommand.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevloopConfig {
    /// `[serve]` table
    #[serde(default)]
    pub serve: ServeConfig,

    /// `[watch]` table
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Settings for `devloop serve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Listen address; the port is where the free-port scan starts
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Inject the reload client and mount `/.live`
    #[serde(default = "default_true")]
    pub live: bool,

    /// Open the browser once the server is up
    #[serde(default = "default_true")]
    pub open: bool,

    /// Only changes matching one of these reload the page
    #[serde(default)]
    pub include: Vec<String>,

    /// Changes matching one of these never reload the page
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Quiet period in milliseconds that closes a batch of changes
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Settings for `devloop watch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Clear the terminal before each restart
    #[serde(default = "default_true")]
    pub clear: bool,

    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            live: true,
            open: true,
            include: Vec::new(),
            exclude: Vec::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            clear: true,
            include: Vec::new(),
            exclude: Vec::new(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl DevloopConfig {
    /// Example `devloop.toml` content with every key at its default.
    pub fn example_config() -> String {
        format!(
            "[serve]\n\
             listen = \"{listen}\"\n\
             live = true\n\
             open = true\n\
             include = []\n\
             exclude = []\n\
             debounce_ms = {debounce}\n\
             \n\
             [watch]\n\
             clear = true\n\
             include = []\n\
             exclude = []\n\
             debounce_ms = {debounce}\n",
            listen = default_listen(),
            debounce = default_debounce_ms(),
        )
    }
}
