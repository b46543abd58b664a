use crate::cli::{ServeArgs, WatchArgs};
use crate::config::{ConfigOverrides, ServeConfig, ServeOverrides, WatchConfig, WatchOverrides};
use crate::dev::{DevConfig, parse_listen};
use crate::error::Result;
use crate::watch::ChangeFilter;
use std::path::PathBuf;
use std::time::Duration;

// CLI args -> override layer

fn non_empty(patterns: &[String]) -> Option<Vec<String>> {
    (!patterns.is_empty()).then(|| patterns.to_vec())
}

impl From<&ServeArgs> for ServeOverrides {
    fn from(args: &ServeArgs) -> Self {
        Self {
            listen: args.listen.as_ref().map(ToString::to_string),
            live: args.live,
            open: args.open,
            include: non_empty(&args.include),
            exclude: non_empty(&args.exclude),
            debounce_ms: args.debounce,
        }
    }
}

impl From<&WatchArgs> for WatchOverrides {
    fn from(args: &WatchArgs) -> Self {
        Self {
            clear: args.clear,
            include: non_empty(&args.include),
            exclude: non_empty(&args.exclude),
            debounce_ms: args.debounce,
        }
    }
}

impl From<&ServeArgs> for ConfigOverrides {
    fn from(args: &ServeArgs) -> Self {
        Self {
            serve: args.into(),
            ..Self::default()
        }
    }
}

impl From<&WatchArgs> for ConfigOverrides {
    fn from(args: &WatchArgs) -> Self {
        Self {
            watch: args.into(),
            ..Self::default()
        }
    }
}

// Config -> runtime settings

impl ServeConfig {
    /// Resolve into the settings a dev server runs with for `root`.
    pub fn to_dev_config(&self, root: impl Into<PathBuf>) -> Result<DevConfig> {
        Ok(DevConfig {
            listen: parse_listen(&self.listen)?,
            root: root.into(),
            live: self.live,
            open: self.open,
            filter: ChangeFilter::new(&self.include, &self.exclude)?,
            debounce: Duration::from_millis(self.debounce_ms),
        })
    }
}

impl WatchConfig {
    pub fn filter(&self) -> Result<ChangeFilter> {
        Ok(ChangeFilter::new(&self.include, &self.exclude)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
