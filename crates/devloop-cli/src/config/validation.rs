use crate::config::{DEBOUNCE_RANGE_MS, DevloopConfig};
use crate::dev::parse_listen;
use crate::error::{ConfigError, Result};
use crate::watch::ChangeFilter;

/// Check a debounce interval is within [`DEBOUNCE_RANGE_MS`].
pub fn validate_debounce(field: &str, millis: u64) -> Result<()> {
    if DEBOUNCE_RANGE_MS.contains(&millis) {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        field: field.to_string(),
        value: millis.to_string(),
        hint: format!(
            "Debounce must be between {} and {} milliseconds",
            DEBOUNCE_RANGE_MS.start(),
            DEBOUNCE_RANGE_MS.end()
        ),
    }
    .into())
}

impl DevloopConfig {
    /// Validate every value before any listener, watcher or child exists.
    pub fn validate(&self) -> Result<()> {
        parse_listen(&self.serve.listen)?;
        ChangeFilter::new(&self.serve.include, &self.serve.exclude)?;
        validate_debounce("serve.debounce_ms", self.serve.debounce_ms)?;

        ChangeFilter::new(&self.watch.include, &self.watch.exclude)?;
        validate_debounce("watch.debounce_ms", self.watch.debounce_ms)?;

        Ok(())
    }
}
