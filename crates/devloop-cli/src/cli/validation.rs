use crate::config::DEBOUNCE_RANGE_MS;
use crate::dev::{ListenAddr, parse_listen};

/// clap value parser for `--listen`.
///
/// Accepts `host:port`, `:port` and `[v6]:port`.
pub fn parse_listen_arg(s: &str) -> Result<ListenAddr, String> {
    parse_listen(s).map_err(|e| match e {
        crate::error::ConfigError::InvalidListenAddress { reason, .. } => reason,
        other => other.to_string(),
    })
}

/// clap value parser for `--debounce`, in milliseconds.
pub fn parse_debounce(s: &str) -> Result<u64, String> {
    let millis: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of milliseconds"))?;
    if !DEBOUNCE_RANGE_MS.contains(&millis) {
        return Err(format!(
            "debounce must be between {} and {} milliseconds",
            DEBOUNCE_RANGE_MS.start(),
            DEBOUNCE_RANGE_MS.end()
        ));
    }
    Ok(millis)
}
