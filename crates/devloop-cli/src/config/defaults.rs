pub const DEFAULT_LISTEN: &str = ":3000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Accepted range for `debounce_ms`.
pub const DEBOUNCE_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=10_000;

pub fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

pub fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

pub fn default_true() -> bool {
    true
}
