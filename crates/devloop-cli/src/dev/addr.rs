//! `--listen` address handling.

use crate::error::ConfigError;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// A requested listen address: host (possibly empty) and starting port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    pub host: String,
    pub port: u16,
}

impl ListenAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host to bind: an empty host means every IPv4 interface.
    pub fn bind_host(&self) -> &str {
        if self.host.is_empty() {
            "0.0.0.0"
        } else {
            &self.host
        }
    }

    /// URL to show the user (and open in a browser) once bound to `port`.
    ///
    /// Wildcard hosts are shown as `localhost`.
    pub fn display_url(&self, port: u16) -> String {
        let host = match self.host.parse::<IpAddr>() {
            _ if self.host.is_empty() => "localhost".to_string(),
            Ok(ip) if ip.is_unspecified() => "localhost".to_string(),
            Ok(IpAddr::V6(ip)) => format!("[{ip}]"),
            _ => self.host.clone(),
        };
        format!("http://{host}:{port}")
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ListenAddr {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_listen(s)
    }
}

/// Split `host:port`, `:port` or `[v6]:port` into its parts.
///
/// # Errors
///
/// [`ConfigError::InvalidListenAddress`] when the port is missing or not a
/// number in `0..=65535`, or the brackets are unbalanced.
pub fn parse_listen(address: &str) -> Result<ListenAddr, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidListenAddress {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| invalid("missing ']' in address"))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        (host, port)
    } else {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port in address"))?;
        if host.contains(':') {
            return Err(invalid("too many colons in address"));
        }
        if host.contains(['[', ']']) {
            return Err(invalid("unexpected bracket in address"));
        }
        (host, port)
    };

    if port.is_empty() {
        return Err(invalid("missing port in address"));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| invalid(&format!("invalid port '{port}'")))?;

    Ok(ListenAddr::new(host, port))
}
