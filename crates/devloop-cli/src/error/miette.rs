//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ProcessError, ServerError};
use ::miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => ::miette::miette!("Configuration error: {}", e),
        CliError::Server(e) => server_error_to_miette(e),
        CliError::Process(e) => process_error_to_miette(e),
        _ => ::miette::miette!("{}", err),
    }
}

/// Convert ServerError to miette Report
pub fn server_error_to_miette(err: ServerError) -> Report {
    match err {
        ServerError::NoPortAvailable { host, start, end } => {
            let host = if host.is_empty() { "0.0.0.0" } else { host.as_str() };
            ::miette::miette!(
                "Could not bind {}: ports {}-{} are all in use\n\nHint: Pass --listen with a free port",
                host,
                start,
                end
            )
        }
        other => ::miette::miette!("{}", other),
    }
}

/// Convert ProcessError to miette Report
pub fn process_error_to_miette(err: ProcessError) -> Report {
    match err {
        ProcessError::Spawn { program, source } => ::miette::miette!(
            "Failed to start '{}': {}\n\nHint: Check that the program exists and is on PATH",
            program,
            source
        ),
        other => ::miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_port_available_names_wildcard_host() {
        let report = server_error_to_miette(ServerError::NoPortAvailable {
            host: String::new(),
            start: 3000,
            end: 3099,
        });
        let msg = report.to_string();
        assert!(msg.contains("0.0.0.0"));
        assert!(msg.contains("3000-3099"));
    }

    #[test]
    fn test_spawn_error_has_hint() {
        let report = cli_error_to_miette(CliError::Process(ProcessError::Spawn {
            program: "nope".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        }));
        assert!(report.to_string().contains("Hint:"));
    }
}
