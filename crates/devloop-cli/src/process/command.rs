//! Turning the user's command line into a program and its arguments.

use crate::error::ConfigError;
use std::fmt;

/// Substrings that make a command string shell syntax rather than argv.
const SHELL_OPERATORS: &[&str] = &[
    "&&", "||", ";", "|", "`", "$(", ")", "{", "}", ">", "<",
];

/// A resolved command: what to exec and with which arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Resolve `command` and its trailing `args`.
    ///
    /// With explicit `args` the command is taken as the program. Otherwise the
    /// command is a shell-style string: anything containing shell operators
    /// runs under `sh -c`, the rest is split with shell quoting rules.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyCommand`] for a blank command and
    /// [`ConfigError::InvalidCommand`] for unbalanced quotes.
    pub fn parse<S: AsRef<str>>(command: &str, args: &[S]) -> Result<Self, ConfigError> {
        if !args.is_empty() {
            if command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand);
            }
            let args = args.iter().map(|a| a.as_ref().to_string()).collect();
            return Ok(Self::new(command, args));
        }

        if is_shell_syntax(command) {
            return Ok(Self::new("sh", vec!["-c".to_string(), command.to_string()]));
        }

        let mut words = shell_words::split(command)
            .map_err(|e| ConfigError::InvalidCommand {
                command: command.to_string(),
                reason: e.to_string(),
            })?
            .into_iter();
        let program = words.next().ok_or(ConfigError::EmptyCommand)?;
        Ok(Self::new(program, words.collect()))
    }

    /// Whether this runs through `sh -c`.
    pub fn is_shell(&self) -> bool {
        self.program == "sh" && self.args.first().is_some_and(|a| a == "-c")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        f.write_str(&shell_words::join(words))
    }
}

/// Whether `command` needs a shell to run as written.
pub fn is_shell_syntax(command: &str) -> bool {
    SHELL_OPERATORS.iter().any(|op| command.contains(op))
}
