use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::validation::{parse_debounce, parse_listen_arg};
use crate::dev::ListenAddr;

/// Available devloop subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a directory with live reload
    ///
    /// HTML pages get a small reload client appended; plain-text files are
    /// shown in an HTML shell with the same client. Any change under the
    /// directory reloads every open page.
    Serve(ServeArgs),

    /// Run a command and restart it when files change
    ///
    /// The command runs in its own process group, so everything it spawned
    /// is killed before the restart.
    Watch(WatchArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory to serve
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Address to listen on; busy ports are skipped upwards
    ///
    /// Examples: :3000, localhost:8080, [::1]:3000
    #[arg(short, long, value_name = "ADDR", value_parser = parse_listen_arg)]
    pub listen: Option<ListenAddr>,

    /// Inject the reload client and mount /.live
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub live: Option<bool>,

    /// Open the browser once the server is up
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub open: Option<bool>,

    /// Only changes matching PATTERN reload pages (repeatable)
    #[arg(short, long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Changes matching PATTERN never reload pages (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Quiet period in milliseconds that closes a batch of changes
    #[arg(long, value_name = "MS", value_parser = parse_debounce)]
    pub debounce: Option<u64>,
}

/// Arguments for the watch command
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Clear the terminal before each restart
    #[arg(long, value_name = "BOOL", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub clear: Option<bool>,

    /// Only changes matching PATTERN restart the command (repeatable)
    #[arg(short, long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Changes matching PATTERN never restart the command (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Directory to watch and run the command in
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Quiet period in milliseconds that closes a batch of changes
    #[arg(long, value_name = "MS", value_parser = parse_debounce)]
    pub debounce: Option<u64>,

    /// Command to run, then its arguments
    ///
    /// A single quoted argument is split like a shell would; if it uses shell
    /// operators (&&, |, ;, ...) it runs under `sh -c`.
    ///
    /// Examples:
    ///   devloop watch -i '*.go' go test ./...
    ///   devloop watch "go build && ./app"
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl WatchArgs {
    /// The command word and its verbatim arguments.
    pub fn command_parts(&self) -> (&str, &[String]) {
        match self.command.split_first() {
            Some((command, args)) => (command.as_str(), args),
            None => ("", &[]),
        }
    }
}
