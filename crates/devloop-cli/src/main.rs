//! devloop CLI - live reload and restart-on-change for development loops.
//!
//! This is the main entry point for the devloop CLI. It handles command-line
//! argument parsing, logging initialization, and command dispatch.

use clap::Parser;
use devloop_cli::{cli, commands, error, logger, ui};
use miette::Result;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = cli::Cli::parse();

    // Initialize logging and colors based on global flags
    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let cancel = CancellationToken::new();
    let config_path = args.config.as_deref();

    // Execute the appropriate command
    let result = match args.command {
        cli::Command::Serve(serve_args) => {
            let token = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::debug!("interrupt received, shutting down");
                    token.cancel();
                }
            });
            commands::serve_execute(serve_args, config_path, cancel).await
        }
        // The supervisor owns Ctrl-C while a command is being watched.
        cli::Command::Watch(watch_args) => {
            commands::watch_execute(watch_args, config_path, cancel).await
        }
    };

    // Convert CLI errors to miette diagnostics for beautiful error reporting
    result.map_err(error::cli_error_to_miette)
}
