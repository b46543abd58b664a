//! Watch command implementation.
//!
//! Runs the command under a [`Supervisor`] and restarts it whenever a batch of
//! changes passes the filter. Ctrl-C kills the command's process group and
//! exits with status 1, or 130 when nothing was running.

use crate::cli::WatchArgs;
use crate::config::{ConfigOverrides, DevloopConfig};
use crate::error::{Result, ResultExt};
use crate::process::{CommandSpec, LaunchOptions, Supervisor};
use crate::ui;
use crate::watch::{FileWatcher, WatchDispatcher};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Exit status after an interrupt that killed the command.
pub const EXIT_KILLED: i32 = 1;
/// Exit status after an interrupt with no command running.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Execute the watch command.
///
/// # Process Flow
///
/// 1. Merge `[watch]` config with the flags and parse the command
/// 2. Start watching the directory
/// 3. Start the command (a failure is reported, watching continues)
/// 4. Restart on every qualifying batch until `cancel` fires
///
/// # Errors
///
/// Configuration errors and watcher setup failures. Start and restart
/// failures are printed and do not end the command.
pub async fn execute(
    args: WatchArgs,
    config_path: Option<&Path>,
    cancel: CancellationToken,
) -> Result<()> {
    let config = DevloopConfig::load(config_path, &ConfigOverrides::from(&args))?.watch;
    let (command, command_args) = args.command_parts();
    let spec = CommandSpec::parse(command, command_args)?;
    let filter = config.filter()?;

    let root = std::fs::canonicalize(&args.dir).with_path(&args.dir)?;
    let (watcher, batches) = FileWatcher::start(root, config.debounce())?;

    let supervisor = Supervisor::new(LaunchOptions::default().dir(watcher.root()));
    supervisor.install_interrupt_handler(interrupted(), |killed| {
        std::process::exit(if killed { EXIT_KILLED } else { EXIT_INTERRUPTED });
    });

    if config.clear {
        ui::clear_screen();
    }
    ui::info(&format!("Running {spec}"));
    if let Err(err) = supervisor.start(spec).await {
        ui::error(&err.to_string());
    }

    let dispatcher = WatchDispatcher::restart(filter, supervisor.clone(), config.clear);
    let result = dispatcher.run(batches, cancel).await;

    drop(watcher);
    supervisor.shutdown().await?;
    result
}

/// Resolves on the first Ctrl-C. Never resolves if the handler can't be set.
async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
