//! Serve command implementation.

use crate::cli::ServeArgs;
use crate::config::{ConfigOverrides, DevloopConfig};
use crate::dev::DevServer;
use crate::error::Result;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Execute the serve command.
///
/// Merges `[serve]` from the config file and environment with the flags, then
/// runs the dev server until `cancel` fires.
///
/// # Errors
///
/// Returns errors for invalid configuration, a missing directory, no free
/// port, or a failing server task.
pub async fn execute(
    args: ServeArgs,
    config_path: Option<&Path>,
    cancel: CancellationToken,
) -> Result<()> {
    let config = DevloopConfig::load(config_path, &ConfigOverrides::from(&args))?;
    let dev = config.serve.to_dev_config(&args.dir)?;
    tracing::debug!(?dev, "resolved serve configuration");

    DevServer::new(dev).run(cancel).await
}
