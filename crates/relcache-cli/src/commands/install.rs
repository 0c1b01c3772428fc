//! Install command implementation.
//!
//! Reinstalls every configured resource from the origin, ignoring etags and
//! cached freshness.

use anyhow::Result;
use clap::Args;
use tracing::info;

use relcache_sync::BatchOptions;

use super::update::finish;
use super::CommonArgs;
use crate::resources::Workspace;

/// Arguments for the install command.
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Suppress per-resource progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

/// Runs the install command.
///
/// # Errors
///
/// Returns an error if the resources file is invalid or any resource fails
/// to install.
pub async fn run(common: &CommonArgs, args: &InstallArgs) -> Result<()> {
    let workspace = Workspace::open(common)?;
    info!(resources = workspace.registry.len(), "Installing resources");

    let report = workspace
        .registry
        .install(BatchOptions::default().with_log(!args.quiet))
        .await;
    finish(&report)
}
