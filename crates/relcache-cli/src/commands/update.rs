//! Update command implementation.

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use relcache_sync::{BatchOptions, BatchReport};

use super::CommonArgs;
use crate::resources::Workspace;

/// Arguments for the update command.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Only consult the origin for expired or stale resources
    #[arg(short, long, conflicts_with = "force")]
    pub stale_only: bool,

    /// Redownload every resource and fail on any origin error
    #[arg(short, long)]
    pub force: bool,

    /// Suppress per-resource progress lines
    #[arg(short, long)]
    pub quiet: bool,
}

impl UpdateArgs {
    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            remote: !self.stale_only || self.force,
            force_remote: self.force,
            ignore_etag: self.force,
            log: !self.quiet,
            auto_update_only: false,
        }
    }
}

/// Runs the update command.
///
/// # Errors
///
/// Returns an error if the resources file is invalid or any resource fails
/// fatally. Resources kept from a stale cache do not fail the command.
pub async fn run(common: &CommonArgs, args: &UpdateArgs) -> Result<()> {
    let workspace = Workspace::open(common)?;
    info!(
        resources = workspace.registry.len(),
        stale_only = args.stale_only,
        force = args.force,
        "Updating resources"
    );

    let report = workspace.registry.update(args.batch_options()).await;
    finish(&report)
}

/// Prints the batch summary and fails if any resource failed.
pub(crate) fn finish(report: &BatchReport) -> Result<()> {
    if report.is_empty() {
        println!("No resources to update.");
        return Ok(());
    }

    println!();
    println!(
        "{} updated, {} not modified, {} degraded, {} failed",
        report.updated, report.not_modified, report.degraded, report.failed
    );

    if report.is_failed() {
        for failure in report.failures() {
            eprintln!("  {}: {}", failure.id, failure.outcome);
        }
        bail!("{} of {} resource(s) failed", report.failed, report.len());
    }
    Ok(())
}
