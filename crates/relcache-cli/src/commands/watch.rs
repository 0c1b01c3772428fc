//! Watch command implementation.
//!
//! Arms the auto-update timer and prints a line for every resource that
//! changes until interrupted.

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use relcache_sync::{BatchOptions, ResourceEvent};

use super::CommonArgs;
use crate::resources::Workspace;

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Run an update pass before waiting for the first tick
    #[arg(long)]
    pub now: bool,
}

/// Runs the watch command.
///
/// # Errors
///
/// Returns an error if the resources file is invalid or the timer cannot be
/// armed.
pub async fn run(common: &CommonArgs, args: &WatchArgs) -> Result<()> {
    let workspace = Workspace::open(common)?;
    let registry = workspace.registry;
    let mut events = registry.subscribe();

    if args.now {
        let report = registry.update(BatchOptions::default().with_log(true)).await;
        if report.is_failed() {
            warn!(failed = report.failed, "Initial update had failures");
        }
    }

    if !registry.start_update() {
        bail!("Auto-update could not be started");
    }

    let period = registry.config().update_interval;
    println!(
        "Watching {} resource(s), checking every {}s. Press Ctrl-C to stop.",
        registry.units().iter().filter(|unit| unit.auto_update()).count(),
        period.as_secs()
    );

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(ResourceEvent::Updated { id, location, etag }) => {
                    println!("Updated {id} ({etag}) in {}", location.display());
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed update notifications");
                }
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    registry.stop_update();
    info!("Watch stopped");
    Ok(())
}
