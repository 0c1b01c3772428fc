//! Auto-update scheduler.
//!
//! A registry owns at most one recurring timer. Each tick runs a remote
//! batch over the units that opted into auto-update; failures are logged
//! and never propagated since nobody is waiting on the result.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::registry::{BatchOptions, ResourceRegistry};
use crate::report::BatchReport;

/// Shortest accepted timer period.
const MIN_PERIOD: Duration = Duration::from_secs(1);

impl ResourceRegistry {
    /// Arms the auto-update timer.
    ///
    /// The first tick fires one period from now. Returns false if a timer is
    /// already armed or no Tokio runtime is available. The timer holds a weak
    /// reference and ends once the registry is dropped.
    pub fn start_update(self: &Arc<Self>) -> bool {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            debug!("Auto-update already running");
            return false;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, auto-update not started");
            return false;
        };

        let period = self.config.update_interval.max(MIN_PERIOD);
        let registry = Arc::downgrade(self);
        *timer = Some(runtime.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                // Detached: stopping the timer lets an in-flight pass finish.
                let pass = tokio::spawn(async move {
                    registry.run_auto_update().await;
                });
                if let Err(e) = pass.await {
                    warn!(error = %e, "Auto-update pass aborted");
                }
            }
        }));

        info!(period_secs = period.as_secs(), "Auto-update started");
        true
    }

    /// Cancels the auto-update timer. Returns false if none was armed.
    ///
    /// A pass already running is not interrupted.
    pub fn stop_update(&self) -> bool {
        let Some(timer) = self.timer.lock().take() else {
            return false;
        };
        timer.abort();
        info!("Auto-update stopped");
        true
    }

    /// Returns true while the auto-update timer is armed.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// Runs one unattended update pass over auto-update units.
    pub async fn run_auto_update(&self) -> BatchReport {
        let report = self
            .run_batch(BatchOptions {
                remote: true,
                auto_update_only: true,
                ..BatchOptions::default()
            })
            .await;

        for failure in report.failures() {
            warn!(
                id = %failure.id,
                code = failure.outcome.code(),
                reason = ?failure.outcome.reason,
                "Auto-update failed"
            );
        }
        report
    }
}
