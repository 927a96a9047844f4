//! Periodic dispatch loop.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{AuditScheduler, DrainReport};

/// Drives [`AuditScheduler::tick`] on a fixed delay and drains the scheduler
/// when shut down.
///
/// Only one dispatcher should run per scheduler; ticks never overlap because
/// the loop awaits each one before the next.
pub struct Dispatcher {
    scheduler: AuditScheduler,
    interval: Duration,
    on_events: bool,
}

impl Dispatcher {
    /// Dispatcher using the scheduler's configured interval and mode.
    #[must_use]
    pub fn new(scheduler: AuditScheduler) -> Self {
        let interval = scheduler.config().tick_interval();
        let on_events = scheduler.config().dispatch_on_events;
        Self {
            scheduler,
            interval,
            on_events,
        }
    }

    /// Tick interval in use.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until `shutdown` fires or the scheduler is drained elsewhere,
    /// then drain and return the report.
    ///
    /// The first tick fires immediately. Freed capacity and new submissions
    /// wait for the next tick unless event-driven dispatch is enabled.
    pub async fn run(self, shutdown: CancellationToken) -> DrainReport {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval = ?self.interval, on_events = self.on_events, "dispatcher started");

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::info!("dispatcher received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {}
                () = self.scheduler.dispatch_requested(), if self.on_events => {}
            }

            if self.scheduler.is_drained() {
                tracing::info!("scheduler drained, dispatcher stopping");
                break;
            }
            self.scheduler.tick();
        }

        let report = self.scheduler.drain();
        tracing::info!("dispatcher stopped");
        report
    }

    /// Spawn [`Dispatcher::run`] on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> tokio::task::JoinHandle<DrainReport> {
        tokio::spawn(self.run(shutdown))
    }
}
