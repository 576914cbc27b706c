//! Scheduler Worker - Internal tick source
//!
//! Fires `SchedulerService::tick` on a fixed period. `POST /feeds/run-scheduled`
//! drives the same tick from an external cron, so either or both may run.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::application::SchedulerService;

pub struct FeedScheduler {
    service: Arc<SchedulerService>,
    period: Duration,
}

impl FeedScheduler {
    pub fn new(service: Arc<SchedulerService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// Start ticking in the background. The first tick fires immediately.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("📅 Feed scheduler started (every {:?})", self.period);

            let mut ticker = interval(self.period);
            // A slow tick must not be followed by a burst of catch-up ticks
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match self.service.tick().await {
                    Ok(report) if report.dispatched > 0 => {
                        tracing::debug!("🔄 Tick dispatched {} run(s)", report.dispatched)
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("❌ Scheduler tick failed: {}", e),
                }
            }
        })
    }
}

/// Start the ticker unless disabled (`None` period means external cron only)
pub fn maybe_start_scheduler(
    service: Arc<SchedulerService>,
    period: Option<Duration>,
) -> Option<JoinHandle<()>> {
    period.map(|period| FeedScheduler::new(service, period).start())
}
