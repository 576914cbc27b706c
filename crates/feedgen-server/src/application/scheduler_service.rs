//! Scheduler Service (Use Case)
//!
//! One tick: pick due schedules, start their runs under a global
//! concurrency cap, and fold each run's outcome back into its schedule.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

use feedgen::domain::AUTO_PAUSE_THRESHOLD;
use feedgen::{Clock, DomainError, GenerationError, ScheduleRepository};

use super::GenerationService;

/// Result of a tick. `handles` complete once each run and its schedule
/// update are done.
#[derive(Debug, Default)]
pub struct TickReport {
    pub dispatched: usize,
    pub handles: Vec<JoinHandle<()>>,
}

pub struct SchedulerService {
    schedules: Arc<dyn ScheduleRepository>,
    generation: Arc<GenerationService>,
    clock: Arc<dyn Clock>,
    /// Caps scheduled runs in flight across ticks
    permits: Arc<Semaphore>,
}

impl SchedulerService {
    pub fn new(
        schedules: Arc<dyn ScheduleRepository>,
        generation: Arc<GenerationService>,
        clock: Arc<dyn Clock>,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            schedules,
            generation,
            clock,
            permits: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
        }
    }

    /// Dispatch every due schedule that fits under the concurrency cap.
    /// Schedules left over stay due and are picked up by a later tick.
    pub async fn tick(&self) -> Result<TickReport, DomainError> {
        let mut report = TickReport::default();

        let capacity = self.permits.available_permits();
        if capacity == 0 {
            tracing::debug!("📅 Scheduler tick skipped: all run slots busy");
            return Ok(report);
        }

        let due = self.schedules.find_due(self.clock.now(), capacity as i64).await?;
        for schedule in due {
            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                break;
            };
            let feed_id = schedule.feed_id;

            match self.generation.start(feed_id).await {
                Ok(started) => {
                    let generation = Arc::clone(&self.generation);
                    let schedules = Arc::clone(&self.schedules);
                    let clock = Arc::clone(&self.clock);

                    report.handles.push(tokio::spawn(async move {
                        let outcome = generation.execute(started).await;
                        drop(permit);
                        let result = outcome.result.map(|_| ()).map_err(|e| e.to_string());
                        record_outcome(schedules.as_ref(), clock.as_ref(), feed_id, result).await;
                    }));
                    report.dispatched += 1;
                }
                // The running generation owns this window
                Err(GenerationError::ConcurrentGenerationInProgress(_)) => {
                    tracing::debug!("📅 Feed {} already generating, schedule untouched", feed_id);
                }
                Err(GenerationError::NotFound(_)) => {
                    tracing::warn!("⚠️  Schedule points at missing feed {}", feed_id);
                }
                Err(err) => {
                    tracing::warn!("❌ Scheduled run for feed {} not started: {}", feed_id, err);
                    record_outcome(
                        self.schedules.as_ref(),
                        self.clock.as_ref(),
                        feed_id,
                        Err(err.to_string()),
                    )
                    .await;
                }
            }
        }

        if report.dispatched > 0 {
            tracing::info!("📅 Scheduler tick: dispatched {} run(s)", report.dispatched);
        }
        Ok(report)
    }
}

/// Fold a run's result into its schedule. Edits made while the run was in
/// flight are kept; only the run bookkeeping columns move.
async fn record_outcome(
    schedules: &dyn ScheduleRepository,
    clock: &dyn Clock,
    feed_id: Uuid,
    result: Result<(), String>,
) {
    let failure = result.err();
    match schedules.record_run(feed_id, clock.now(), failure.as_deref()).await {
        Ok(Some(schedule))
            if failure.is_some()
                && !schedule.enabled
                && schedule.consecutive_failures == AUTO_PAUSE_THRESHOLD =>
        {
            tracing::warn!(
                "⏸️  Schedule of feed {} auto-paused after {} consecutive failures",
                feed_id,
                schedule.consecutive_failures
            );
        }
        Ok(_) => {}
        Err(e) => tracing::error!("🚨 Failed to update schedule of feed {}: {}", feed_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{product, Faults, ManualClock, MemoryStore};
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use feedgen::{
        Availability, Channel, Feed, FeedFormat, FeedSettings, FeedStatus, Schedule,
        ScheduleInterval,
    };
    use std::time::Duration;
    use tokio::sync::Notify;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap()
    }

    struct Harness {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        generation: Arc<GenerationService>,
        scheduler: SchedulerService,
        tenant: Uuid,
    }

    fn harness(max_runs: usize) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at(t0()));
        let generation = Arc::new(GenerationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
            Arc::new(Notify::new()),
            Duration::from_secs(600),
            500,
        ));
        let scheduler = SchedulerService::new(store.clone(), generation.clone(), clock.clone(), max_runs);
        let tenant = Uuid::new_v4();
        store.add_products([product(tenant, "Shirt", "10.00", Availability::InStock, 1)]);
        Harness {
            store,
            clock,
            generation,
            scheduler,
            tenant,
        }
    }

    impl Harness {
        /// Feed with an hourly schedule due at t0
        fn scheduled_feed(&self) -> Feed {
            let feed = Feed::new(
                self.tenant,
                "Hourly".into(),
                Channel::FacebookCatalog,
                FeedFormat::Csv,
                FeedSettings::default(),
            )
            .unwrap();
            self.store.put_feed(feed.clone());
            self.store.put_schedule(Schedule::new(
                feed.id,
                ScheduleInterval::Hourly,
                t0() - ChronoDuration::hours(1),
            ));
            feed
        }

        async fn tick_and_wait(&self) -> usize {
            let report = self.scheduler.tick().await.unwrap();
            for handle in report.handles {
                handle.await.unwrap();
            }
            report.dispatched
        }
    }

    #[tokio::test]
    async fn test_success_advances_schedule() {
        let h = harness(50);
        let feed = h.scheduled_feed();

        assert_eq!(h.tick_and_wait().await, 1);

        let schedule = h.store.schedule(feed.id).unwrap();
        assert_eq!(schedule.last_run_at, Some(t0()));
        assert_eq!(schedule.next_run_at, t0() + ChronoDuration::hours(1));
        assert_eq!(schedule.consecutive_failures, 0);
        assert_eq!(h.store.runs_for(feed.id).len(), 1);

        // Not due again until the interval elapses
        assert_eq!(h.tick_and_wait().await, 0);
    }

    #[tokio::test]
    async fn test_three_failures_auto_pause() {
        let h = harness(50);
        let feed = h.scheduled_feed();
        h.store.set_faults(Faults {
            catalog_fails_after: Some(0),
            ..Default::default()
        });

        assert_eq!(h.tick_and_wait().await, 1);
        let schedule = h.store.schedule(feed.id).unwrap();
        assert_eq!(schedule.consecutive_failures, 1);
        assert!(schedule.enabled);
        assert_eq!(schedule.next_run_at, t0() + ChronoDuration::hours(1));

        h.clock.advance(ChronoDuration::hours(1));
        assert_eq!(h.tick_and_wait().await, 1);
        assert_eq!(h.store.schedule(feed.id).unwrap().consecutive_failures, 2);

        h.clock.advance(ChronoDuration::hours(1));
        assert_eq!(h.tick_and_wait().await, 1);
        let schedule = h.store.schedule(feed.id).unwrap();
        assert_eq!(schedule.consecutive_failures, 3);
        assert!(!schedule.enabled);
        assert!(schedule.last_error.as_deref().unwrap().contains("catalog connection reset"));

        h.clock.advance(ChronoDuration::hours(1));
        assert_eq!(h.tick_and_wait().await, 0);
        assert_eq!(h.store.runs_for(feed.id).len(), 3);

        // Re-enabling clears the failure streak
        let mut schedule = h.store.schedule(feed.id).unwrap();
        schedule.apply_update(Some(true), None, h.clock.now());
        h.store.put_schedule(schedule);
        let schedule = h.store.schedule(feed.id).unwrap();
        assert!(schedule.enabled);
        assert_eq!(schedule.consecutive_failures, 0);
        assert_eq!(schedule.next_run_at, h.clock.now() + ChronoDuration::hours(1));
    }

    #[tokio::test]
    async fn test_generating_feed_is_skipped_without_touching_schedule() {
        let h = harness(50);
        let feed = h.scheduled_feed();
        let _manual = h.generation.start(feed.id).await.unwrap();
        let before = h.store.schedule(feed.id).unwrap();

        assert_eq!(h.tick_and_wait().await, 0);
        assert_eq!(h.store.schedule(feed.id).unwrap(), before);
        assert_eq!(h.store.runs_for(feed.id).len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_feed_not_selected() {
        let h = harness(50);
        let mut feed = h.scheduled_feed();
        feed.status = FeedStatus::Inactive;
        h.store.put_feed(feed.clone());

        assert_eq!(h.tick_and_wait().await, 0);
        assert!(h.store.runs_for(feed.id).is_empty());
    }

    #[tokio::test]
    async fn test_capped_tick_takes_lowest_feed_id_on_tie() {
        let h = harness(1);
        let a = h.scheduled_feed();
        let b = h.scheduled_feed();
        let (first, second) = if a.id < b.id { (a, b) } else { (b, a) };
        assert_eq!(
            h.store.schedule(first.id).unwrap().next_run_at,
            h.store.schedule(second.id).unwrap().next_run_at
        );

        assert_eq!(h.tick_and_wait().await, 1);
        assert_eq!(h.store.runs_for(first.id).len(), 1);
        assert!(h.store.runs_for(second.id).is_empty());

        assert_eq!(h.tick_and_wait().await, 1);
        assert_eq!(h.store.runs_for(second.id).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_run_survives_outcome() {
        let h = harness(50);
        let feed = h.scheduled_feed();
        h.store.set_faults(Faults {
            catalog_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });

        let report = h.scheduler.tick().await.unwrap();
        assert_eq!(report.dispatched, 1);

        // PUT /schedule lands while the run is streaming
        let mut edited = h.store.schedule(feed.id).unwrap();
        edited.apply_update(Some(false), Some(ScheduleInterval::Daily), h.clock.now());
        ScheduleRepository::save(h.store.as_ref(), &edited).await.unwrap();

        for handle in report.handles {
            handle.await.unwrap();
        }

        let schedule = h.store.schedule(feed.id).unwrap();
        assert!(!schedule.enabled);
        assert_eq!(schedule.interval, ScheduleInterval::Daily);
        assert_eq!(schedule.next_run_at, t0() + ChronoDuration::hours(24));
        assert_eq!(schedule.last_run_at, Some(t0()));
        assert_eq!(h.store.runs_for(feed.id)[0].status, feedgen::HistoryStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_defers_excess_schedules() {
        let h = harness(2);
        let feeds: Vec<Feed> = (0..3).map(|_| h.scheduled_feed()).collect();
        h.store.set_faults(Faults {
            catalog_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });

        let first = h.scheduler.tick().await.unwrap();
        assert_eq!(first.dispatched, 2);

        // Slots are still held by the running pair
        let second = h.scheduler.tick().await.unwrap();
        assert_eq!(second.dispatched, 0);

        for handle in first.handles {
            handle.await.unwrap();
        }
        assert_eq!(h.tick_and_wait().await, 1);

        for feed in &feeds {
            assert_eq!(h.store.runs_for(feed.id).len(), 1);
        }
    }
}
