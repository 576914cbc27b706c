//! Generation Service (Use Case)
//!
//! One feed run end to end: take the status lock, open a history row,
//! stream the catalog through the filter into the platform encoder, store
//! the artifact, then close the run and queue its webhook event in a
//! single transaction.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::Notify;
use tokio::time::Instant;
use uuid::Uuid;

use feedgen::domain::services::{
    FeedEncoder, FeedEvent, FeedHeader, FilterCounters, FilterDecision, FilterEngine,
    SerializeStats,
};
use feedgen::domain::ABANDONED_REASON;
use feedgen::{
    ArtifactStore, CatalogSource, Clock, DomainError, Feed, FeedFormat, FeedRepository,
    FeedStatus, GenerationError, GenerationHistory, LockOutcome, ReconcileReport, RunStats,
};

/// A run holding the feed lock with its `running` history row written
#[derive(Debug)]
pub struct StartedRun {
    /// Feed as it was before the lock was taken
    feed: Feed,
    run: GenerationHistory,
}

impl StartedRun {
    pub fn run_id(&self) -> Uuid {
        self.run.id
    }

    pub fn feed_id(&self) -> Uuid {
        self.feed.id
    }
}

/// Terminal result of an executed run
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub feed_id: Uuid,
    pub result: Result<RunStats, GenerationError>,
}

/// Bounded in-memory render; never touches history or artifacts
#[derive(Debug)]
pub struct Preview {
    pub data: Vec<u8>,
    pub format: FeedFormat,
    pub records: u64,
    pub products_processed: u64,
}

pub struct GenerationService {
    feeds: Arc<dyn FeedRepository>,
    catalog: Arc<dyn CatalogSource>,
    artifacts: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
    /// Wakes the webhook dispatcher when a run queued events
    outbox_signal: Arc<Notify>,
    deadline: Duration,
    preview_max: usize,
}

impl GenerationService {
    pub fn new(
        feeds: Arc<dyn FeedRepository>,
        catalog: Arc<dyn CatalogSource>,
        artifacts: Arc<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
        outbox_signal: Arc<Notify>,
        deadline: Duration,
        preview_max: usize,
    ) -> Self {
        Self {
            feeds,
            catalog,
            artifacts,
            clock,
            outbox_signal,
            deadline,
            preview_max,
        }
    }

    /// Validate, lock and open the history row.
    ///
    /// Every error returned here happens before the run exists, so nothing
    /// is recorded and no event is emitted.
    pub async fn start(&self, feed_id: Uuid) -> Result<StartedRun, GenerationError> {
        let feed = self
            .feeds
            .find_by_id(feed_id)
            .await
            .map_err(storage_error)?
            .ok_or(GenerationError::NotFound(feed_id))?;

        validate_config(&feed)?;
        if feed.status == FeedStatus::Inactive {
            return Err(GenerationError::Config("Feed is inactive".to_string()));
        }

        let locked = match self.feeds.try_lock(feed_id).await.map_err(storage_error)? {
            LockOutcome::Acquired(feed) => feed,
            LockOutcome::AlreadyGenerating => {
                return Err(GenerationError::ConcurrentGenerationInProgress(feed_id))
            }
            LockOutcome::NotLockable(status) => {
                return Err(GenerationError::Config(format!(
                    "Feed is {} and cannot be generated",
                    status
                )))
            }
            LockOutcome::NotFound => return Err(GenerationError::NotFound(feed_id)),
        };

        let run = GenerationHistory::start(feed_id, self.clock.now());
        if let Err(e) = self.feeds.start_run(&run).await {
            tracing::error!("🚨 Failed to open run for feed {}: {}", feed_id, e);
            if let Err(release) = self.feeds.release_lock(feed_id, locked.status).await {
                tracing::error!(
                    "🚨 Failed to release lock on feed {}: {} (left for reconciliation)",
                    feed_id,
                    release
                );
            }
            return Err(storage_error(e));
        }

        tracing::info!("🏭 Generation started: feed={} run={}", feed_id, run.id);
        Ok(StartedRun { feed: locked, run })
    }

    /// Drive a started run to a terminal history row
    pub async fn execute(&self, started: StartedRun) -> RunOutcome {
        let StartedRun { feed, run } = started;
        let run_id = run.id;
        let began = Instant::now();

        let mut counters = FilterCounters::default();
        let produced =
            match tokio::time::timeout(self.deadline, self.produce(&feed, run_id, &mut counters))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(self.deadline.as_secs())),
            };

        let mut stats = RunStats {
            products_processed: counters.processed as i64,
            products_included: counters.included as i64,
            products_excluded: counters.excluded as i64,
            generation_time_ms: began.elapsed().as_millis() as i64,
            file_size_bytes: 0,
        };

        let recorded = match produced {
            Ok((artifact_ref, bytes)) => {
                stats.file_size_bytes = bytes as i64;
                self.record_success(&feed, run.clone(), &stats, artifact_ref)
                    .await
            }
            Err(err) => Err(err),
        };

        let result = match recorded {
            Ok(()) => Ok(stats),
            Err(err) => {
                self.record_failure(&feed, run, &stats, &err).await;
                Err(err)
            }
        };

        RunOutcome {
            run_id,
            feed_id: feed.id,
            result,
        }
    }

    /// Start synchronously, finish in the background. Returns the run id.
    pub async fn generate(self: &Arc<Self>, feed_id: Uuid) -> Result<Uuid, GenerationError> {
        let started = self.start(feed_id).await?;
        let run_id = started.run_id();

        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.execute(started).await;
        });

        Ok(run_id)
    }

    /// Render up to `max_products` records without locking or recording
    pub async fn preview(
        &self,
        feed_id: Uuid,
        max_products: usize,
    ) -> Result<Preview, GenerationError> {
        let feed = self
            .feeds
            .find_by_id(feed_id)
            .await
            .map_err(storage_error)?
            .ok_or(GenerationError::NotFound(feed_id))?;
        validate_config(&feed)?;

        let limit = max_products.min(self.preview_max) as u64;
        let mut counters = FilterCounters::default();
        let (data, stats) = self.render(&feed, Some(limit), &mut counters).await?;

        Ok(Preview {
            data,
            format: feed.format,
            records: stats.records,
            products_processed: counters.processed,
        })
    }

    /// Close runs and release locks left behind by a previous process
    pub async fn reconcile(&self) -> Result<ReconcileReport, DomainError> {
        let report = self.feeds.reconcile_abandoned(ABANDONED_REASON).await?;
        if report != ReconcileReport::default() {
            tracing::warn!(
                "⚠️  Reconciled {} abandoned run(s), released {} feed lock(s)",
                report.runs_abandoned,
                report.feeds_released
            );
        }
        Ok(report)
    }

    async fn produce(
        &self,
        feed: &Feed,
        run_id: Uuid,
        counters: &mut FilterCounters,
    ) -> Result<(String, u64), GenerationError> {
        let (data, stats) = self.render(feed, None, counters).await?;
        let artifact_ref = self
            .artifacts
            .put(feed.id, run_id, feed.format, data)
            .await
            .map_err(storage_error)?;
        Ok((artifact_ref, stats.bytes))
    }

    /// Stream, filter and encode; `counters` stays accurate up to the
    /// failure point when the stream or the encoder errors
    async fn render(
        &self,
        feed: &Feed,
        limit: Option<u64>,
        counters: &mut FilterCounters,
    ) -> Result<(Vec<u8>, SerializeStats), GenerationError> {
        let target = feed.target().map_err(config_error)?;
        let generated_at = self
            .catalog
            .watermark(feed.tenant_id)
            .await
            .map_err(source_error)?
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let header = FeedHeader::for_feed(feed, generated_at);
        let mut encoder = FeedEncoder::new(target, header, Vec::new())?;
        let engine = FilterEngine::new(&feed.settings.filter);

        let mut products = self.catalog.stream_products(feed.tenant_id);
        loop {
            if limit.is_some_and(|max| encoder.records() >= max) {
                break;
            }
            let Some(item) = products.next().await else {
                break;
            };
            let product = item.map_err(source_error)?;

            let decision = engine.evaluate(&product);
            counters.record(decision);
            if decision == FilterDecision::Accept {
                encoder.push(&feed.settings.transform(product))?;
            }
        }

        Ok(encoder.finish()?)
    }

    async fn record_success(
        &self,
        feed: &Feed,
        run: GenerationHistory,
        stats: &RunStats,
        artifact_ref: String,
    ) -> Result<(), GenerationError> {
        let at = self.clock.now();
        let run = run.succeed(stats, artifact_ref, at);
        let event = FeedEvent::generated(feed, stats, at);

        let queued = retry_once("complete run", || self.feeds.complete_run(&run, &event))
            .await
            .map_err(storage_error)?;
        if queued > 0 {
            self.outbox_signal.notify_one();
        }

        tracing::info!(
            "✅ Generation finished: feed={} run={} included={} excluded={} bytes={} ({}ms)",
            feed.id,
            run.id,
            stats.products_included,
            stats.products_excluded,
            stats.file_size_bytes,
            stats.generation_time_ms
        );
        Ok(())
    }

    async fn record_failure(
        &self,
        feed: &Feed,
        run: GenerationHistory,
        stats: &RunStats,
        err: &GenerationError,
    ) {
        let at = self.clock.now();
        let message = err.to_string();
        let run = run.fail(stats, message.clone(), at);
        let event = FeedEvent::failed(feed, &message, at);

        match retry_once("record failed run", || self.feeds.fail_run(&run, &event)).await {
            Ok(queued) => {
                if queued > 0 {
                    self.outbox_signal.notify_one();
                }
                tracing::warn!(
                    "❌ Generation failed: feed={} run={} [{}] {}",
                    feed.id,
                    run.id,
                    err.code(),
                    message
                );
            }
            Err(e) => tracing::error!(
                "🚨 Could not record failed run {} of feed {}: {} (left for reconciliation)",
                run.id,
                feed.id,
                e
            ),
        }
    }
}

/// Channel/format pair and filter must be valid before anything runs
fn validate_config(feed: &Feed) -> Result<(), GenerationError> {
    feed.target().map_err(config_error)?;
    feed.settings.filter.validate().map_err(config_error)
}

async fn retry_once<T, F, Fut>(what: &str, mut op: F) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(first) => {
            tracing::warn!("⚠️  {} failed, retrying once: {}", what, first);
            op().await
        }
    }
}

fn config_error(e: DomainError) -> GenerationError {
    match e {
        DomainError::Validation(msg) => GenerationError::Config(msg),
        other => GenerationError::Config(other.to_string()),
    }
}

fn source_error(e: DomainError) -> GenerationError {
    GenerationError::Source(e.to_string())
}

fn storage_error(e: DomainError) -> GenerationError {
    GenerationError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{product, Faults, ManualClock, MemoryStore};
    use chrono::TimeZone;
    use feedgen::domain::services::serialize;
    use feedgen::{
        Availability, Channel, DeliveryStatus, FeedSettings, HistoryStatus, Product,
        WebhookEventType, WebhookSubscription,
    };

    struct Harness {
        store: Arc<MemoryStore>,
        service: Arc<GenerationService>,
        signal: Arc<Notify>,
        tenant: Uuid,
    }

    fn harness(deadline: Duration) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let signal = Arc::new(Notify::new());
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
        let service = Arc::new(GenerationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock,
            signal.clone(),
            deadline,
            500,
        ));
        Harness {
            store,
            service,
            signal,
            tenant: Uuid::new_v4(),
        }
    }

    impl Harness {
        fn feed(&self) -> Feed {
            let settings = FeedSettings {
                store_url: Some("https://shop.example".to_string()),
                ..Default::default()
            };
            let feed = Feed::new(
                self.tenant,
                "Summer".into(),
                Channel::GoogleShopping,
                FeedFormat::Xml,
                settings,
            )
            .unwrap();
            self.store.put_feed(feed.clone());
            feed
        }

        fn stock(&self) -> Vec<Product> {
            let items = vec![
                product(self.tenant, "Shirt", "19.99", Availability::InStock, 10),
                product(self.tenant, "Hat", "9.50", Availability::OutOfStock, 20),
                product(self.tenant, "Boots", "89.00", Availability::InStock, 30),
                product(self.tenant, "Scarf", "15.00", Availability::Preorder, 40),
                product(self.tenant, "Socks", "4.00", Availability::Backorder, 50),
            ];
            self.store.add_products(items.clone());
            items
        }

        async fn run(&self, feed_id: Uuid) -> RunOutcome {
            let started = self.service.start(feed_id).await.unwrap();
            self.service.execute(started).await
        }

        async fn latest_artifact(&self, feed_id: Uuid) -> Vec<u8> {
            let run = FeedRepository::latest_success(self.store.as_ref(), feed_id)
                .await
                .unwrap()
                .unwrap();
            ArtifactStore::get(self.store.as_ref(), run.artifact_ref.as_deref().unwrap())
                .await
                .unwrap()
                .unwrap()
                .data
        }
    }

    #[tokio::test]
    async fn test_successful_run_records_history_and_artifact() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();

        let outcome = h.run(feed.id).await;
        let stats = outcome.result.unwrap();
        assert_eq!(stats.products_processed, 5);
        assert_eq!(stats.products_included, 2);
        assert_eq!(stats.products_excluded, 3);

        let runs = h.store.runs_for(feed.id);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, outcome.run_id);
        assert_eq!(runs[0].status, HistoryStatus::Success);
        assert!(runs[0].completed_at.is_some());

        let stored = h.store.feed(feed.id).unwrap();
        assert_eq!(stored.status, FeedStatus::Active);
        assert_eq!(stored.products_count, 2);

        let artifact = h.latest_artifact(feed.id).await;
        assert_eq!(artifact.len() as i64, stats.file_size_bytes);
    }

    #[tokio::test]
    async fn test_out_of_stock_never_reaches_artifact() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();

        h.run(feed.id).await.result.unwrap();
        let xml = String::from_utf8(h.latest_artifact(feed.id).await).unwrap();

        assert!(xml.contains("<g:id>sku-shirt</g:id>"));
        assert!(xml.contains("<g:id>sku-boots</g:id>"));
        assert!(!xml.contains("sku-hat"));
        assert!(!xml.contains("sku-scarf"));
        assert!(!xml.contains("sku-socks"));
        assert!(!xml.contains("out of stock"));
    }

    #[tokio::test]
    async fn test_unchanged_catalog_gives_identical_bytes() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();

        h.run(feed.id).await.result.unwrap();
        let first = h.latest_artifact(feed.id).await;
        h.run(feed.id).await.result.unwrap();
        let second = h.latest_artifact(feed.id).await;

        assert_eq!(first, second);
        assert_eq!(h.store.artifact_count(), 2);
    }

    #[tokio::test]
    async fn test_artifact_matches_direct_serialization() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        let catalog = h.stock();

        h.run(feed.id).await.result.unwrap();
        let artifact = h.latest_artifact(feed.id).await;

        let eligible: Vec<Product> = catalog
            .into_iter()
            .filter(|p| p.availability == Availability::InStock)
            .collect();
        let watermark = Utc.timestamp_opt(50, 0).unwrap();
        let (expected, _) = serialize(&feed, watermark, &eligible).unwrap();

        assert_eq!(artifact, expected);
    }

    #[tokio::test]
    async fn test_concurrent_start_yields_single_run() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();

        let (a, b) = tokio::join!(h.service.start(feed.id), h.service.start(feed.id));
        let (won, lost) = match (a, b) {
            (Ok(run), Err(err)) | (Err(err), Ok(run)) => (run, err),
            other => panic!("expected exactly one winner, got {:?}", other),
        };
        assert!(matches!(lost, GenerationError::ConcurrentGenerationInProgress(id) if id == feed.id));
        assert_eq!(h.store.runs_for(feed.id).len(), 1);

        h.service.execute(won).await.result.unwrap();
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Active);
    }

    #[tokio::test]
    async fn test_inactive_feed_is_config_error_without_history() {
        let h = harness(Duration::from_secs(600));
        let mut feed = h.feed();
        feed.status = FeedStatus::Inactive;
        h.store.put_feed(feed.clone());

        let err = h.service.start(feed.id).await.unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
        assert!(h.store.runs_for(feed.id).is_empty());
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Inactive);
    }

    #[tokio::test]
    async fn test_unknown_feed_is_not_found() {
        let h = harness(Duration::from_secs(600));
        let id = Uuid::new_v4();
        assert!(matches!(
            h.service.start(id).await.unwrap_err(),
            GenerationError::NotFound(missing) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_source_failure_marks_run_failed_and_emits_event() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();
        h.store.put_subscription(WebhookSubscription::new(
            feed.id,
            "https://hooks.example/feed".into(),
            3,
            30,
        ));
        h.store.set_faults(Faults {
            catalog_fails_after: Some(2),
            ..Default::default()
        });

        let outcome = h.run(feed.id).await;
        assert!(matches!(outcome.result, Err(GenerationError::Source(_))));

        let run = &h.store.runs_for(feed.id)[0];
        assert_eq!(run.status, HistoryStatus::Failed);
        assert_eq!(run.products_processed, 2);
        assert!(run.error_message.as_deref().unwrap().contains("catalog connection reset"));
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Error);
        assert_eq!(h.store.artifact_count(), 0);

        let outbox = h.store.outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].0.event, WebhookEventType::FeedFailed);
        assert_eq!(outbox[0].1, DeliveryStatus::Pending);
        // A permit is stored for the dispatcher
        tokio::time::timeout(Duration::from_millis(10), h.signal.notified())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_storage_failure_fails_run() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();
        h.store.set_faults(Faults {
            artifact_put_fails: true,
            ..Default::default()
        });

        let outcome = h.run(feed.id).await;
        assert!(matches!(outcome.result, Err(GenerationError::Storage(_))));
        assert_eq!(h.store.runs_for(feed.id)[0].status, HistoryStatus::Failed);
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Error);

        // Error state does not block the next attempt
        h.store.set_faults(Faults::default());
        h.run(feed.id).await.result.unwrap();
    }

    #[tokio::test]
    async fn test_history_write_retried_once() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();
        h.store.set_faults(Faults {
            complete_run_failures: 1,
            ..Default::default()
        });

        let outcome = h.run(feed.id).await;
        assert_eq!(outcome.result.unwrap().products_included, 2);

        let runs = h.store.runs_for(feed.id);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, HistoryStatus::Success);
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Active);
    }

    #[tokio::test]
    async fn test_unrecordable_run_is_left_for_reconciliation() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();
        h.store.set_faults(Faults {
            complete_run_failures: 2,
            fail_run_failures: 2,
            ..Default::default()
        });

        let outcome = h.run(feed.id).await;
        assert!(matches!(outcome.result, Err(GenerationError::Storage(_))));

        // Neither close landed: lock and running row stay behind
        let runs = h.store.runs_for(feed.id);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, HistoryStatus::Running);
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Generating);
        assert!(h.store.outbox().is_empty());

        let report = h.service.reconcile().await.unwrap();
        assert_eq!(report.runs_abandoned, 1);
        assert_eq!(report.feeds_released, 1);

        let run = &h.store.runs_for(feed.id)[0];
        assert_eq!(run.id, outcome.run_id);
        assert_eq!(run.status, HistoryStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some(ABANDONED_REASON));
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_run() {
        let h = harness(Duration::from_secs(2));
        let feed = h.feed();
        h.stock();
        h.store.set_faults(Faults {
            catalog_delay: Some(Duration::from_secs(1)),
            ..Default::default()
        });

        let outcome = h.run(feed.id).await;
        assert!(matches!(outcome.result, Err(GenerationError::Timeout(2))));

        let run = &h.store.runs_for(feed.id)[0];
        assert_eq!(run.status, HistoryStatus::Failed);
        assert!(run.products_processed < 5);
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Error);
    }

    #[tokio::test]
    async fn test_success_queues_generated_event_for_subscriber() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();
        let sub = WebhookSubscription::new(feed.id, "https://hooks.example/feed".into(), 3, 30);
        h.store.put_subscription(sub.clone());

        h.run(feed.id).await.result.unwrap();

        let outbox = h.store.outbox();
        assert_eq!(outbox.len(), 1);
        let (event, _) = &outbox[0];
        assert_eq!(event.subscription_id, sub.id);
        assert_eq!(event.event, WebhookEventType::FeedGenerated);
        let body: serde_json::Value = serde_json::from_slice(&event.payload).unwrap();
        assert_eq!(body["products_included"], 2);
    }

    #[tokio::test]
    async fn test_preview_is_bounded_and_side_effect_free() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        h.stock();

        let preview = h.service.preview(feed.id, 1).await.unwrap();
        assert_eq!(preview.records, 1);
        assert_eq!(preview.format, FeedFormat::Xml);
        let xml = String::from_utf8(preview.data).unwrap();
        assert_eq!(xml.matches("<item>").count(), 1);
        assert!(xml.ends_with("</rss>\n"));

        assert!(h.store.runs_for(feed.id).is_empty());
        assert_eq!(h.store.artifact_count(), 0);
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Active);
    }

    #[tokio::test]
    async fn test_reconcile_releases_stale_lock() {
        let h = harness(Duration::from_secs(600));
        let feed = h.feed();
        let _orphan = h.service.start(feed.id).await.unwrap();

        let report = h.service.reconcile().await.unwrap();
        assert_eq!(report.feeds_released, 1);
        assert_eq!(report.runs_abandoned, 1);

        let run = &h.store.runs_for(feed.id)[0];
        assert_eq!(run.status, HistoryStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some(ABANDONED_REASON));
        assert_eq!(h.store.feed(feed.id).unwrap().status, FeedStatus::Error);
    }
}
