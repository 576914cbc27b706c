//! In-memory port implementations for application tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use futures::stream::{self, BoxStream, StreamExt};
use uuid::Uuid;

use feedgen::domain::services::FeedEvent;
use feedgen::{
    ArtifactStore, AttemptOutcome, Availability, CatalogSource, Clock, DeliveryStatus, DomainError, Feed,
    FeedFormat, FeedRepository, FeedStatus, GenerationHistory, HistoryStatus, LockOutcome,
    Product, QueuedEvent, ReconcileReport, Schedule, ScheduleRepository, StoredArtifact,
    WebhookDelivery, WebhookEventType, WebhookRepository, WebhookSubscription, WebhookTransport,
};

#[derive(Default)]
struct State {
    feeds: HashMap<Uuid, Feed>,
    runs: Vec<GenerationHistory>,
    products: Vec<Product>,
    schedules: HashMap<Uuid, Schedule>,
    subscriptions: HashMap<Uuid, WebhookSubscription>,
    outbox: Vec<(QueuedEvent, DeliveryStatus)>,
    deliveries: Vec<WebhookDelivery>,
    artifacts: HashMap<String, StoredArtifact>,
}

/// Failure and latency injection
#[derive(Default, Clone)]
pub struct Faults {
    /// Catalog stream errors after yielding this many products
    pub catalog_fails_after: Option<usize>,
    /// Delay before each product is yielded
    pub catalog_delay: Option<Duration>,
    pub artifact_put_fails: bool,
    /// `complete_run` errors this many times before going through
    pub complete_run_failures: usize,
    /// `fail_run` errors this many times before going through
    pub fail_run_failures: usize,
    pub due_query_fails: bool,
}

/// Every storage port over one mutex-guarded state
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    faults: Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.faults.lock().unwrap() = faults;
    }

    /// Consume one injected history-write failure
    fn history_write_fault(&self, pick: impl FnOnce(&mut Faults) -> &mut usize) -> Result<(), DomainError> {
        let mut faults = self.faults.lock().unwrap();
        let remaining = pick(&mut *faults);
        if *remaining > 0 {
            *remaining -= 1;
            return Err(DomainError::Repository("history write timed out".to_string()));
        }
        Ok(())
    }

    pub fn put_feed(&self, feed: Feed) {
        self.with(|s| s.feeds.insert(feed.id, feed));
    }

    pub fn feed(&self, id: Uuid) -> Option<Feed> {
        self.with(|s| s.feeds.get(&id).cloned())
    }

    pub fn add_products(&self, products: impl IntoIterator<Item = Product>) {
        self.with(|s| s.products.extend(products));
    }

    pub fn runs_for(&self, feed_id: Uuid) -> Vec<GenerationHistory> {
        self.with(|s| s.runs.iter().filter(|r| r.feed_id == feed_id).cloned().collect())
    }

    pub fn put_schedule(&self, schedule: Schedule) {
        self.with(|s| s.schedules.insert(schedule.feed_id, schedule));
    }

    pub fn schedule(&self, feed_id: Uuid) -> Option<Schedule> {
        self.with(|s| s.schedules.get(&feed_id).cloned())
    }

    pub fn put_subscription(&self, sub: WebhookSubscription) {
        self.with(|s| s.subscriptions.insert(sub.id, sub));
    }

    pub fn subscription(&self, id: Uuid) -> Option<WebhookSubscription> {
        self.with(|s| s.subscriptions.get(&id).cloned())
    }

    pub fn outbox(&self) -> Vec<(QueuedEvent, DeliveryStatus)> {
        self.with(|s| s.outbox.clone())
    }

    pub fn deliveries(&self) -> Vec<WebhookDelivery> {
        self.with(|s| s.deliveries.clone())
    }

    pub fn artifact_count(&self) -> usize {
        self.with(|s| s.artifacts.len())
    }

    fn fan_out(state: &mut State, event: &FeedEvent) -> u64 {
        let now = Utc::now();
        let targets: Vec<Uuid> = state
            .subscriptions
            .values()
            .filter(|sub| sub.feed_id == event.feed_id && sub.should_receive(event.event))
            .map(|sub| sub.id)
            .collect();
        for subscription_id in &targets {
            state.outbox.push((
                QueuedEvent {
                    id: Uuid::new_v4(),
                    subscription_id: *subscription_id,
                    feed_id: event.feed_id,
                    event: event.event,
                    payload: event.payload.clone(),
                    attempts: 0,
                    next_attempt_at: DateTime::<Utc>::UNIX_EPOCH,
                    created_at: now,
                },
                DeliveryStatus::Pending,
            ));
        }
        targets.len() as u64
    }

    fn close_run(state: &mut State, run: &GenerationHistory) -> Result<(), DomainError> {
        let slot = state
            .runs
            .iter_mut()
            .find(|r| r.id == run.id && r.status == HistoryStatus::Running)
            .ok_or_else(|| DomainError::Conflict(format!("Run {} is not open", run.id)))?;
        *slot = run.clone();
        Ok(())
    }
}

#[async_trait]
impl FeedRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Feed>, DomainError> {
        Ok(self.feed(id))
    }

    async fn insert(&self, feed: &Feed) -> Result<Feed, DomainError> {
        self.put_feed(feed.clone());
        Ok(feed.clone())
    }

    async fn update_config(&self, feed: &Feed) -> Result<Option<Feed>, DomainError> {
        Ok(self.with(|s| match s.feeds.get_mut(&feed.id) {
            Some(current) if current.status != FeedStatus::Generating => {
                current.name = feed.name.clone();
                current.settings = feed.settings.clone();
                current.status = feed.status;
                current.updated_at = Utc::now();
                Some(current.clone())
            }
            _ => None,
        }))
    }

    async fn try_lock(&self, feed_id: Uuid) -> Result<LockOutcome, DomainError> {
        Ok(self.with(|s| match s.feeds.get_mut(&feed_id) {
            None => LockOutcome::NotFound,
            Some(feed) if feed.status == FeedStatus::Generating => LockOutcome::AlreadyGenerating,
            Some(feed) if feed.status.can_start_generation() => {
                let prior = feed.clone();
                feed.status = FeedStatus::Generating;
                LockOutcome::Acquired(prior)
            }
            Some(feed) => LockOutcome::NotLockable(feed.status),
        }))
    }

    async fn release_lock(&self, feed_id: Uuid, status: FeedStatus) -> Result<(), DomainError> {
        self.with(|s| {
            if let Some(feed) = s.feeds.get_mut(&feed_id) {
                if feed.status == FeedStatus::Generating {
                    feed.status = status;
                }
            }
        });
        Ok(())
    }

    async fn start_run(&self, run: &GenerationHistory) -> Result<(), DomainError> {
        self.with(|s| s.runs.push(run.clone()));
        Ok(())
    }

    async fn complete_run(&self, run: &GenerationHistory, event: &FeedEvent) -> Result<u64, DomainError> {
        self.history_write_fault(|f| &mut f.complete_run_failures)?;
        self.with(|s| {
            Self::close_run(s, run)?;
            if let Some(feed) = s.feeds.get_mut(&run.feed_id) {
                feed.status = FeedStatus::Active;
                feed.products_count = run.products_included;
                feed.last_generated_at = run.completed_at;
            }
            Ok(Self::fan_out(s, event))
        })
    }

    async fn fail_run(&self, run: &GenerationHistory, event: &FeedEvent) -> Result<u64, DomainError> {
        self.history_write_fault(|f| &mut f.fail_run_failures)?;
        self.with(|s| {
            Self::close_run(s, run)?;
            if let Some(feed) = s.feeds.get_mut(&run.feed_id) {
                feed.status = FeedStatus::Error;
            }
            Ok(Self::fan_out(s, event))
        })
    }

    async fn find_run(&self, run_id: Uuid) -> Result<Option<GenerationHistory>, DomainError> {
        Ok(self.with(|s| s.runs.iter().find(|r| r.id == run_id).cloned()))
    }

    async fn list_runs(&self, feed_id: Uuid, limit: i64) -> Result<Vec<GenerationHistory>, DomainError> {
        let mut runs = self.runs_for(feed_id);
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit.max(0) as usize);
        Ok(runs)
    }

    async fn latest_success(&self, feed_id: Uuid) -> Result<Option<GenerationHistory>, DomainError> {
        Ok(self
            .runs_for(feed_id)
            .into_iter()
            .filter(|r| r.status == HistoryStatus::Success)
            .max_by_key(|r| r.completed_at))
    }

    async fn reconcile_abandoned(&self, reason: &str) -> Result<ReconcileReport, DomainError> {
        Ok(self.with(|s| {
            let mut report = ReconcileReport::default();
            for run in s.runs.iter_mut().filter(|r| r.status == HistoryStatus::Running) {
                run.status = HistoryStatus::Failed;
                run.error_message = Some(reason.to_string());
                run.completed_at = Some(Utc::now());
                report.runs_abandoned += 1;
            }
            for feed in s.feeds.values_mut().filter(|f| f.status == FeedStatus::Generating) {
                feed.status = FeedStatus::Error;
                report.feeds_released += 1;
            }
            report
        }))
    }
}

#[async_trait]
impl CatalogSource for MemoryStore {
    fn stream_products(&self, tenant_id: Uuid) -> BoxStream<'_, Result<Product, DomainError>> {
        let mut products: Vec<Product> = self.with(|s| {
            s.products.iter().filter(|p| p.tenant_id == tenant_id).cloned().collect()
        });
        products.sort_by(|a, b| (a.updated_at, a.id).cmp(&(b.updated_at, b.id)));

        let faults = self.faults.lock().unwrap().clone();
        let mut items: Vec<Result<Product, DomainError>> = products.into_iter().map(Ok).collect();
        if let Some(n) = faults.catalog_fails_after {
            items.truncate(n);
            items.push(Err(DomainError::Repository("catalog connection reset".to_string())));
        }

        let items = stream::iter(items);
        match faults.catalog_delay {
            Some(delay) => items
                .then(move |item| async move {
                    tokio::time::sleep(delay).await;
                    item
                })
                .boxed(),
            None => items.boxed(),
        }
    }

    async fn watermark(&self, tenant_id: Uuid) -> Result<Option<DateTime<Utc>>, DomainError> {
        Ok(self.with(|s| {
            s.products
                .iter()
                .filter(|p| p.tenant_id == tenant_id)
                .map(|p| p.updated_at)
                .max()
        }))
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(
        &self,
        feed_id: Uuid,
        run_id: Uuid,
        format: FeedFormat,
        data: Vec<u8>,
    ) -> Result<String, DomainError> {
        if self.faults.lock().unwrap().artifact_put_fails {
            return Err(DomainError::Repository("artifact bucket unavailable".to_string()));
        }
        let artifact_ref = format!("{}/{}.{}", feed_id, run_id, format.extension());
        let artifact = StoredArtifact {
            artifact_ref: artifact_ref.clone(),
            feed_id,
            run_id,
            format,
            data,
            created_at: Utc::now(),
        };
        self.with(|s| s.artifacts.insert(artifact_ref.clone(), artifact));
        Ok(artifact_ref)
    }

    async fn get(&self, artifact_ref: &str) -> Result<Option<StoredArtifact>, DomainError> {
        Ok(self.with(|s| s.artifacts.get(artifact_ref).cloned()))
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn find_by_feed(&self, feed_id: Uuid) -> Result<Option<Schedule>, DomainError> {
        Ok(self.schedule(feed_id))
    }

    async fn save(&self, schedule: &Schedule) -> Result<Schedule, DomainError> {
        self.put_schedule(schedule.clone());
        Ok(schedule.clone())
    }

    async fn record_run(
        &self,
        feed_id: Uuid,
        at: DateTime<Utc>,
        failure: Option<&str>,
    ) -> Result<Option<Schedule>, DomainError> {
        Ok(self.with(|s| {
            let schedule = s.schedules.get_mut(&feed_id)?;
            match failure {
                None => schedule.record_success(at),
                Some(reason) => {
                    schedule.record_failure(at, reason.to_string());
                }
            }
            Some(schedule.clone())
        }))
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Schedule>, DomainError> {
        if self.faults.lock().unwrap().due_query_fails {
            return Err(DomainError::Repository("schedule query failed".to_string()));
        }
        Ok(self.with(|s| {
            let mut due: Vec<Schedule> = s
                .schedules
                .values()
                .filter(|sch| sch.is_due(now))
                .filter(|sch| {
                    s.feeds.get(&sch.feed_id).is_some_and(|f| {
                        !matches!(f.status, FeedStatus::Generating | FeedStatus::Inactive)
                    })
                })
                .cloned()
                .collect();
            due.sort_by(|a, b| (a.next_run_at, a.feed_id).cmp(&(b.next_run_at, b.feed_id)));
            due.truncate(limit.max(0) as usize);
            due
        }))
    }
}

#[async_trait]
impl WebhookRepository for MemoryStore {
    async fn find_by_feed(&self, feed_id: Uuid) -> Result<Option<WebhookSubscription>, DomainError> {
        Ok(self.with(|s| s.subscriptions.values().find(|w| w.feed_id == feed_id).cloned()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookSubscription>, DomainError> {
        Ok(self.subscription(id))
    }

    async fn save(&self, subscription: &WebhookSubscription) -> Result<WebhookSubscription, DomainError> {
        Ok(self.with(|s| {
            let existing = s
                .subscriptions
                .values()
                .find(|w| w.feed_id == subscription.feed_id)
                .cloned();
            let saved = match existing {
                Some(current) => WebhookSubscription {
                    id: current.id,
                    total_deliveries: current.total_deliveries,
                    successful_deliveries: current.successful_deliveries,
                    failed_deliveries: current.failed_deliveries,
                    created_at: current.created_at,
                    ..subscription.clone()
                },
                None => subscription.clone(),
            };
            s.subscriptions.insert(saved.id, saved.clone());
            saved
        }))
    }

    async fn enqueue(&self, event: &QueuedEvent) -> Result<(), DomainError> {
        self.with(|s| s.outbox.push((event.clone(), DeliveryStatus::Pending)));
        Ok(())
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<QueuedEvent>, DomainError> {
        Ok(self.with(|s| {
            let mut claimed = Vec::new();
            for (event, status) in s.outbox.iter_mut() {
                if claimed.len() as i64 >= limit {
                    break;
                }
                if *status == DeliveryStatus::Pending && event.next_attempt_at <= now {
                    *status = DeliveryStatus::InFlight;
                    claimed.push(event.clone());
                }
            }
            claimed
        }))
    }

    async fn record_attempt(
        &self,
        delivery: &WebhookDelivery,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.with(|s| {
            s.deliveries.push(delivery.clone());
            if let Some((event, _)) = s.outbox.iter_mut().find(|(e, _)| e.id == delivery.event_id) {
                event.attempts = delivery.attempt;
                event.next_attempt_at = next_attempt_at;
            }
        });
        Ok(())
    }

    async fn finish(&self, event: &QueuedEvent, status: DeliveryStatus) -> Result<(), DomainError> {
        self.with(|s| {
            if let Some((_, slot)) = s.outbox.iter_mut().find(|(e, _)| e.id == event.id) {
                *slot = status;
            }
            if let Some(sub) = s.subscriptions.get_mut(&event.subscription_id) {
                match status {
                    DeliveryStatus::Delivered => {
                        sub.total_deliveries += 1;
                        sub.successful_deliveries += 1;
                    }
                    DeliveryStatus::Failed => {
                        sub.total_deliveries += 1;
                        sub.failed_deliveries += 1;
                    }
                    _ => {}
                }
            }
        });
        Ok(())
    }

    async fn release_in_flight(&self) -> Result<u64, DomainError> {
        Ok(self.with(|s| {
            let mut released = 0;
            for (_, status) in s.outbox.iter_mut() {
                if *status == DeliveryStatus::InFlight {
                    *status = DeliveryStatus::Pending;
                    released += 1;
                }
            }
            released
        }))
    }

    async fn list_deliveries(&self, subscription_id: Uuid, limit: i64) -> Result<Vec<WebhookDelivery>, DomainError> {
        let mut rows: Vec<WebhookDelivery> = self
            .deliveries()
            .into_iter()
            .filter(|d| d.subscription_id == subscription_id)
            .collect();
        rows.sort_by(|a, b| (b.delivered_at, b.attempt).cmp(&(a.delivered_at, a.attempt)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

/// Clock moved by hand
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Wall time derived from tokio's (pausable) clock
pub struct TokioClock {
    origin: DateTime<Utc>,
    start: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.start.elapsed()).unwrap_or_default();
        self.origin + elapsed
    }
}

/// Transport that replays scripted status codes (`None` = connection error)
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Option<i32>>>,
    calls: Mutex<Vec<(tokio::time::Instant, WebhookEventType, Vec<u8>)>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn replying(codes: impl IntoIterator<Item = Option<i32>>) -> Self {
        Self {
            script: Mutex::new(codes.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Every attempt takes `latency` before answering
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Default::default()
        }
    }

    /// Most attempts ever in progress at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _, _)| *t).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookTransport for ScriptedTransport {
    async fn send(
        &self,
        _subscription: &WebhookSubscription,
        event: WebhookEventType,
        body: &[u8],
    ) -> AttemptOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((tokio::time::Instant::now(), event, body.to_vec()));
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_in_flight, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        // Exhausted script keeps answering 200
        let code = self.script.lock().unwrap().pop_front().unwrap_or(Some(200));
        match code {
            Some(code) => AttemptOutcome {
                status_code: Some(code),
                response_time_ms: 1,
                error: (!(200..300).contains(&code)).then(|| format!("HTTP {}", code)),
            },
            None => AttemptOutcome {
                status_code: None,
                response_time_ms: 1,
                error: Some("connection refused".to_string()),
            },
        }
    }

    fn sign_payload(&self, secret: &str, _payload: &[u8]) -> String {
        format!("sha256={}", secret)
    }
}

/// Catalog product for pipeline tests; `updated` is seconds after the epoch
pub fn product(
    tenant_id: Uuid,
    title: &str,
    price: &str,
    availability: Availability,
    updated: i64,
) -> Product {
    Product {
        id: Uuid::new_v4(),
        tenant_id,
        external_id: format!("sku-{}", title.to_lowercase().replace(' ', "-")),
        sku: None,
        title: title.to_string(),
        description: format!("{} description", title),
        brand: Some("Acme".to_string()),
        category: Some("Apparel".to_string()),
        price: price.parse::<Decimal>().unwrap(),
        currency: "USD".to_string(),
        availability,
        images: vec![format!("https://cdn.example/{}.jpg", title.to_lowercase())],
        tags: Vec::new(),
        collections: Vec::new(),
        metadata: serde_json::json!({}),
        updated_at: Utc.timestamp_opt(updated, 0).unwrap(),
    }
}
