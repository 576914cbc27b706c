//! Feed Application Service (Use Case)
//!
//! Control-plane operations: feed configuration, schedules, webhook
//! subscriptions, history and artifact lookups.

use std::sync::Arc;

use tokio::sync::Notify;
use uuid::Uuid;

use feedgen::domain::services::FeedEvent;
use feedgen::{
    ArtifactStore, Channel, Clock, DomainError, Feed, FeedFormat, FeedRepository, FeedSettings,
    FeedStatus, GenerationHistory, QueuedEvent, Schedule, ScheduleInterval, ScheduleRepository,
    StoredArtifact, WebhookDelivery, WebhookEventType, WebhookRepository, WebhookSubscription,
};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

const MAX_RETRY_COUNT: i32 = 10;
const MAX_TIMEOUT_SECONDS: i32 = 300;

/// Partial feed edit
#[derive(Debug, Default)]
pub struct FeedUpdate {
    pub name: Option<String>,
    pub settings: Option<FeedSettings>,
    pub status: Option<FeedStatus>,
}

/// Partial subscription edit. An empty `secret` removes signing.
#[derive(Debug, Default)]
pub struct WebhookUpdate {
    pub url: Option<String>,
    pub secret: Option<String>,
    pub enabled: Option<bool>,
    pub events: Option<Vec<WebhookEventType>>,
    pub retry_count: Option<i32>,
    pub timeout_seconds: Option<i32>,
}

/// Values for subscriptions created without explicit settings
#[derive(Debug, Clone, Copy)]
pub struct WebhookDefaults {
    pub retry_count: i32,
    pub timeout_seconds: i32,
}

pub struct FeedService {
    feeds: Arc<dyn FeedRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    webhooks: Arc<dyn WebhookRepository>,
    artifacts: Arc<dyn ArtifactStore>,
    clock: Arc<dyn Clock>,
    outbox_signal: Arc<Notify>,
    webhook_defaults: WebhookDefaults,
}

impl FeedService {
    pub fn new(
        feeds: Arc<dyn FeedRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        webhooks: Arc<dyn WebhookRepository>,
        artifacts: Arc<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
        outbox_signal: Arc<Notify>,
        webhook_defaults: WebhookDefaults,
    ) -> Self {
        Self {
            feeds,
            schedules,
            webhooks,
            artifacts,
            clock,
            outbox_signal,
            webhook_defaults,
        }
    }

    // --- Feeds ---

    pub async fn create(
        &self,
        tenant_id: Uuid,
        name: String,
        channel: Channel,
        format: FeedFormat,
        settings: FeedSettings,
    ) -> Result<Feed, DomainError> {
        let feed = Feed::new(tenant_id, name, channel, format, settings)?;
        let saved = self.feeds.insert(&feed).await?;
        tracing::info!("Created feed: {} ({}, {})", saved.id, saved.channel, saved.format);
        Ok(saved)
    }

    pub async fn get(&self, id: Uuid) -> Result<Feed, DomainError> {
        self.feeds
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Feed", id))
    }

    /// Edit name, settings or status. Rejected while a run holds the lock.
    pub async fn update(&self, id: Uuid, update: FeedUpdate) -> Result<Feed, DomainError> {
        let current = self.get(id).await?;
        if current.status == FeedStatus::Generating {
            return Err(generating_conflict(id));
        }

        if let Some(status) = update.status {
            if !status.is_user_settable() {
                return Err(DomainError::Validation(format!(
                    "Status '{}' cannot be set directly",
                    status
                )));
            }
        }
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("Feed name cannot be empty".to_string()));
            }
        }
        let settings = match update.settings {
            Some(settings) => settings.validated()?,
            None => current.settings.clone(),
        };

        let edited = Feed {
            name: update.name.unwrap_or_else(|| current.name.clone()),
            settings,
            status: update.status.unwrap_or(current.status),
            ..current
        };

        self.feeds
            .update_config(&edited)
            .await?
            .ok_or_else(|| generating_conflict(id))
    }

    // --- Runs and artifacts ---

    pub async fn history(
        &self,
        feed_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<GenerationHistory>, DomainError> {
        self.get(feed_id).await?;
        self.feeds.list_runs(feed_id, clamp_limit(limit)).await
    }

    pub async fn run(&self, feed_id: Uuid, run_id: Uuid) -> Result<GenerationHistory, DomainError> {
        self.feeds
            .find_run(run_id)
            .await?
            .filter(|run| run.feed_id == feed_id)
            .ok_or_else(|| DomainError::not_found("Run", run_id))
    }

    /// Artifact of the most recent successful run
    pub async fn download(&self, feed_id: Uuid) -> Result<StoredArtifact, DomainError> {
        self.get(feed_id).await?;

        let artifact_ref = self
            .feeds
            .latest_success(feed_id)
            .await?
            .and_then(|run| run.artifact_ref)
            .ok_or_else(|| DomainError::not_found("Artifact", feed_id))?;

        self.artifacts
            .get(&artifact_ref)
            .await?
            .ok_or_else(|| DomainError::not_found_str("Artifact", &artifact_ref))
    }

    // --- Schedule ---

    pub async fn get_schedule(&self, feed_id: Uuid) -> Result<Schedule, DomainError> {
        self.schedules
            .find_by_feed(feed_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Schedule", feed_id))
    }

    /// Create or edit the feed's schedule; creation requires an interval
    pub async fn put_schedule(
        &self,
        feed_id: Uuid,
        enabled: Option<bool>,
        interval: Option<ScheduleInterval>,
    ) -> Result<Schedule, DomainError> {
        self.get(feed_id).await?;
        let now = self.clock.now();

        let schedule = match self.schedules.find_by_feed(feed_id).await? {
            Some(mut schedule) => {
                schedule.apply_update(enabled, interval, now);
                schedule
            }
            None => {
                let interval = interval.ok_or_else(|| {
                    DomainError::Validation("interval_hours is required".to_string())
                })?;
                let mut schedule = Schedule::new(feed_id, interval, now);
                schedule.enabled = enabled.unwrap_or(true);
                schedule
            }
        };

        let saved = self.schedules.save(&schedule).await?;
        tracing::info!(
            "📅 Schedule for feed {}: every {}h, enabled={}, next run {}",
            feed_id,
            saved.interval.hours(),
            saved.enabled,
            saved.next_run_at
        );
        Ok(saved)
    }

    // --- Webhook ---

    pub async fn get_webhook(&self, feed_id: Uuid) -> Result<WebhookSubscription, DomainError> {
        self.webhooks
            .find_by_feed(feed_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Webhook", feed_id))
    }

    /// Create or edit the feed's subscription; creation requires a URL
    pub async fn put_webhook(
        &self,
        feed_id: Uuid,
        update: WebhookUpdate,
    ) -> Result<WebhookSubscription, DomainError> {
        self.get(feed_id).await?;

        let mut subscription = match self.webhooks.find_by_feed(feed_id).await? {
            Some(existing) => existing,
            None => {
                let url = update
                    .url
                    .clone()
                    .ok_or_else(|| DomainError::Validation("url is required".to_string()))?;
                WebhookSubscription::new(
                    feed_id,
                    url,
                    self.webhook_defaults.retry_count,
                    self.webhook_defaults.timeout_seconds,
                )
            }
        };

        if let Some(url) = update.url {
            subscription.url = url;
        }
        if let Some(secret) = update.secret {
            subscription.secret = Some(secret).filter(|s| !s.is_empty());
        }
        if let Some(enabled) = update.enabled {
            subscription.enabled = enabled;
        }
        if let Some(mut events) = update.events {
            events.sort();
            events.dedup();
            subscription.events = events;
        }
        if let Some(retry_count) = update.retry_count {
            subscription.retry_count = retry_count;
        }
        if let Some(timeout_seconds) = update.timeout_seconds {
            subscription.timeout_seconds = timeout_seconds;
        }
        subscription.updated_at = self.clock.now();

        validate_subscription(&subscription)?;
        self.webhooks.save(&subscription).await
    }

    /// Queue a `feed.validated` event through the normal dispatcher
    pub async fn test_webhook(&self, feed_id: Uuid) -> Result<QueuedEvent, DomainError> {
        let feed = self.get(feed_id).await?;
        let subscription = self.get_webhook(feed_id).await?;
        if !subscription.should_receive(WebhookEventType::FeedValidated) {
            return Err(DomainError::Validation(
                "Subscription is disabled or does not receive feed.validated".to_string(),
            ));
        }

        let now = self.clock.now();
        let event = FeedEvent::validated(&feed, now);
        let queued = QueuedEvent {
            id: Uuid::new_v4(),
            subscription_id: subscription.id,
            feed_id,
            event: event.event,
            payload: event.payload,
            attempts: 0,
            next_attempt_at: now,
            created_at: now,
        };
        self.webhooks.enqueue(&queued).await?;
        self.outbox_signal.notify_one();

        tracing::info!("📨 Queued test event {} for feed {}", queued.id, feed_id);
        Ok(queued)
    }

    pub async fn deliveries(
        &self,
        feed_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<WebhookDelivery>, DomainError> {
        let subscription = self.get_webhook(feed_id).await?;
        self.webhooks
            .list_deliveries(subscription.id, clamp_limit(limit))
            .await
    }
}

fn generating_conflict(id: Uuid) -> DomainError {
    DomainError::Conflict(format!("Feed {} is generating and cannot be edited", id))
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

fn validate_subscription(sub: &WebhookSubscription) -> Result<(), DomainError> {
    let url = reqwest::Url::parse(&sub.url)
        .map_err(|e| DomainError::Validation(format!("Invalid webhook url: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DomainError::Validation(
            "Webhook url must use http or https".to_string(),
        ));
    }
    if sub.events.is_empty() {
        return Err(DomainError::Validation("events cannot be empty".to_string()));
    }
    if !(1..=MAX_RETRY_COUNT).contains(&sub.retry_count) {
        return Err(DomainError::Validation(format!(
            "retry_count must be between 1 and {}",
            MAX_RETRY_COUNT
        )));
    }
    if !(1..=MAX_TIMEOUT_SECONDS).contains(&sub.timeout_seconds) {
        return Err(DomainError::Validation(format!(
            "timeout_seconds must be between 1 and {}",
            MAX_TIMEOUT_SECONDS
        )));
    }
    Ok(())
}
