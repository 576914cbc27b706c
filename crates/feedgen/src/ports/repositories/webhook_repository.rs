//! Webhook Repository Port
//!
//! Subscriptions, the durable outbox and the delivery journal.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{DeliveryStatus, QueuedEvent, WebhookDelivery, WebhookSubscription};
use crate::domain::errors::DomainError;

/// Repository interface for webhook subscriptions and deliveries
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Find the subscription of a feed
    async fn find_by_feed(&self, feed_id: Uuid) -> Result<Option<WebhookSubscription>, DomainError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookSubscription>, DomainError>;

    /// Save a subscription (insert or update, one per feed)
    async fn save(&self, subscription: &WebhookSubscription)
        -> Result<WebhookSubscription, DomainError>;

    // --- Outbox ---

    /// Queue an event outside a generation run
    async fn enqueue(&self, event: &QueuedEvent) -> Result<(), DomainError>;

    /// Move up to `limit` pending events due at `now` to in-flight
    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<QueuedEvent>, DomainError>;

    /// Journal one attempt and checkpoint the event's attempt count and
    /// earliest next attempt
    async fn record_attempt(
        &self,
        delivery: &WebhookDelivery,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Close an event and bump the subscription counters for its outcome
    async fn finish(&self, event: &QueuedEvent, status: DeliveryStatus) -> Result<(), DomainError>;

    /// Return in-flight events to pending after a crash
    async fn release_in_flight(&self) -> Result<u64, DomainError>;

    // --- Journal ---

    /// Newest first
    async fn list_deliveries(
        &self,
        subscription_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookDelivery>, DomainError>;
}
