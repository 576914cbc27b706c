//! Webhook - Outbound notifications for feed events
//!
//! A feed owns at most one subscription. Events produced by the pipeline
//! are queued durably (`QueuedEvent`) and every delivery attempt is
//! journaled (`WebhookDelivery`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::WebhookEventType;

/// Default number of attempts per event
pub const DEFAULT_RETRY_COUNT: i32 = 3;
/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT_SECONDS: i32 = 30;

/// Webhook target for one feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub feed_id: Uuid,
    /// Target URL for webhook delivery
    pub url: String,
    /// Secret for HMAC-SHA256 signature (optional)
    pub secret: Option<String>,
    pub enabled: bool,
    /// Event types this subscription receives
    pub events: Vec<WebhookEventType>,
    /// Total attempts per event, including the first
    pub retry_count: i32,
    pub timeout_seconds: i32,
    pub total_deliveries: i64,
    pub successful_deliveries: i64,
    pub failed_deliveries: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An event waiting in the durable outbox
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub feed_id: Uuid,
    pub event: WebhookEventType,
    /// Exact JSON body to POST
    pub payload: Vec<u8>,
    /// Attempts already made
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Journal row: exactly one per delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub feed_id: Uuid,
    /// Outbox event this attempt belongs to
    pub event_id: Uuid,
    pub event: WebhookEventType,
    pub payload: Vec<u8>,
    pub attempt: i32,
    pub status_code: Option<i32>,
    pub response_time_ms: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Final state of a queued event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InFlight,
    Delivered,
    Failed,
    Dropped,
}

impl WebhookSubscription {
    /// Create a subscription with the given defaults for retries and timeout
    pub fn new(feed_id: Uuid, url: String, retry_count: i32, timeout_seconds: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            feed_id,
            url,
            secret: None,
            enabled: true,
            events: vec![WebhookEventType::FeedGenerated, WebhookEventType::FeedFailed],
            retry_count,
            timeout_seconds,
            total_deliveries: 0,
            successful_deliveries: 0,
            failed_deliveries: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create with a signing secret for HMAC-SHA256 verification
    pub fn with_secret(mut self, secret: String) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Set specific event types to subscribe to
    pub fn with_events(mut self, events: Vec<WebhookEventType>) -> Self {
        self.events = events;
        self
    }

    /// Check if this subscription should receive a given event type
    pub fn should_receive(&self, event: WebhookEventType) -> bool {
        self.enabled && self.events.contains(&event)
    }

    /// Backoff before attempt `attempt + 1`: `base * 2^(attempt-1)`
    pub fn retry_delay(attempt: i32, base: std::time::Duration) -> std::time::Duration {
        let exponent = (attempt.max(1) - 1).min(16) as u32;
        base * 2u32.pow(exponent)
    }
}

impl WebhookDelivery {
    /// Journal row for one attempt of a queued event
    pub fn attempt(
        queued: &QueuedEvent,
        attempt: i32,
        status_code: Option<i32>,
        response_time_ms: i64,
        error_message: Option<String>,
        delivered_at: DateTime<Utc>,
    ) -> Self {
        let success = error_message.is_none() && status_code.is_some_and(|c| (200..300).contains(&c));
        Self {
            id: Uuid::new_v4(),
            subscription_id: queued.subscription_id,
            feed_id: queued.feed_id,
            event_id: queued.id,
            event: queued.event,
            payload: queued.payload.clone(),
            attempt,
            status_code,
            response_time_ms: Some(response_time_ms),
            success,
            error_message,
            delivered_at,
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::InFlight => write!(f, "in_flight"),
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Failed => write!(f, "failed"),
            DeliveryStatus::Dropped => write!(f, "dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_should_receive_respects_enabled_and_events() {
        let mut sub = WebhookSubscription::new(Uuid::new_v4(), "http://x".into(), 3, 30)
            .with_events(vec![WebhookEventType::FeedFailed]);
        assert!(sub.should_receive(WebhookEventType::FeedFailed));
        assert!(!sub.should_receive(WebhookEventType::FeedGenerated));
        sub.enabled = false;
        assert!(!sub.should_receive(WebhookEventType::FeedFailed));
    }

    #[test]
    fn test_retry_delay_doubles() {
        let base = Duration::from_secs(1);
        assert_eq!(WebhookSubscription::retry_delay(1, base), Duration::from_secs(1));
        assert_eq!(WebhookSubscription::retry_delay(2, base), Duration::from_secs(2));
        assert_eq!(WebhookSubscription::retry_delay(3, base), Duration::from_secs(4));
    }

    #[test]
    fn test_attempt_success_classification() {
        let queued = QueuedEvent {
            id: Uuid::new_v4(),
            subscription_id: Uuid::new_v4(),
            feed_id: Uuid::new_v4(),
            event: WebhookEventType::FeedGenerated,
            payload: b"{}".to_vec(),
            attempts: 0,
            next_attempt_at: Utc::now(),
            created_at: Utc::now(),
        };
        assert!(WebhookDelivery::attempt(&queued, 1, Some(204), 5, None, Utc::now()).success);
        assert!(!WebhookDelivery::attempt(&queued, 1, Some(500), 5, None, Utc::now()).success);
        assert!(!WebhookDelivery::attempt(&queued, 1, None, 5, Some("timeout".into()), Utc::now()).success);
    }
}
