//! Webhook DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use feedgen::{QueuedEvent, WebhookDelivery, WebhookEventType, WebhookSubscription};

/// Create or update the feed's webhook
#[derive(Debug, Deserialize, ToSchema)]
pub struct PutWebhookRequest {
    /// Target URL for webhook delivery. Required when creating.
    pub url: Option<String>,
    /// Secret for HMAC-SHA256 signature; empty string removes it
    pub secret: Option<String>,
    pub enabled: Option<bool>,
    /// Subset of `feed.generated`, `feed.failed`, `feed.validated`
    pub events: Option<Vec<String>>,
    /// Total attempts per event (1-10)
    pub retry_count: Option<i32>,
    /// Per-attempt timeout in seconds (1-300)
    pub timeout_seconds: Option<i32>,
}

/// Webhook response
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookResponse {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub url: String,
    /// Whether payloads are signed; the secret itself is never returned
    pub signed: bool,
    pub enabled: bool,
    pub events: Vec<String>,
    pub retry_count: i32,
    pub timeout_seconds: i32,
    pub total_deliveries: i64,
    pub successful_deliveries: i64,
    pub failed_deliveries: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One journaled delivery attempt
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookDeliveryResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub event: String,
    pub attempt: i32,
    pub status_code: Option<i32>,
    pub response_time_ms: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Queued test event
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookTestResponse {
    pub event_id: Uuid,
    pub event: String,
    pub status: String,
}

impl WebhookResponse {
    pub fn from_domain(sub: WebhookSubscription) -> Self {
        Self {
            id: sub.id,
            feed_id: sub.feed_id,
            url: sub.url,
            signed: sub.secret.is_some(),
            enabled: sub.enabled,
            events: sub.events.iter().map(|e| e.to_string()).collect(),
            retry_count: sub.retry_count,
            timeout_seconds: sub.timeout_seconds,
            total_deliveries: sub.total_deliveries,
            successful_deliveries: sub.successful_deliveries,
            failed_deliveries: sub.failed_deliveries,
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

impl WebhookDeliveryResponse {
    pub fn from_domain(delivery: WebhookDelivery) -> Self {
        Self {
            id: delivery.id,
            event_id: delivery.event_id,
            event: delivery.event.to_string(),
            attempt: delivery.attempt,
            status_code: delivery.status_code,
            response_time_ms: delivery.response_time_ms,
            success: delivery.success,
            error_message: delivery.error_message,
            delivered_at: delivery.delivered_at,
        }
    }
}

impl WebhookTestResponse {
    pub fn from_domain(event: QueuedEvent) -> Self {
        Self {
            event_id: event.id,
            event: event.event.to_string(),
            status: "queued".to_string(),
        }
    }
}

/// Parse event names, rejecting unknown ones
pub fn parse_event_types(events: Vec<String>) -> Result<Vec<WebhookEventType>, String> {
    events.iter().map(|e| e.parse()).collect()
}
