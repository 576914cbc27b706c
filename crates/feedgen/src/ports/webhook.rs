//! Webhook Transport Port
//!
//! Abstract interface for POSTing one event body to one endpoint.
//! Retry policy, journaling and counters belong to the dispatcher; the
//! transport performs exactly one attempt.

use async_trait::async_trait;

use crate::domain::entities::WebhookSubscription;
use crate::domain::value_objects::WebhookEventType;

/// Result of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    /// HTTP status, absent on transport errors and timeouts
    pub status_code: Option<i32>,
    pub response_time_ms: i64,
    /// Transport error or non-2xx description
    pub error: Option<String>,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status_code.is_some_and(|c| (200..300).contains(&c))
    }
}

/// Webhook delivery interface
///
/// Implementations send `body` with `Content-Type: application/json`,
/// `X-Feed-Event` and, when the subscription has a secret, an
/// `X-Signature: sha256=<hex>` header. The subscription's
/// `timeout_seconds` bounds the whole attempt.
///
/// # Example
///
/// ```rust,ignore
/// use feedgen::ports::WebhookTransport;
///
/// struct HttpWebhook { /* reqwest client */ }
///
/// #[async_trait]
/// impl WebhookTransport for HttpWebhook {
///     async fn send(&self, sub: &WebhookSubscription, event: WebhookEventType, body: &[u8])
///         -> AttemptOutcome
///     {
///         // POST with HMAC signature
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Perform one delivery attempt. Never fails: every problem is an outcome.
    async fn send(
        &self,
        subscription: &WebhookSubscription,
        event: WebhookEventType,
        body: &[u8],
    ) -> AttemptOutcome;

    /// Generate HMAC-SHA256 signature for a payload (`sha256=<hex>`)
    fn sign_payload(&self, secret: &str, payload: &[u8]) -> String;
}

/// HTTP client settings for webhook delivery. Retry pacing lives with the
/// dispatcher.
#[derive(Debug, Clone)]
pub struct WebhookDeliveryConfig {
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for WebhookDeliveryConfig {
    fn default() -> Self {
        Self {
            user_agent: "Feedgen-Webhook/1.0".to_string(),
        }
    }
}
