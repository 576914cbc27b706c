//! HTTP Webhook Implementation
//!
//! Delivers webhook bodies to external endpoints using reqwest.

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use std::time::{Duration, Instant};

use feedgen::{AttemptOutcome, WebhookDeliveryConfig, WebhookEventType, WebhookSubscription, WebhookTransport};

pub const EVENT_HEADER: &str = "X-Feed-Event";
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// HTTP implementation of WebhookTransport
pub struct HttpWebhook {
    client: Client,
}

impl HttpWebhook {
    pub fn new() -> Self {
        Self::with_config(WebhookDeliveryConfig::default())
    }

    pub fn with_config(config: WebhookDeliveryConfig) -> Self {
        // Redirects are reported as-is: only 2xx counts as delivered
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl Default for HttpWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhook {
    async fn send(
        &self,
        subscription: &WebhookSubscription,
        event: WebhookEventType,
        body: &[u8],
    ) -> AttemptOutcome {
        let timeout_secs = subscription.timeout_seconds.max(1) as u64;

        let mut request = self
            .client
            .post(&subscription.url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event.as_str())
            .timeout(Duration::from_secs(timeout_secs));

        if let Some(secret) = subscription.secret.as_deref().filter(|s| !s.is_empty()) {
            request = request.header(SIGNATURE_HEADER, self.sign_payload(secret, body));
        }

        let started = Instant::now();
        let response = request.body(body.to_vec()).send().await;
        let response_time_ms = started.elapsed().as_millis() as i64;

        match response {
            Ok(resp) => {
                let status = resp.status();
                let status_code = status.as_u16() as i32;
                let error = (!status.is_success()).then(|| format!("HTTP {}", status_code));
                AttemptOutcome {
                    status_code: Some(status_code),
                    response_time_ms,
                    error,
                }
            }
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("Timed out after {}s", timeout_secs)
                } else if e.is_connect() {
                    format!("Connection failed: {}", e)
                } else {
                    e.to_string()
                };
                AttemptOutcome {
                    status_code: None,
                    response_time_ms,
                    error: Some(message),
                }
            }
        }
    }

    fn sign_payload(&self, secret: &str, payload: &[u8]) -> String {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(payload);
        let bytes = mac.finalize().into_bytes();

        format!("sha256={}", hex::encode(bytes))
    }
}
