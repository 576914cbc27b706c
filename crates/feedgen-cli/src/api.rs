//! Feedgen API Client

use anyhow::{bail, Context, Result};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// API Client for Feedgen
pub struct FeedgenClient {
    client: Client,
    base_url: String,
    api_key: String,
}

// ============================================
// API Response Types
// ============================================

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateResponse {
    pub run_id: Uuid,
    pub feed_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    pub id: Uuid,
    pub status: String,
    pub products_processed: i64,
    pub products_included: i64,
    pub products_excluded: i64,
    pub generation_time_ms: i64,
    pub file_size_bytes: i64,
    pub error_message: Option<String>,
    pub started_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RunScheduledResponse {
    pub dispatched: usize,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleResponse {
    pub enabled: bool,
    pub interval_hours: i32,
    pub next_run_at: String,
    pub last_run_at: Option<String>,
    pub consecutive_failures: i32,
    pub last_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PutScheduleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookResponse {
    pub url: String,
    pub signed: bool,
    pub enabled: bool,
    pub events: Vec<String>,
    pub retry_count: i32,
    pub timeout_seconds: i32,
    pub total_deliveries: i64,
    pub successful_deliveries: i64,
    pub failed_deliveries: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct PutWebhookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookTestResponse {
    pub event_id: Uuid,
    pub event: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryResponse {
    pub event: String,
    pub attempt: i32,
    pub status_code: Option<i32>,
    pub response_time_ms: Option<i64>,
    pub success: bool,
    pub error_message: Option<String>,
    pub delivered_at: String,
}

/// A feed body plus the name the server suggests for it
pub struct FeedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FeedgenClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Test connection with health check
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    pub async fn regenerate(&self, feed_id: Uuid) -> Result<RegenerateResponse> {
        let path = format!("/feeds/{}/regenerate", feed_id);
        self.json(self.request(reqwest::Method::POST, &path)).await
    }

    pub async fn run(&self, feed_id: Uuid, run_id: Uuid) -> Result<RunResponse> {
        let path = format!("/feeds/{}/runs/{}", feed_id, run_id);
        self.json(self.request(reqwest::Method::GET, &path)).await
    }

    pub async fn history(&self, feed_id: Uuid, limit: Option<i64>) -> Result<Vec<RunResponse>> {
        let path = format!("/feeds/{}/history", feed_id);
        let mut req = self.request(reqwest::Method::GET, &path);
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        self.json(req).await
    }

    pub async fn download(&self, feed_id: Uuid) -> Result<FeedFile> {
        let path = format!("/feeds/{}/download", feed_id);
        self.file(self.request(reqwest::Method::GET, &path)).await
    }

    pub async fn preview(&self, feed_id: Uuid, max_products: Option<usize>) -> Result<FeedFile> {
        let path = format!("/feeds/{}/preview", feed_id);
        let mut req = self.request(reqwest::Method::GET, &path);
        if let Some(max) = max_products {
            req = req.query(&[("max_products", max)]);
        }
        self.file(req).await
    }

    pub async fn run_scheduled(&self) -> Result<RunScheduledResponse> {
        self.json(self.request(reqwest::Method::POST, "/feeds/run-scheduled"))
            .await
    }

    pub async fn get_schedule(&self, feed_id: Uuid) -> Result<ScheduleResponse> {
        let path = format!("/feeds/{}/schedule", feed_id);
        self.json(self.request(reqwest::Method::GET, &path)).await
    }

    pub async fn put_schedule(
        &self,
        feed_id: Uuid,
        request: &PutScheduleRequest,
    ) -> Result<ScheduleResponse> {
        let path = format!("/feeds/{}/schedule", feed_id);
        self.json(self.request(reqwest::Method::PUT, &path).json(request))
            .await
    }

    pub async fn get_webhook(&self, feed_id: Uuid) -> Result<WebhookResponse> {
        let path = format!("/feeds/{}/webhook", feed_id);
        self.json(self.request(reqwest::Method::GET, &path)).await
    }

    pub async fn put_webhook(
        &self,
        feed_id: Uuid,
        request: &PutWebhookRequest,
    ) -> Result<WebhookResponse> {
        let path = format!("/feeds/{}/webhook", feed_id);
        self.json(self.request(reqwest::Method::PUT, &path).json(request))
            .await
    }

    pub async fn test_webhook(&self, feed_id: Uuid) -> Result<WebhookTestResponse> {
        let path = format!("/feeds/{}/webhook/test", feed_id);
        self.json(self.request(reqwest::Method::POST, &path)).await
    }

    pub async fn deliveries(
        &self,
        feed_id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<DeliveryResponse>> {
        let path = format!("/feeds/{}/webhook/deliveries", feed_id);
        let mut req = self.request(reqwest::Method::GET, &path);
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        self.json(req).await
    }

    // ============================================
    // Plumbing
    // ============================================

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await.context("Failed to connect to Feedgen API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => bail!("API error ({}): {} [{}]", status, err.message, err.code),
                Err(_) => bail!("API error ({}): {}", status, body),
            }
        }

        Ok(resp)
    }

    async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req).await?;
        resp.json().await.context("Failed to parse response")
    }

    async fn file(&self, req: RequestBuilder) -> Result<FeedFile> {
        let resp = self.send(req).await?;
        let headers = resp.headers();
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(attachment_filename);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let data = resp.bytes().await.context("Failed to read feed body")?.to_vec();

        Ok(FeedFile {
            filename,
            content_type,
            data,
        })
    }
}

/// `attachment; filename="x.xml"` -> `x.xml`
fn attachment_filename(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty() && !name.contains('/'))
}
