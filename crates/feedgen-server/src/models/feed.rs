//! Feed DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use feedgen::{Feed, FeedSettings};

/// Create feed request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFeedRequest {
    /// Catalog owner whose products feed this feed
    pub tenant_id: Uuid,
    pub name: String,
    /// `google-shopping`, `facebook-catalog` or `instagram-shopping`
    pub channel: String,
    /// `xml`, `csv` or `json` (must match the channel)
    pub format: String,
    /// Filter spec, store URL, description and transformations
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Value>,
}

/// Update feed request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateFeedRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub settings: Option<serde_json::Value>,
    /// `active`, `inactive` or `paused`
    pub status: Option<String>,
}

/// Feed response
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub channel: String,
    pub format: String,
    #[schema(value_type = Object)]
    pub settings: serde_json::Value,
    pub status: String,
    pub products_count: i64,
    pub last_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedResponse {
    pub fn from_domain(feed: Feed) -> Self {
        Self {
            id: feed.id,
            tenant_id: feed.tenant_id,
            name: feed.name,
            channel: feed.channel.to_string(),
            format: feed.format.to_string(),
            settings: serde_json::to_value(&feed.settings).unwrap_or_default(),
            status: feed.status.to_string(),
            products_count: feed.products_count,
            last_generated_at: feed.last_generated_at,
            created_at: feed.created_at,
            updated_at: feed.updated_at,
        }
    }
}

/// Decode the free-form settings object
pub fn parse_settings(raw: serde_json::Value) -> Result<FeedSettings, String> {
    serde_json::from_value(raw).map_err(|e| format!("Invalid settings: {}", e))
}
