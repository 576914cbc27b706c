//! Product - Normalized catalog item
//!
//! Read-only view of what upstream connectors synced. The core never
//! mutates products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::Availability;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub external_id: String,
    pub sku: Option<String>,
    pub title: String,
    pub description: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub availability: Availability,
    pub images: Vec<String>,
    /// Tags from product metadata (empty when the connector supplied none)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Collections from product metadata (empty when the connector supplied none)
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Identifier published to platforms: the connector's id, else ours
    pub fn feed_item_id(&self) -> String {
        if self.external_id.trim().is_empty() {
            self.id.to_string()
        } else {
            self.external_id.clone()
        }
    }

    /// String value from metadata, ignoring blanks and non-string values
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Landing page: explicit `metadata.url`, else derived from the store URL
    pub fn link(&self, store_url: Option<&str>) -> String {
        if let Some(url) = self.metadata_str("url") {
            return url.to_string();
        }
        match store_url {
            Some(base) if !base.trim().is_empty() => format!(
                "{}/products/{}",
                base.trim().trim_end_matches('/'),
                self.feed_item_id()
            ),
            _ => String::new(),
        }
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn additional_images(&self) -> &[String] {
        self.images.get(1..).unwrap_or(&[])
    }
}

/// Read a string array out of a metadata object (missing or malformed → empty)
pub fn metadata_string_list(metadata: &serde_json::Value, key: &str) -> Vec<String> {
    metadata
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
