//! Feed - Declarative generation unit for one downstream channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::Product;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::{Channel, FeedFormat, FeedTarget, FilterSpec};

/// Feed configuration owned by the control plane, mutated by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub channel: Channel,
    pub format: FeedFormat,
    pub settings: FeedSettings,
    pub status: FeedStatus,
    pub products_count: i64,
    pub last_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Feed lifecycle state. `Generating` doubles as the per-feed run lock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    #[default]
    Active,
    Inactive,
    Generating,
    Error,
    Paused,
}

/// Filter spec plus presentation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeedSettings {
    #[serde(default)]
    pub filter: FilterSpec,
    /// Storefront base URL used for `<link>` and derived product links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,
    /// Channel description written into the feed header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub transformations: Transformations,
}

/// Per-record rewrites applied after filtering
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transformations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_suffix: Option<String>,
    /// Brand used when the product has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_brand: Option<String>,
}

impl Feed {
    /// Create a feed, rejecting unsupported channel/format pairs and bad filters
    pub fn new(
        tenant_id: Uuid,
        name: String,
        channel: Channel,
        format: FeedFormat,
        settings: FeedSettings,
    ) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("Feed name cannot be empty".to_string()));
        }
        FeedTarget::resolve(channel, format)?;
        let settings = settings.validated()?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            channel,
            format,
            settings,
            status: FeedStatus::Active,
            products_count: 0,
            last_generated_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Serializer target for this feed
    pub fn target(&self) -> Result<FeedTarget, DomainError> {
        FeedTarget::resolve(self.channel, self.format)
    }
}

impl FeedSettings {
    /// Validate the filter and normalize empty inclusion sets
    pub fn validated(mut self) -> Result<Self, DomainError> {
        self.filter.validate()?;
        self.filter = self.filter.normalized();
        Ok(self)
    }

    /// Apply configured rewrites to an accepted product
    pub fn transform(&self, mut product: Product) -> Product {
        let t = &self.transformations;
        if let Some(prefix) = &t.title_prefix {
            product.title = format!("{}{}", prefix, product.title);
        }
        if let Some(suffix) = &t.title_suffix {
            product.title.push_str(suffix);
        }
        if product.brand.as_deref().map_or(true, |b| b.trim().is_empty()) {
            if let Some(brand) = &t.default_brand {
                product.brand = Some(brand.clone());
            }
        }
        product
    }
}

impl FeedStatus {
    /// States from which the generation lock may be taken
    pub fn can_start_generation(&self) -> bool {
        matches!(self, Self::Active | Self::Error | Self::Paused)
    }

    /// States the control plane may set directly
    pub fn is_user_settable(&self) -> bool {
        matches!(self, Self::Active | Self::Inactive | Self::Paused)
    }
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedStatus::Active => write!(f, "active"),
            FeedStatus::Inactive => write!(f, "inactive"),
            FeedStatus::Generating => write!(f, "generating"),
            FeedStatus::Error => write!(f, "error"),
            FeedStatus::Paused => write!(f, "paused"),
        }
    }
}

impl std::str::FromStr for FeedStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(FeedStatus::Active),
            "inactive" => Ok(FeedStatus::Inactive),
            "generating" => Ok(FeedStatus::Generating),
            "error" => Ok(FeedStatus::Error),
            "paused" => Ok(FeedStatus::Paused),
            _ => Err(format!("Unknown feed status: {}", s)),
        }
    }
}
