//! Catalog Source Port
//!
//! Read-only view of products synced by upstream connectors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::domain::{errors::DomainError, Product};

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Stream a tenant's products ordered by `(updated_at, id)`
    fn stream_products(&self, tenant_id: Uuid) -> BoxStream<'_, Result<Product, DomainError>>;

    /// Latest `updated_at` across the tenant's catalog, `None` when empty
    async fn watermark(&self, tenant_id: Uuid) -> Result<Option<DateTime<Utc>>, DomainError>;
}
