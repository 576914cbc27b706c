//! PostgreSQL implementation of CatalogSource

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use feedgen::domain::metadata_string_list;
use feedgen::{CatalogSource, DomainError, Product};

use super::{db_err, parse_column};

/// Read-only product view filled by upstream connectors
pub struct PgCatalogSource {
    pool: PgPool,
}

impl PgCatalogSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    tenant_id: Uuid,
    external_id: String,
    sku: Option<String>,
    title: String,
    description: String,
    brand: Option<String>,
    category: Option<String>,
    price: Decimal,
    currency: String,
    availability: String,
    images: serde_json::Value,
    metadata: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let images = serde_json::from_value(row.images).unwrap_or_default();
        // Tags and collections live in connector metadata
        let tags = metadata_string_list(&row.metadata, "tags");
        let collections = metadata_string_list(&row.metadata, "collections");

        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            external_id: row.external_id,
            sku: row.sku,
            title: row.title,
            description: row.description,
            brand: row.brand,
            category: row.category,
            price: row.price,
            currency: row.currency,
            availability: parse_column("availability", &row.availability)?,
            images,
            tags,
            collections,
            metadata: row.metadata,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl CatalogSource for PgCatalogSource {
    fn stream_products(&self, tenant_id: Uuid) -> BoxStream<'_, Result<Product, DomainError>> {
        sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, tenant_id, external_id, sku, title, description, brand, category,
                   price, currency, availability, images, metadata, updated_at
            FROM products
            WHERE tenant_id = $1
            ORDER BY updated_at ASC, id ASC
            "#,
        )
        .bind(tenant_id)
        .fetch(&self.pool)
        .map(|row| row.map_err(db_err).and_then(Product::try_from))
        .boxed()
    }

    async fn watermark(&self, tenant_id: Uuid) -> Result<Option<DateTime<Utc>>, DomainError> {
        sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(updated_at) FROM products WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }
}
