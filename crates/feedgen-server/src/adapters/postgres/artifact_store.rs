//! PostgreSQL implementation of ArtifactStore
//!
//! Feed files are kept as `BYTEA` rows keyed by `<feed_id>/<run_id>.<ext>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use feedgen::{ArtifactStore, DomainError, FeedFormat, StoredArtifact};

use super::{db_err, parse_column};

pub struct PgArtifactStore {
    pool: PgPool,
}

impl PgArtifactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ArtifactRow {
    artifact_ref: String,
    feed_id: Uuid,
    run_id: Uuid,
    format: String,
    data: Vec<u8>,
    created_at: DateTime<Utc>,
}

#[async_trait]
impl ArtifactStore for PgArtifactStore {
    async fn put(
        &self,
        feed_id: Uuid,
        run_id: Uuid,
        format: FeedFormat,
        data: Vec<u8>,
    ) -> Result<String, DomainError> {
        let artifact_ref = format!("{}/{}.{}", feed_id, run_id, format.extension());

        sqlx::query(
            r#"
            INSERT INTO feed_artifacts (artifact_ref, feed_id, run_id, format, data)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&artifact_ref)
        .bind(feed_id)
        .bind(run_id)
        .bind(format.to_string())
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(artifact_ref)
    }

    async fn get(&self, artifact_ref: &str) -> Result<Option<StoredArtifact>, DomainError> {
        let row = sqlx::query_as::<_, ArtifactRow>(
            "SELECT * FROM feed_artifacts WHERE artifact_ref = $1",
        )
        .bind(artifact_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| {
            Ok(StoredArtifact {
                artifact_ref: row.artifact_ref,
                feed_id: row.feed_id,
                run_id: row.run_id,
                format: parse_column("format", &row.format)?,
                data: row.data,
                created_at: row.created_at,
            })
        })
        .transpose()
    }
}
