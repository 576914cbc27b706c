//! PostgreSQL implementation of FeedRepository
//!
//! `feeds.status` is the generation lock. Run completion and failure are
//! single transactions that also fan the event out into `webhook_outbox`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use feedgen::domain::services::FeedEvent;
use feedgen::{
    DomainError, Feed, FeedRepository, FeedStatus, GenerationHistory, HistoryStatus, LockOutcome,
    ReconcileReport,
};

use super::{db_err, parse_column};

pub struct PgFeedRepository {
    pool: PgPool,
}

impl PgFeedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FEED_COLUMNS: &str = "id, tenant_id, name, channel, format, settings, status, \
     products_count, last_generated_at, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct FeedRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    channel: String,
    format: String,
    settings: serde_json::Value,
    status: String,
    products_count: i64,
    last_generated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FeedRow> for Feed {
    type Error = DomainError;

    fn try_from(row: FeedRow) -> Result<Self, Self::Error> {
        let settings = serde_json::from_value(row.settings)
            .map_err(|e| DomainError::Repository(format!("Corrupt feed settings: {}", e)))?;

        Ok(Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            channel: parse_column("channel", &row.channel)?,
            format: parse_column("format", &row.format)?,
            settings,
            status: parse_column("status", &row.status)?,
            products_count: row.products_count,
            last_generated_at: row.last_generated_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    feed_id: Uuid,
    status: String,
    products_processed: i64,
    products_included: i64,
    products_excluded: i64,
    generation_time_ms: i64,
    file_size_bytes: i64,
    artifact_ref: Option<String>,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<HistoryRow> for GenerationHistory {
    type Error = DomainError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            feed_id: row.feed_id,
            status: parse_column("history status", &row.status)?,
            products_processed: row.products_processed,
            products_included: row.products_included,
            products_excluded: row.products_excluded,
            generation_time_ms: row.generation_time_ms,
            file_size_bytes: row.file_size_bytes,
            artifact_ref: row.artifact_ref,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

/// Close a run row with its final status and counters
async fn close_run(
    tx: &mut Transaction<'_, Postgres>,
    run: &GenerationHistory,
) -> Result<(), DomainError> {
    let updated = sqlx::query(
        r#"
        UPDATE generation_history
        SET status = $2, products_processed = $3, products_included = $4,
            products_excluded = $5, generation_time_ms = $6, file_size_bytes = $7,
            artifact_ref = $8, error_message = $9, completed_at = $10
        WHERE id = $1 AND status = 'running'
        "#,
    )
    .bind(run.id)
    .bind(run.status.to_string())
    .bind(run.products_processed)
    .bind(run.products_included)
    .bind(run.products_excluded)
    .bind(run.generation_time_ms)
    .bind(run.file_size_bytes)
    .bind(&run.artifact_ref)
    .bind(&run.error_message)
    .bind(run.completed_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?
    .rows_affected();

    if updated == 0 {
        return Err(DomainError::Conflict(format!(
            "Run {} is not open (already closed or reconciled)",
            run.id
        )));
    }
    Ok(())
}

/// One outbox row per enabled subscription of the feed that receives the event
async fn enqueue_for_subscribers(
    tx: &mut Transaction<'_, Postgres>,
    event: &FeedEvent,
) -> Result<u64, DomainError> {
    let queued = sqlx::query(
        r#"
        INSERT INTO webhook_outbox
            (id, subscription_id, feed_id, event, payload, status, attempts, next_attempt_at, created_at)
        SELECT gen_random_uuid(), s.id, s.feed_id, $2, $3, 'pending', 0, NOW(), NOW()
        FROM webhook_subscriptions s
        WHERE s.feed_id = $1 AND s.enabled AND s.events ? $2
        "#,
    )
    .bind(event.feed_id)
    .bind(event.event.as_str())
    .bind(&event.payload)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?
    .rows_affected();

    Ok(queued)
}

#[async_trait]
impl FeedRepository for PgFeedRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Feed>, DomainError> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {} FROM feeds WHERE id = $1",
            FEED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Feed::try_from).transpose()
    }

    async fn insert(&self, feed: &Feed) -> Result<Feed, DomainError> {
        let settings = serde_json::to_value(&feed.settings)
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        let row = sqlx::query_as::<_, FeedRow>(&format!(
            r#"
            INSERT INTO feeds (id, tenant_id, name, channel, format, settings, status,
                               products_count, last_generated_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            FEED_COLUMNS
        ))
        .bind(feed.id)
        .bind(feed.tenant_id)
        .bind(&feed.name)
        .bind(feed.channel.to_string())
        .bind(feed.format.to_string())
        .bind(&settings)
        .bind(feed.status.to_string())
        .bind(feed.products_count)
        .bind(feed.last_generated_at)
        .bind(feed.created_at)
        .bind(feed.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Feed::try_from(row)
    }

    async fn update_config(&self, feed: &Feed) -> Result<Option<Feed>, DomainError> {
        let settings = serde_json::to_value(&feed.settings)
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        let row = sqlx::query_as::<_, FeedRow>(&format!(
            r#"
            UPDATE feeds
            SET name = $2, settings = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND status <> 'generating'
            RETURNING {}
            "#,
            FEED_COLUMNS
        ))
        .bind(feed.id)
        .bind(&feed.name)
        .bind(&settings)
        .bind(feed.status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Feed::try_from).transpose()
    }

    async fn try_lock(&self, feed_id: Uuid) -> Result<LockOutcome, DomainError> {
        // Row lock in the CTE serializes racing callers; the loser re-reads
        // `generating` and falls through.
        let locked = sqlx::query_as::<_, FeedRow>(
            r#"
            WITH prior AS (
                SELECT id, status FROM feeds WHERE id = $1 FOR UPDATE
            )
            UPDATE feeds f
            SET status = 'generating', updated_at = NOW()
            FROM prior
            WHERE f.id = prior.id AND prior.status IN ('active', 'error', 'paused')
            RETURNING f.id, f.tenant_id, f.name, f.channel, f.format, f.settings,
                      prior.status AS status, f.products_count, f.last_generated_at,
                      f.created_at, f.updated_at
            "#,
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = locked {
            return Ok(LockOutcome::Acquired(Feed::try_from(row)?));
        }

        let status = sqlx::query_scalar::<_, String>("SELECT status FROM feeds WHERE id = $1")
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(match status {
            None => LockOutcome::NotFound,
            Some(raw) => match parse_column::<FeedStatus>("status", &raw)? {
                FeedStatus::Generating => LockOutcome::AlreadyGenerating,
                other => LockOutcome::NotLockable(other),
            },
        })
    }

    async fn release_lock(&self, feed_id: Uuid, status: FeedStatus) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE feeds SET status = $2, updated_at = NOW() WHERE id = $1 AND status = 'generating'",
        )
        .bind(feed_id)
        .bind(status.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn start_run(&self, run: &GenerationHistory) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO generation_history (id, feed_id, status, started_at)
            VALUES ($1, $2, 'running', $3)
            "#,
        )
        .bind(run.id)
        .bind(run.feed_id)
        .bind(run.started_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn complete_run(
        &self,
        run: &GenerationHistory,
        event: &FeedEvent,
    ) -> Result<u64, DomainError> {
        debug_assert_eq!(run.status, HistoryStatus::Success);
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        close_run(&mut tx, run).await?;

        sqlx::query(
            r#"
            UPDATE feeds
            SET status = 'active', products_count = $2, last_generated_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(run.feed_id)
        .bind(run.products_included)
        .bind(run.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let queued = enqueue_for_subscribers(&mut tx, event).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(queued)
    }

    async fn fail_run(
        &self,
        run: &GenerationHistory,
        event: &FeedEvent,
    ) -> Result<u64, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        close_run(&mut tx, run).await?;

        sqlx::query("UPDATE feeds SET status = 'error', updated_at = NOW() WHERE id = $1")
            .bind(run.feed_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let queued = enqueue_for_subscribers(&mut tx, event).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(queued)
    }

    async fn find_run(&self, run_id: Uuid) -> Result<Option<GenerationHistory>, DomainError> {
        let row = sqlx::query_as::<_, HistoryRow>("SELECT * FROM generation_history WHERE id = $1")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(GenerationHistory::try_from).transpose()
    }

    async fn list_runs(
        &self,
        feed_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GenerationHistory>, DomainError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT * FROM generation_history WHERE feed_id = $1 ORDER BY started_at DESC LIMIT $2",
        )
        .bind(feed_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(GenerationHistory::try_from).collect()
    }

    async fn latest_success(
        &self,
        feed_id: Uuid,
    ) -> Result<Option<GenerationHistory>, DomainError> {
        let row = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT * FROM generation_history
            WHERE feed_id = $1 AND status = 'success'
            ORDER BY completed_at DESC
            LIMIT 1
            "#,
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(GenerationHistory::try_from).transpose()
    }

    async fn reconcile_abandoned(&self, reason: &str) -> Result<ReconcileReport, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let runs_abandoned = sqlx::query(
            r#"
            UPDATE generation_history
            SET status = 'failed', error_message = $1, completed_at = NOW()
            WHERE status = 'running'
            "#,
        )
        .bind(reason)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        let feeds_released = sqlx::query(
            "UPDATE feeds SET status = 'error', updated_at = NOW() WHERE status = 'generating'",
        )
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        tx.commit().await.map_err(db_err)?;
        Ok(ReconcileReport {
            feeds_released,
            runs_abandoned,
        })
    }
}
