//! PostgreSQL implementation of WebhookRepository
//!
//! Subscriptions, the durable outbox (`webhook_outbox`) and the append-only
//! delivery journal (`webhook_deliveries`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use feedgen::{
    DeliveryStatus, DomainError, QueuedEvent, WebhookDelivery, WebhookEventType, WebhookRepository,
    WebhookSubscription,
};

use super::{db_err, parse_column};

pub struct PgWebhookRepository {
    pool: PgPool,
}

impl PgWebhookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    feed_id: Uuid,
    url: String,
    secret: Option<String>,
    enabled: bool,
    events: serde_json::Value,
    retry_count: i32,
    timeout_seconds: i32,
    total_deliveries: i64,
    successful_deliveries: i64,
    failed_deliveries: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubscriptionRow> for WebhookSubscription {
    fn from(row: SubscriptionRow) -> Self {
        let events: Vec<WebhookEventType> = serde_json::from_value(row.events).unwrap_or_else(|_| {
            vec![WebhookEventType::FeedGenerated, WebhookEventType::FeedFailed]
        });

        Self {
            id: row.id,
            feed_id: row.feed_id,
            url: row.url,
            secret: row.secret,
            enabled: row.enabled,
            events,
            retry_count: row.retry_count,
            timeout_seconds: row.timeout_seconds,
            total_deliveries: row.total_deliveries,
            successful_deliveries: row.successful_deliveries,
            failed_deliveries: row.failed_deliveries,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OutboxRow {
    id: Uuid,
    subscription_id: Uuid,
    feed_id: Uuid,
    event: String,
    payload: Vec<u8>,
    attempts: i32,
    next_attempt_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<OutboxRow> for QueuedEvent {
    type Error = DomainError;

    fn try_from(row: OutboxRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            subscription_id: row.subscription_id,
            feed_id: row.feed_id,
            event: parse_column("event", &row.event)?,
            payload: row.payload,
            attempts: row.attempts,
            next_attempt_at: row.next_attempt_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    subscription_id: Uuid,
    feed_id: Uuid,
    event_id: Uuid,
    event: String,
    payload: Vec<u8>,
    attempt: i32,
    status_code: Option<i32>,
    response_time_ms: Option<i64>,
    success: bool,
    error_message: Option<String>,
    delivered_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRow> for WebhookDelivery {
    type Error = DomainError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            subscription_id: row.subscription_id,
            feed_id: row.feed_id,
            event_id: row.event_id,
            event: parse_column("event", &row.event)?,
            payload: row.payload,
            attempt: row.attempt,
            status_code: row.status_code,
            response_time_ms: row.response_time_ms,
            success: row.success,
            error_message: row.error_message,
            delivered_at: row.delivered_at,
        })
    }
}

#[async_trait]
impl WebhookRepository for PgWebhookRepository {
    async fn find_by_feed(&self, feed_id: Uuid) -> Result<Option<WebhookSubscription>, DomainError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT * FROM webhook_subscriptions WHERE feed_id = $1",
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookSubscription>, DomainError> {
        let row =
            sqlx::query_as::<_, SubscriptionRow>("SELECT * FROM webhook_subscriptions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    async fn save(
        &self,
        subscription: &WebhookSubscription,
    ) -> Result<WebhookSubscription, DomainError> {
        let events_json = serde_json::to_value(&subscription.events)
            .map_err(|e| DomainError::Repository(e.to_string()))?;

        // Counters are owned by the dispatcher and never overwritten here
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO webhook_subscriptions (id, feed_id, url, secret, enabled, events,
                                               retry_count, timeout_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (feed_id) DO UPDATE
            SET url = EXCLUDED.url,
                secret = EXCLUDED.secret,
                enabled = EXCLUDED.enabled,
                events = EXCLUDED.events,
                retry_count = EXCLUDED.retry_count,
                timeout_seconds = EXCLUDED.timeout_seconds,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.feed_id)
        .bind(&subscription.url)
        .bind(&subscription.secret)
        .bind(subscription.enabled)
        .bind(&events_json)
        .bind(subscription.retry_count)
        .bind(subscription.timeout_seconds)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn enqueue(&self, event: &QueuedEvent) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_outbox
                (id, subscription_id, feed_id, event, payload, status, attempts, next_attempt_at, created_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.subscription_id)
        .bind(event.feed_id)
        .bind(event.event.as_str())
        .bind(&event.payload)
        .bind(event.attempts)
        .bind(event.next_attempt_at)
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<QueuedEvent>, DomainError> {
        let rows = sqlx::query_as::<_, OutboxRow>(
            r#"
            UPDATE webhook_outbox
            SET status = 'in_flight'
            WHERE id IN (
                SELECT id FROM webhook_outbox
                WHERE status = 'pending' AND next_attempt_at <= $1
                ORDER BY next_attempt_at ASC, created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, subscription_id, feed_id, event, payload, attempts,
                      next_attempt_at, created_at
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut events = rows
            .into_iter()
            .map(QueuedEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        events.sort_by_key(|e| (e.next_attempt_at, e.created_at));
        Ok(events)
    }

    async fn record_attempt(
        &self,
        delivery: &WebhookDelivery,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (id, subscription_id, feed_id, event_id, event, payload,
                                            attempt, status_code, response_time_ms, success,
                                            error_message, delivered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(delivery.id)
        .bind(delivery.subscription_id)
        .bind(delivery.feed_id)
        .bind(delivery.event_id)
        .bind(delivery.event.as_str())
        .bind(&delivery.payload)
        .bind(delivery.attempt)
        .bind(delivery.status_code)
        .bind(delivery.response_time_ms)
        .bind(delivery.success)
        .bind(&delivery.error_message)
        .bind(delivery.delivered_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("UPDATE webhook_outbox SET attempts = $2, next_attempt_at = $3 WHERE id = $1")
            .bind(delivery.event_id)
            .bind(delivery.attempt)
            .bind(next_attempt_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn finish(&self, event: &QueuedEvent, status: DeliveryStatus) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("UPDATE webhook_outbox SET status = $2, completed_at = NOW() WHERE id = $1")
            .bind(event.id)
            .bind(status.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let counters = match status {
            DeliveryStatus::Delivered => Some((1_i64, 0_i64)),
            DeliveryStatus::Failed => Some((0, 1)),
            _ => None,
        };
        if let Some((successful, failed)) = counters {
            sqlx::query(
                r#"
                UPDATE webhook_subscriptions
                SET total_deliveries = total_deliveries + 1,
                    successful_deliveries = successful_deliveries + $2,
                    failed_deliveries = failed_deliveries + $3
                WHERE id = $1
                "#,
            )
            .bind(event.subscription_id)
            .bind(successful)
            .bind(failed)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn release_in_flight(&self) -> Result<u64, DomainError> {
        let released =
            sqlx::query("UPDATE webhook_outbox SET status = 'pending' WHERE status = 'in_flight'")
                .execute(&self.pool)
                .await
                .map_err(db_err)?
                .rows_affected();
        Ok(released)
    }

    async fn list_deliveries(
        &self,
        subscription_id: Uuid,
        limit: i64,
    ) -> Result<Vec<WebhookDelivery>, DomainError> {
        let rows = sqlx::query_as::<_, DeliveryRow>(
            r#"
            SELECT * FROM webhook_deliveries
            WHERE subscription_id = $1
            ORDER BY delivered_at DESC, attempt DESC
            LIMIT $2
            "#,
        )
        .bind(subscription_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(WebhookDelivery::try_from).collect()
    }
}
