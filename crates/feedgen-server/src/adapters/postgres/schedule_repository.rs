//! PostgreSQL implementation of ScheduleRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use feedgen::domain::AUTO_PAUSE_THRESHOLD;
use feedgen::{DomainError, Schedule, ScheduleInterval, ScheduleRepository};

use super::db_err;

pub struct PgScheduleRepository {
    pool: PgPool,
}

impl PgScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    feed_id: Uuid,
    enabled: bool,
    interval_hours: i32,
    next_run_at: DateTime<Utc>,
    last_run_at: Option<DateTime<Utc>>,
    consecutive_failures: i32,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = DomainError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            feed_id: row.feed_id,
            enabled: row.enabled,
            interval: ScheduleInterval::try_from(row.interval_hours)
                .map_err(DomainError::Repository)?,
            next_run_at: row.next_run_at,
            last_run_at: row.last_run_at,
            consecutive_failures: row.consecutive_failures,
            last_error: row.last_error,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn find_by_feed(&self, feed_id: Uuid) -> Result<Option<Schedule>, DomainError> {
        let row = sqlx::query_as::<_, ScheduleRow>("SELECT * FROM feed_schedules WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.map(Schedule::try_from).transpose()
    }

    async fn save(&self, schedule: &Schedule) -> Result<Schedule, DomainError> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            INSERT INTO feed_schedules (feed_id, enabled, interval_hours, next_run_at, last_run_at,
                                        consecutive_failures, last_error, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (feed_id) DO UPDATE
            SET enabled = EXCLUDED.enabled,
                interval_hours = EXCLUDED.interval_hours,
                next_run_at = EXCLUDED.next_run_at,
                last_run_at = EXCLUDED.last_run_at,
                consecutive_failures = EXCLUDED.consecutive_failures,
                last_error = EXCLUDED.last_error,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(schedule.feed_id)
        .bind(schedule.enabled)
        .bind(schedule.interval.hours())
        .bind(schedule.next_run_at)
        .bind(schedule.last_run_at)
        .bind(schedule.consecutive_failures)
        .bind(&schedule.last_error)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Schedule::try_from(row)
    }

    async fn record_run(
        &self,
        feed_id: Uuid,
        at: DateTime<Utc>,
        failure: Option<&str>,
    ) -> Result<Option<Schedule>, DomainError> {
        // Missed windows coalesce; a later next_run_at set by an edit wins
        let row = match failure {
            None => {
                sqlx::query_as::<_, ScheduleRow>(
                    r#"
                    UPDATE feed_schedules
                    SET last_run_at = $2,
                        consecutive_failures = 0,
                        last_error = NULL,
                        next_run_at = GREATEST($2 + make_interval(hours => interval_hours), next_run_at),
                        updated_at = $2
                    WHERE feed_id = $1
                    RETURNING *
                    "#,
                )
                .bind(feed_id)
                .bind(at)
                .fetch_optional(&self.pool)
                .await
            }
            Some(reason) => {
                sqlx::query_as::<_, ScheduleRow>(
                    r#"
                    UPDATE feed_schedules
                    SET consecutive_failures = consecutive_failures + 1,
                        last_error = $3,
                        enabled = enabled AND consecutive_failures + 1 < $4,
                        next_run_at = GREATEST($2 + make_interval(hours => interval_hours), next_run_at),
                        updated_at = $2
                    WHERE feed_id = $1
                    RETURNING *
                    "#,
                )
                .bind(feed_id)
                .bind(at)
                .bind(reason)
                .bind(AUTO_PAUSE_THRESHOLD)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        row.map(Schedule::try_from).transpose()
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Schedule>, DomainError> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT s.*
            FROM feed_schedules s
            JOIN feeds f ON f.id = s.feed_id
            WHERE s.enabled
              AND s.next_run_at <= $1
              AND f.status NOT IN ('generating', 'inactive')
            ORDER BY s.next_run_at ASC, s.feed_id ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Schedule::try_from).collect()
    }
}
