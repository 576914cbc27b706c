//! Schedule Repository Port

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{errors::DomainError, Schedule};

/// Repository interface for Schedule entities
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn find_by_feed(&self, feed_id: Uuid) -> Result<Option<Schedule>, DomainError>;

    /// Save a schedule (insert or update, keyed by feed)
    async fn save(&self, schedule: &Schedule) -> Result<Schedule, DomainError>;

    /// Fold a finished run into the stored schedule (`failure` is `None` on
    /// success). Applied to the current row in one step, so edits made while
    /// the run was in flight are kept. Returns `None` when the schedule is gone.
    async fn record_run(
        &self,
        feed_id: Uuid,
        at: DateTime<Utc>,
        failure: Option<&str>,
    ) -> Result<Option<Schedule>, DomainError>;

    /// Enabled schedules with `next_run_at <= now` whose feed is not
    /// generating, ordered by `(next_run_at, feed_id)`
    async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Schedule>, DomainError>;
}
