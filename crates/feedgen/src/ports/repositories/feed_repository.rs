//! Feed Repository Port
//!
//! Feed configuration, the generation lock and the history journal.
//! Run completion and failure are atomic with the webhook outbox enqueue.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::services::FeedEvent;
use crate::domain::{errors::DomainError, Feed, FeedStatus, GenerationHistory};

/// Result of the status compare-and-set
#[derive(Debug, Clone)]
pub enum LockOutcome {
    /// Status moved to `generating`; carries the feed as it was before
    Acquired(Feed),
    AlreadyGenerating,
    /// Pre-image was a state that cannot start a run (e.g. `inactive`)
    NotLockable(FeedStatus),
    NotFound,
}

/// Rows touched by startup reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub feeds_released: u64,
    pub runs_abandoned: u64,
}

/// Repository interface for Feed entities and generation runs
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Find a Feed by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Feed>, DomainError>;

    /// Insert a new Feed
    async fn insert(&self, feed: &Feed) -> Result<Feed, DomainError>;

    /// Update name, settings and status unless a run holds the lock.
    /// Returns `None` when the feed is `generating` or missing.
    async fn update_config(&self, feed: &Feed) -> Result<Option<Feed>, DomainError>;

    // --- Generation lock ---

    /// Atomic `status ∈ {active, error, paused} → generating`
    async fn try_lock(&self, feed_id: Uuid) -> Result<LockOutcome, DomainError>;

    /// Set status back without touching counters (lock release on setup failure)
    async fn release_lock(&self, feed_id: Uuid, status: FeedStatus) -> Result<(), DomainError>;

    // --- Runs ---

    /// Insert the `running` history row
    async fn start_run(&self, run: &GenerationHistory) -> Result<(), DomainError>;

    /// One transaction: history → success, feed counters, status → active,
    /// and one outbox row per subscription receiving `event`.
    /// Returns the number of queued deliveries.
    async fn complete_run(
        &self,
        run: &GenerationHistory,
        event: &FeedEvent,
    ) -> Result<u64, DomainError>;

    /// One transaction: history → failed, status → error, outbox enqueue.
    async fn fail_run(&self, run: &GenerationHistory, event: &FeedEvent)
        -> Result<u64, DomainError>;

    async fn find_run(&self, run_id: Uuid) -> Result<Option<GenerationHistory>, DomainError>;

    /// Newest first
    async fn list_runs(
        &self,
        feed_id: Uuid,
        limit: i64,
    ) -> Result<Vec<GenerationHistory>, DomainError>;

    /// Most recent successful run, if any
    async fn latest_success(&self, feed_id: Uuid)
        -> Result<Option<GenerationHistory>, DomainError>;

    /// Clear leftover `generating` locks and close open runs as failed
    async fn reconcile_abandoned(&self, reason: &str) -> Result<ReconcileReport, DomainError>;
}
