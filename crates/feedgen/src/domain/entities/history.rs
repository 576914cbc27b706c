//! GenerationHistory - Append-only record of one pipeline run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reason recorded on runs found open after a crash
pub const ABANDONED_REASON: &str = "abandoned";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationHistory {
    /// Also serves as the run id returned to callers
    pub id: Uuid,
    pub feed_id: Uuid,
    pub status: HistoryStatus,
    pub products_processed: i64,
    pub products_included: i64,
    pub products_excluded: i64,
    pub generation_time_ms: i64,
    pub file_size_bytes: i64,
    pub artifact_ref: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Running,
    Success,
    Failed,
}

/// Counters and measurements of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub products_processed: i64,
    pub products_included: i64,
    pub products_excluded: i64,
    pub generation_time_ms: i64,
    pub file_size_bytes: i64,
}

impl GenerationHistory {
    /// Open a history row for a run that just took the feed lock
    pub fn start(feed_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            feed_id,
            status: HistoryStatus::Running,
            products_processed: 0,
            products_included: 0,
            products_excluded: 0,
            generation_time_ms: 0,
            file_size_bytes: 0,
            artifact_ref: None,
            error_message: None,
            started_at,
            completed_at: None,
        }
    }

    pub fn succeed(mut self, stats: &RunStats, artifact_ref: String, at: DateTime<Utc>) -> Self {
        self.status = HistoryStatus::Success;
        self.apply_stats(stats);
        self.artifact_ref = Some(artifact_ref);
        self.error_message = None;
        self.completed_at = Some(at);
        self
    }

    pub fn fail(mut self, stats: &RunStats, error: String, at: DateTime<Utc>) -> Self {
        self.status = HistoryStatus::Failed;
        self.apply_stats(stats);
        self.error_message = Some(error);
        self.completed_at = Some(at);
        self
    }

    fn apply_stats(&mut self, stats: &RunStats) {
        self.products_processed = stats.products_processed;
        self.products_included = stats.products_included;
        self.products_excluded = stats.products_excluded;
        self.generation_time_ms = stats.generation_time_ms;
        self.file_size_bytes = stats.file_size_bytes;
    }
}

impl std::fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryStatus::Running => write!(f, "running"),
            HistoryStatus::Success => write!(f, "success"),
            HistoryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for HistoryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(HistoryStatus::Running),
            "success" => Ok(HistoryStatus::Success),
            "failed" => Ok(HistoryStatus::Failed),
            _ => Err(format!("Unknown history status: {}", s)),
        }
    }
}
