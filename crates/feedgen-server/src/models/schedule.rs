//! Schedule DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use feedgen::Schedule;

/// Create or update a schedule
#[derive(Debug, Deserialize, ToSchema)]
pub struct PutScheduleRequest {
    pub enabled: Option<bool>,
    /// One of 1, 6, 12, 24, 168. Required when creating.
    pub interval_hours: Option<i32>,
}

/// Schedule response
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub feed_id: Uuid,
    pub enabled: bool,
    pub interval_hours: i32,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub consecutive_failures: i32,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleResponse {
    pub fn from_domain(schedule: Schedule) -> Self {
        Self {
            feed_id: schedule.feed_id,
            enabled: schedule.enabled,
            interval_hours: schedule.interval.hours(),
            next_run_at: schedule.next_run_at,
            last_run_at: schedule.last_run_at,
            consecutive_failures: schedule.consecutive_failures,
            last_error: schedule.last_error,
            updated_at: schedule.updated_at,
        }
    }
}
