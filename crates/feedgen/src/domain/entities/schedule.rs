//! Schedule - Per-feed automation with failure-driven auto-pause

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::ScheduleInterval;

/// Consecutive failures after which a schedule disables itself
pub const AUTO_PAUSE_THRESHOLD: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub feed_id: Uuid,
    pub enabled: bool,
    pub interval: ScheduleInterval,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub consecutive_failures: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// New enabled schedule; first run one interval from now
    pub fn new(feed_id: Uuid, interval: ScheduleInterval, now: DateTime<Utc>) -> Self {
        Self {
            feed_id,
            enabled: true,
            interval,
            next_run_at: now + interval.as_duration(),
            last_run_at: None,
            consecutive_failures: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run_at <= now
    }

    /// Missed windows coalesce: the next run is always one interval from now
    fn advance(&mut self, now: DateTime<Utc>) {
        self.next_run_at = (now + self.interval.as_duration()).max(self.next_run_at);
        self.updated_at = now;
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_run_at = Some(now);
        self.consecutive_failures = 0;
        self.last_error = None;
        self.advance(now);
    }

    /// Returns `true` when this failure auto-paused the schedule
    pub fn record_failure(&mut self, now: DateTime<Utc>, reason: String) -> bool {
        self.consecutive_failures += 1;
        self.last_error = Some(reason);
        self.advance(now);

        if self.enabled && self.consecutive_failures >= AUTO_PAUSE_THRESHOLD {
            self.enabled = false;
            return true;
        }
        false
    }

    /// Apply a control-plane edit
    pub fn apply_update(
        &mut self,
        enabled: Option<bool>,
        interval: Option<ScheduleInterval>,
        now: DateTime<Utc>,
    ) {
        let interval_changed = interval.is_some_and(|i| i != self.interval);
        if let Some(interval) = interval {
            self.interval = interval;
        }

        let re_enabled = enabled == Some(true) && !self.enabled;
        if let Some(enabled) = enabled {
            self.enabled = enabled;
        }

        if re_enabled {
            self.consecutive_failures = 0;
            self.last_error = None;
        }
        if re_enabled || interval_changed {
            self.next_run_at = now + self.interval.as_duration();
        }
        self.updated_at = now;
    }
}
