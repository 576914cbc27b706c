//! Clock Port

use chrono::{DateTime, Utc};

/// Source of "now" for scheduling and journaling
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
