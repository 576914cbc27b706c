//! ScheduleInterval - Allowed regeneration periods

use serde::{Deserialize, Serialize};

/// Regeneration period of a schedule, serialized as a number of hours
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "i32", into = "i32")]
pub enum ScheduleInterval {
    Hourly,
    SixHours,
    TwelveHours,
    Daily,
    Weekly,
}

impl ScheduleInterval {
    pub fn hours(&self) -> i32 {
        match self {
            ScheduleInterval::Hourly => 1,
            ScheduleInterval::SixHours => 6,
            ScheduleInterval::TwelveHours => 12,
            ScheduleInterval::Daily => 24,
            ScheduleInterval::Weekly => 168,
        }
    }

    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.hours() as i64)
    }
}

impl TryFrom<i32> for ScheduleInterval {
    type Error = String;

    fn try_from(hours: i32) -> Result<Self, Self::Error> {
        match hours {
            1 => Ok(ScheduleInterval::Hourly),
            6 => Ok(ScheduleInterval::SixHours),
            12 => Ok(ScheduleInterval::TwelveHours),
            24 => Ok(ScheduleInterval::Daily),
            168 => Ok(ScheduleInterval::Weekly),
            _ => Err(format!(
                "Unsupported interval_hours: {} (expected 1, 6, 12, 24 or 168)",
                hours
            )),
        }
    }
}

impl From<ScheduleInterval> for i32 {
    fn from(interval: ScheduleInterval) -> Self {
        interval.hours()
    }
}
