//! Active-hours gate.

use chrono::{DateTime, Timelike, Utc};

use crate::domain::models::SchedulerConfig;

/// Hour-of-day window (UTC) during which noise generation may run.
///
/// `start <= end` is a same-day window `[start, end)`. `start > end` wraps
/// past midnight. `start == end` is an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHours {
    /// First active hour, inclusive.
    pub start: u32,
    /// End hour, exclusive.
    pub end: u32,
}

impl ActiveHours {
    /// Window from `start` (inclusive) to `end` (exclusive).
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether `hour` (0-23) falls inside the window.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }

    /// Whether the UTC hour of `now` falls inside the window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.contains_hour(now.hour())
    }
}

impl From<&SchedulerConfig> for ActiveHours {
    fn from(config: &SchedulerConfig) -> Self {
        Self::new(config.active_hours_start, config.active_hours_end)
    }
}
