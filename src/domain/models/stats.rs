//! Scheduler counters.

use serde::{Deserialize, Serialize};

/// Snapshot of the scheduler's monotonic counters. Telemetry only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Search events generated.
    pub searches_generated: u64,
    /// Page visit events generated.
    pub pages_generated: u64,
    /// Product view events generated.
    pub products_generated: u64,
    /// Persona rotations performed.
    pub persona_rotations: u64,
    /// Loop iterations that failed or panicked.
    pub loop_failures: u64,
}

impl SchedulerStats {
    /// Search, page and product events combined.
    pub fn total_events(&self) -> u64 {
        self.searches_generated + self.pages_generated + self.products_generated + self.persona_rotations
    }
}
