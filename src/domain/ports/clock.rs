//! Time source port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Source of wall-clock time and the only way services wait.
///
/// Every timestamp, active-hours check and inter-cycle sleep goes through
/// this trait so tests can drive time explicitly.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Wait for `duration`.
    async fn sleep(&self, duration: Duration);
}
