//! Repository port for noise event persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NoiseEvent, NoiseEventType};

/// Result of a bounded append.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundedAppend {
    /// Oldest undelivered events discarded to make room.
    pub dropped: u64,
    /// Undelivered events after the append.
    pub depth: u64,
}

/// Durable store of noise events.
///
/// Undelivered events are returned in creation order. The store may be shared
/// by several processes, so `take_undelivered` and `append_bounded` must each be
/// atomic in the store itself.
#[async_trait]
pub trait NoiseEventRepository: Send + Sync {
    /// Persist a new event.
    async fn append(&self, event: &NoiseEvent) -> DomainResult<()>;

    /// Persist several events atomically: either all are stored or none.
    async fn append_batch(&self, events: &[NoiseEvent]) -> DomainResult<()>;

    /// Persist `events` and, when `max_pending > 0`, discard the oldest
    /// previously stored undelivered events so no more than `max_pending`
    /// remain. Counting, discarding and inserting happen in one atomic step.
    async fn append_bounded(&self, events: &[NoiseEvent], max_pending: u64) -> DomainResult<BoundedAppend>;

    /// Oldest undelivered events, optionally filtered by type. Read only.
    async fn query_undelivered(
        &self,
        event_type: Option<NoiseEventType>,
        limit: usize,
    ) -> DomainResult<Vec<NoiseEvent>>;

    /// Claim up to `limit` of the oldest undelivered events, marking them
    /// delivered in the same atomic step. Concurrent callers never receive
    /// the same event.
    async fn take_undelivered(
        &self,
        event_type: Option<NoiseEventType>,
        limit: usize,
    ) -> DomainResult<Vec<NoiseEvent>>;

    /// Flag the given events as delivered. Unknown ids are ignored.
    async fn mark_delivered(&self, ids: &[Uuid]) -> DomainResult<u64>;

    /// Remove every delivered event. Returns how many were removed.
    async fn delete_delivered(&self) -> DomainResult<u64>;

    /// Number of undelivered events, optionally filtered by type.
    async fn count_undelivered(&self, event_type: Option<NoiseEventType>) -> DomainResult<u64>;

    /// Delete the `count` oldest undelivered events. Returns how many were removed.
    async fn discard_oldest_undelivered(&self, count: u64) -> DomainResult<u64>;
}
