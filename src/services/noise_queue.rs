//! Noise event queue.
//!
//! The queue may be shared by the daemon and any number of `phantom noise pop`
//! processes over one database, so it holds no lock of its own. Claiming a
//! batch and the bounded append are each a single atomic repository call;
//! that is what makes delivery at-most-once across all consumers.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{NoiseEvent, NoiseEventType, QueueConfig};
use crate::domain::ports::NoiseEventRepository;

/// Bounded, persistent queue of noise events awaiting delivery.
pub struct NoiseQueue {
    store: Arc<dyn NoiseEventRepository>,
    max_pending: u64,
    depth_warning: u64,
}

impl NoiseQueue {
    /// Queue over `store` with the bound and warning threshold from `config`.
    pub fn new(store: Arc<dyn NoiseEventRepository>, config: &QueueConfig) -> Self {
        Self {
            store,
            max_pending: config.max_pending,
            depth_warning: config.depth_warning,
        }
    }

    /// Append one event, enforcing the pending bound by dropping the oldest
    /// undelivered events first.
    pub async fn push(&self, event: NoiseEvent) -> DomainResult<()> {
        self.push_all(std::iter::once(event)).await
    }

    /// Append several events in one atomic store write.
    pub async fn push_all(&self, events: impl IntoIterator<Item = NoiseEvent> + Send) -> DomainResult<()> {
        let mut events: Vec<NoiseEvent> = events.into_iter().collect();
        if events.is_empty() {
            return Ok(());
        }
        if self.max_pending > 0 && events.len() as u64 > self.max_pending {
            let overflow = events.len() - usize::try_from(self.max_pending).unwrap_or(usize::MAX);
            events.drain(..overflow);
            warn!(dropped = overflow, max_pending = self.max_pending, "noise batch larger than queue bound");
        }

        let outcome = self.store.append_bounded(&events, self.max_pending).await?;
        if outcome.dropped > 0 {
            warn!(
                dropped = outcome.dropped,
                max_pending = self.max_pending,
                "noise queue full, dropped oldest undelivered events"
            );
        }
        if self.depth_warning > 0 && outcome.depth > self.depth_warning {
            warn!(depth = outcome.depth, threshold = self.depth_warning, "noise queue depth above warning threshold");
        }
        Ok(())
    }

    /// Take up to `limit` of the oldest undelivered events, optionally of one
    /// type. They are marked delivered in the same store operation that
    /// selects them.
    pub async fn pop_batch(
        &self,
        event_type: Option<NoiseEventType>,
        limit: usize,
    ) -> DomainResult<Vec<NoiseEvent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let batch = self.store.take_undelivered(event_type, limit).await?;
        if !batch.is_empty() {
            debug!(count = batch.len(), event_type = event_type.map(|t| t.as_str()), "popped noise batch");
        }
        Ok(batch)
    }

    /// Remove every delivered event. Never touches undelivered ones.
    pub async fn cleanup_delivered(&self) -> DomainResult<u64> {
        let removed = self.store.delete_delivered().await?;
        if removed > 0 {
            info!(removed, "cleaned up delivered noise events");
        } else {
            debug!(removed, "no delivered noise events to clean up");
        }
        Ok(removed)
    }

    /// Number of undelivered events, optionally of one type.
    pub async fn depth(&self, event_type: Option<NoiseEventType>) -> DomainResult<u64> {
        self.store.count_undelivered(event_type).await
    }
}
