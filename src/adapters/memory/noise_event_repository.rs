//! In-memory NoiseEventRepository.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{NoiseEvent, NoiseEventType};
use crate::domain::ports::{BoundedAppend, NoiseEventRepository};

/// Events kept in insertion order. Reads sort by `created_at` with a stable
/// sort, so insertion order breaks ties the way `rowid` does in SQLite.
#[derive(Default)]
pub struct InMemoryNoiseEventRepository {
    events: RwLock<Vec<NoiseEvent>>,
}

impl InMemoryNoiseEventRepository {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(event: &NoiseEvent, event_type: Option<NoiseEventType>) -> bool {
    !event.delivered && event_type.map_or(true, |t| event.event_type() == t)
}

/// Indices of matching undelivered events, oldest first.
fn pending_indices(events: &[NoiseEvent], event_type: Option<NoiseEventType>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..events.len())
        .filter(|&i| matches(&events[i], event_type))
        .collect();
    indices.sort_by_key(|&i| events[i].created_at());
    indices
}

/// Remove up to `count` of the oldest undelivered events whose ids are not in `keep`.
fn discard_oldest(events: &mut Vec<NoiseEvent>, count: u64, keep: &HashSet<Uuid>) -> u64 {
    let doomed: HashSet<Uuid> = pending_indices(events, None)
        .into_iter()
        .map(|i| events[i].id)
        .filter(|id| !keep.contains(id))
        .take(usize::try_from(count).unwrap_or(usize::MAX))
        .collect();

    events.retain(|e| !doomed.contains(&e.id));
    doomed.len() as u64
}

#[async_trait]
impl NoiseEventRepository for InMemoryNoiseEventRepository {
    async fn append(&self, event: &NoiseEvent) -> DomainResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn append_batch(&self, events: &[NoiseEvent]) -> DomainResult<()> {
        self.events.write().await.extend_from_slice(events);
        Ok(())
    }

    async fn append_bounded(&self, events: &[NoiseEvent], max_pending: u64) -> DomainResult<BoundedAppend> {
        let mut stored = self.events.write().await;
        stored.extend_from_slice(events);

        let total = stored.iter().filter(|e| matches(e, None)).count() as u64;
        let mut dropped = 0;
        if max_pending > 0 && total > max_pending {
            let keep: HashSet<Uuid> = events.iter().map(|e| e.id).collect();
            dropped = discard_oldest(&mut stored, total - max_pending, &keep);
        }

        Ok(BoundedAppend {
            dropped,
            depth: total - dropped,
        })
    }

    async fn query_undelivered(
        &self,
        event_type: Option<NoiseEventType>,
        limit: usize,
    ) -> DomainResult<Vec<NoiseEvent>> {
        let events = self.events.read().await;
        Ok(pending_indices(&events, event_type)
            .into_iter()
            .take(limit)
            .map(|i| events[i].clone())
            .collect())
    }

    async fn take_undelivered(
        &self,
        event_type: Option<NoiseEventType>,
        limit: usize,
    ) -> DomainResult<Vec<NoiseEvent>> {
        let mut events = self.events.write().await;
        let claimed: Vec<usize> = pending_indices(&events, event_type).into_iter().take(limit).collect();

        Ok(claimed
            .into_iter()
            .map(|i| {
                events[i].mark_delivered();
                events[i].clone()
            })
            .collect())
    }

    async fn mark_delivered(&self, ids: &[Uuid]) -> DomainResult<u64> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        let mut events = self.events.write().await;
        let mut marked = 0;
        for event in events.iter_mut().filter(|e| !e.delivered && wanted.contains(&e.id)) {
            event.mark_delivered();
            marked += 1;
        }
        Ok(marked)
    }

    async fn delete_delivered(&self) -> DomainResult<u64> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| !e.delivered);
        Ok((before - events.len()) as u64)
    }

    async fn count_undelivered(&self, event_type: Option<NoiseEventType>) -> DomainResult<u64> {
        let events = self.events.read().await;
        Ok(events.iter().filter(|e| matches(e, event_type)).count() as u64)
    }

    async fn discard_oldest_undelivered(&self, count: u64) -> DomainResult<u64> {
        if count == 0 {
            return Ok(0);
        }

        let mut events = self.events.write().await;
        Ok(discard_oldest(&mut events, count, &HashSet::new()))
    }
}
