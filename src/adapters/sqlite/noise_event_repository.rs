//! SQLite adapter for NoiseEventRepository.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::adapters::sqlite::{format_datetime, parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NoiseEvent, NoiseEventType};
use crate::domain::ports::{BoundedAppend, NoiseEventRepository};

/// Noise event store backed by SQLite.
#[derive(Clone)]
pub struct SqliteNoiseEventRepository {
    pool: SqlitePool,
}

impl SqliteNoiseEventRepository {
    /// Repository over `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct NoiseEventRow {
    id: String,
    persona_id: Option<String>,
    event_type: String,
    payload: String,
    delivered: bool,
    created_at: String,
}

/// A row claimed by `UPDATE ... RETURNING`, which yields rows in no defined
/// order; `seq` is the rowid used to restore creation order.
#[derive(sqlx::FromRow)]
struct ClaimedRow {
    seq: i64,
    #[sqlx(flatten)]
    row: NoiseEventRow,
}

fn row_to_event(row: NoiseEventRow) -> DomainResult<NoiseEvent> {
    let event_type: NoiseEventType = row.event_type.parse().map_err(DomainError::SerializationError)?;
    let payload: Map<String, Value> = serde_json::from_str(&row.payload)
        .map_err(|e| DomainError::SerializationError(format!("payload: {}", e)))?;

    Ok(NoiseEvent::restore(
        parse_uuid(&row.id)?,
        parse_optional_uuid(row.persona_id)?,
        event_type,
        payload,
        row.delivered,
        parse_datetime(&row.created_at)?,
    ))
}

async fn insert_event<'e, E>(executor: E, event: &NoiseEvent) -> DomainResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let payload = serde_json::to_string(&event.payload)?;

    sqlx::query(
        "INSERT INTO noise_events (id, persona_id, event_type, payload, delivered, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    )
    .bind(event.id.to_string())
    .bind(event.persona_id.map(|u| u.to_string()))
    .bind(event.event_type().as_str())
    .bind(payload)
    .bind(event.delivered)
    .bind(format_datetime(event.created_at()))
    .execute(executor)
    .await?;

    Ok(())
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

async fn count_pending<'e, E>(executor: E, event_type: Option<NoiseEventType>) -> DomainResult<u64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM noise_events WHERE delivered = 0 AND (?1 IS NULL OR event_type = ?1)"
    )
    .bind(event_type.map(|t| t.as_str()))
    .fetch_one(executor)
    .await?;

    Ok(u64::try_from(count).unwrap_or(0))
}

#[async_trait]
impl NoiseEventRepository for SqliteNoiseEventRepository {
    async fn append(&self, event: &NoiseEvent) -> DomainResult<()> {
        insert_event(&self.pool, event).await
    }

    async fn append_batch(&self, events: &[NoiseEvent]) -> DomainResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for event in events {
            insert_event(&mut *tx, event).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn append_bounded(&self, events: &[NoiseEvent], max_pending: u64) -> DomainResult<BoundedAppend> {
        if events.is_empty() {
            let depth = count_pending(&self.pool, None).await?;
            return Ok(BoundedAppend { dropped: 0, depth });
        }

        // Inserting first makes the transaction's first statement a write, so
        // it holds the write lock before counting.
        let mut tx = self.pool.begin().await?;
        for event in events {
            insert_event(&mut *tx, event).await?;
        }

        let total = count_pending(&mut *tx, None).await?;
        let mut dropped = 0;
        if max_pending > 0 && total > max_pending {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "DELETE FROM noise_events WHERE rowid IN (
                    SELECT rowid FROM noise_events
                    WHERE delivered = 0 AND id NOT IN (",
            );
            let mut separated = builder.separated(", ");
            for event in events {
                separated.push_bind(event.id.to_string());
            }
            separated.push_unseparated(") ORDER BY created_at ASC, rowid ASC LIMIT ");
            builder.push_bind(i64::try_from(total - max_pending).unwrap_or(i64::MAX));
            builder.push(")");

            dropped = builder.build().execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;

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
        let rows: Vec<NoiseEventRow> = sqlx::query_as(
            "SELECT id, persona_id, event_type, payload, delivered, created_at
             FROM noise_events
             WHERE delivered = 0 AND (?1 IS NULL OR event_type = ?1)
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?2"
        )
        .bind(event_type.map(|t| t.as_str()))
        .bind(to_i64(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_event).collect()
    }

    async fn take_undelivered(
        &self,
        event_type: Option<NoiseEventType>,
        limit: usize,
    ) -> DomainResult<Vec<NoiseEvent>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut rows: Vec<ClaimedRow> = sqlx::query_as(
            "UPDATE noise_events SET delivered = 1
             WHERE rowid IN (
                SELECT rowid FROM noise_events
                WHERE delivered = 0 AND (?1 IS NULL OR event_type = ?1)
                ORDER BY created_at ASC, rowid ASC
                LIMIT ?2
             )
             RETURNING rowid AS seq, id, persona_id, event_type, payload, delivered, created_at"
        )
        .bind(event_type.map(|t| t.as_str()))
        .bind(to_i64(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.sort_by(|a, b| a.row.created_at.cmp(&b.row.created_at).then(a.seq.cmp(&b.seq)));
        rows.into_iter().map(|claimed| row_to_event(claimed.row)).collect()
    }

    async fn mark_delivered(&self, ids: &[Uuid]) -> DomainResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE noise_events SET delivered = 1 WHERE delivered = 0 AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_delivered(&self) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM noise_events WHERE delivered = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_undelivered(&self, event_type: Option<NoiseEventType>) -> DomainResult<u64> {
        count_pending(&self.pool, event_type).await
    }

    async fn discard_oldest_undelivered(&self, count: u64) -> DomainResult<u64> {
        if count == 0 {
            return Ok(0);
        }

        let result = sqlx::query(
            "DELETE FROM noise_events WHERE rowid IN (
                SELECT rowid FROM noise_events
                WHERE delivered = 0
                ORDER BY created_at ASC, rowid ASC
                LIMIT ?1
             )"
        )
        .bind(i64::try_from(count).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use chrono::{Duration, Utc};

    async fn setup_repo() -> SqliteNoiseEventRepository {
        let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
        SqliteNoiseEventRepository::new(pool)
    }

    #[tokio::test]
    async fn test_append_and_query_in_creation_order() {
        let repo = setup_repo().await;
        let base = Utc::now();
        let persona = Uuid::new_v4();

        let later = NoiseEvent::search(Some(persona), "second", base + Duration::seconds(1));
        let earlier = NoiseEvent::search(Some(persona), "first", base);
        repo.append(&later).await.unwrap();
        repo.append(&earlier).await.unwrap();

        let events = repo.query_undelivered(None, 10).await.unwrap();
        let values: Vec<_> = events.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["first", "second"]);
        assert_eq!(events[0].persona_id, Some(persona));
        assert_eq!(events[0].created_at(), base);
    }

    #[tokio::test]
    async fn test_query_filters_by_type_and_respects_limit() {
        let repo = setup_repo().await;
        let now = Utc::now();
        for i in 0..3 {
            repo.append(&NoiseEvent::search(None, format!("q{i}"), now)).await.unwrap();
        }
        repo.append(&NoiseEvent::browse(None, "https://a.example", now)).await.unwrap();

        let searches = repo.query_undelivered(Some(NoiseEventType::Search), 2).await.unwrap();
        assert_eq!(searches.len(), 2);
        assert!(searches.iter().all(|e| e.event_type() == NoiseEventType::Search));

        assert_eq!(repo.count_undelivered(Some(NoiseEventType::Browse)).await.unwrap(), 1);
        assert_eq!(repo.count_undelivered(None).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_mark_delivered_then_delete() {
        let repo = setup_repo().await;
        let now = Utc::now();
        let a = NoiseEvent::shop(None, "kettle", now);
        let b = NoiseEvent::shop(None, "toaster", now);
        repo.append(&a).await.unwrap();
        repo.append(&b).await.unwrap();

        assert_eq!(repo.mark_delivered(&[a.id, Uuid::new_v4()]).await.unwrap(), 1);
        assert_eq!(repo.mark_delivered(&[a.id]).await.unwrap(), 0);
        assert_eq!(repo.mark_delivered(&[]).await.unwrap(), 0);

        assert_eq!(repo.delete_delivered().await.unwrap(), 1);
        let remaining = repo.query_undelivered(None, 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, b.id);
    }

    #[tokio::test]
    async fn test_append_batch_is_all_or_nothing() {
        let repo = setup_repo().await;
        let now = Utc::now();
        let first = NoiseEvent::search(None, "a", now);
        let batch = vec![NoiseEvent::search(None, "b", now), first.clone()];

        repo.append(&first).await.unwrap();
        assert!(repo.append_batch(&batch).await.is_err());
        assert_eq!(repo.count_undelivered(None).await.unwrap(), 1);

        repo.append_batch(&[NoiseEvent::browse(None, "https://c.example", now)]).await.unwrap();
        assert_eq!(repo.count_undelivered(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_take_undelivered_claims_in_creation_order() {
        let repo = setup_repo().await;
        let base = Utc::now();
        repo.append(&NoiseEvent::search(None, "late", base + Duration::seconds(5))).await.unwrap();
        repo.append(&NoiseEvent::search(None, "tie-a", base)).await.unwrap();
        repo.append(&NoiseEvent::search(None, "tie-b", base)).await.unwrap();
        repo.append(&NoiseEvent::browse(None, "https://a.example", base)).await.unwrap();

        let taken = repo.take_undelivered(Some(NoiseEventType::Search), 2).await.unwrap();
        let values: Vec<_> = taken.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["tie-a", "tie-b"]);
        assert!(taken.iter().all(|e| e.delivered));

        let rest = repo.take_undelivered(None, 10).await.unwrap();
        let values: Vec<_> = rest.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["https://a.example", "late"]);
        assert!(repo.take_undelivered(None, 10).await.unwrap().is_empty());
        assert_eq!(repo.delete_delivered().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_append_bounded_discards_only_older_events() {
        let repo = setup_repo().await;
        let base = Utc::now();
        for i in 0..3 {
            repo.append(&NoiseEvent::search(None, format!("old{i}"), base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let batch = vec![
            NoiseEvent::browse(None, "https://new-a.example", base),
            NoiseEvent::browse(None, "https://new-b.example", base),
        ];
        let outcome = repo.append_bounded(&batch, 3).await.unwrap();
        assert_eq!(outcome, BoundedAppend { dropped: 2, depth: 3 });

        let remaining = repo.query_undelivered(None, 10).await.unwrap();
        let values: Vec<_> = remaining.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["https://new-a.example", "https://new-b.example", "old2"]);

        let unbounded = repo
            .append_bounded(&[NoiseEvent::shop(None, "kettle", base)], 0)
            .await
            .unwrap();
        assert_eq!(unbounded, BoundedAppend { dropped: 0, depth: 4 });
    }

    #[tokio::test]
    async fn test_discard_oldest_undelivered() {
        let repo = setup_repo().await;
        let base = Utc::now();
        for i in 0..5 {
            repo.append(&NoiseEvent::search(None, format!("q{i}"), base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        assert_eq!(repo.discard_oldest_undelivered(2).await.unwrap(), 2);
        let events = repo.query_undelivered(None, 10).await.unwrap();
        assert_eq!(events.first().and_then(NoiseEvent::primary_value), Some("q2"));
        assert_eq!(repo.discard_oldest_undelivered(0).await.unwrap(), 0);
    }
}
