//! Queue semantics against both repository backends.

mod common;

use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;

use phantom::adapters::memory::InMemoryNoiseEventRepository;
use phantom::adapters::sqlite::{create_migrated_test_pool, initialize_database, SqliteNoiseEventRepository};
use phantom::domain::models::{DatabaseConfig, NoiseEvent, NoiseEventType, QueueConfig};
use phantom::domain::ports::NoiseEventRepository;
use phantom::NoiseQueue;

fn unbounded() -> QueueConfig {
    QueueConfig {
        max_pending: 0,
        depth_warning: 0,
    }
}

async fn backends() -> Vec<(&'static str, Arc<dyn NoiseEventRepository>)> {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test database");
    vec![
        ("memory", Arc::new(InMemoryNoiseEventRepository::new())),
        ("sqlite", Arc::new(SqliteNoiseEventRepository::new(pool))),
    ]
}

#[tokio::test]
async fn test_typed_pop_then_untyped_pop() {
    for (backend, store) in backends().await {
        let queue = NoiseQueue::new(store, &unbounded());
        let base = common::midday();

        let searches: Vec<_> = (0..5)
            .map(|i| NoiseEvent::search(None, format!("q{i}"), base + Duration::seconds(i)))
            .collect();
        queue.push_all(searches).await.unwrap();
        queue.push(NoiseEvent::browse(None, "https://a.example", base)).await.unwrap();
        queue.push(NoiseEvent::browse(None, "https://b.example", base)).await.unwrap();

        let popped = queue.pop_batch(Some(NoiseEventType::Search), 10).await.unwrap();
        assert_eq!(popped.len(), 5, "{backend}");
        let values: Vec<_> = popped.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["q0", "q1", "q2", "q3", "q4"], "{backend}");

        assert!(
            queue.pop_batch(Some(NoiseEventType::Search), 10).await.unwrap().is_empty(),
            "{backend}"
        );

        let rest = queue.pop_batch(None, 10).await.unwrap();
        assert_eq!(rest.len(), 2, "{backend}");
        assert!(rest.iter().all(|e| e.event_type() == NoiseEventType::Browse), "{backend}");
        assert_eq!(queue.depth(None).await.unwrap(), 0, "{backend}");
    }
}

#[tokio::test]
async fn test_pop_respects_limit_and_age_order() {
    for (backend, store) in backends().await {
        let queue = NoiseQueue::new(store, &unbounded());
        let base = common::midday();

        // Pushed newest first; pops must still come out oldest first.
        for i in (0..6).rev() {
            queue
                .push(NoiseEvent::shop(None, format!("p{i}"), base + Duration::minutes(i)))
                .await
                .unwrap();
        }

        let first = queue.pop_batch(None, 4).await.unwrap();
        let values: Vec<_> = first.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["p0", "p1", "p2", "p3"], "{backend}");
        assert_eq!(queue.depth(Some(NoiseEventType::Shop)).await.unwrap(), 2, "{backend}");
    }
}

#[tokio::test]
async fn test_cleanup_removes_only_delivered() {
    for (backend, store) in backends().await {
        let queue = NoiseQueue::new(store, &unbounded());
        let now = common::midday();
        queue
            .push_all((0..5).map(|i| NoiseEvent::search(None, format!("q{i}"), now)))
            .await
            .unwrap();

        queue.pop_batch(None, 2).await.unwrap();
        assert_eq!(queue.cleanup_delivered().await.unwrap(), 2, "{backend}");
        assert_eq!(queue.cleanup_delivered().await.unwrap(), 0, "{backend}");
        assert_eq!(queue.depth(None).await.unwrap(), 3, "{backend}");
    }
}

#[tokio::test]
async fn test_bound_drops_oldest_on_both_backends() {
    for (backend, store) in backends().await {
        let queue = NoiseQueue::new(
            store,
            &QueueConfig {
                max_pending: 4,
                depth_warning: 3,
            },
        );
        let base = common::midday();
        for i in 0..4 {
            queue
                .push(NoiseEvent::search(None, format!("old{i}"), base + Duration::seconds(i)))
                .await
                .unwrap();
        }
        queue
            .push_all((0..2).map(|i| NoiseEvent::browse(None, format!("new{i}"), base + Duration::minutes(5))))
            .await
            .unwrap();

        assert_eq!(queue.depth(None).await.unwrap(), 4, "{backend}");
        let remaining = queue.pop_batch(None, 10).await.unwrap();
        let values: Vec<_> = remaining.iter().filter_map(NoiseEvent::primary_value).collect();
        assert_eq!(values, vec!["old2", "old3", "new0", "new1"], "{backend}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pops_never_duplicate() {
    for (backend, store) in backends().await {
        let queue = Arc::new(NoiseQueue::new(store, &unbounded()));
        let base = common::midday();
        queue
            .push_all((0..120).map(|i| NoiseEvent::search(None, format!("q{i}"), base + Duration::milliseconds(i))))
            .await
            .unwrap();

        let mut consumers = Vec::new();
        for _ in 0..6 {
            let queue = Arc::clone(&queue);
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    let batch = queue.pop_batch(None, 7).await.unwrap();
                    if batch.is_empty() {
                        break;
                    }
                    seen.extend(batch.into_iter().map(|e| e.id));
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for consumer in consumers {
            all.extend(consumer.await.unwrap());
        }
        let unique: HashSet<_> = all.iter().copied().collect();
        assert_eq!(all.len(), 120, "{backend}: every event delivered");
        assert_eq!(unique.len(), 120, "{backend}: no event delivered twice");
    }
}

/// Two pools over one database file behave like two `phantom` processes:
/// each has its own `NoiseQueue`, so nothing in-process serializes them.
async fn queues_over_one_file(dir: &std::path::Path, config: &QueueConfig) -> (Arc<NoiseQueue>, Arc<NoiseQueue>) {
    let db = DatabaseConfig {
        path: dir.join("shared.db").to_string_lossy().into_owned(),
        max_connections: 4,
    };
    let first = initialize_database(&db).await.expect("failed to open first pool");
    let second = initialize_database(&db).await.expect("failed to open second pool");
    (
        Arc::new(NoiseQueue::new(Arc::new(SqliteNoiseEventRepository::new(first)), config)),
        Arc::new(NoiseQueue::new(Arc::new(SqliteNoiseEventRepository::new(second)), config)),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_consumers_on_separate_pools_never_duplicate() {
    let dir = common::temp_dir();
    let (daemon, cli) = queues_over_one_file(dir.path(), &unbounded()).await;
    let base = common::midday();
    daemon
        .push_all((0..300).map(|i| NoiseEvent::search(None, format!("q{i}"), base + Duration::milliseconds(i))))
        .await
        .unwrap();

    let mut consumers = Vec::new();
    for n in 0..4 {
        let queue = if n % 2 == 0 { Arc::clone(&daemon) } else { Arc::clone(&cli) };
        consumers.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            loop {
                let batch = queue.pop_batch(None, 3).await.unwrap();
                if batch.is_empty() {
                    break;
                }
                seen.extend(batch.into_iter().map(|e| e.id));
            }
            seen
        }));
    }

    let mut all = Vec::new();
    for consumer in consumers {
        all.extend(consumer.await.unwrap());
    }
    let unique: HashSet<_> = all.iter().copied().collect();
    assert_eq!(unique.len(), 300, "every event delivered");
    assert_eq!(all.len(), 300, "no event delivered to two consumers");
    assert_eq!(cli.depth(None).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bound_holds_across_separate_pools() {
    let dir = common::temp_dir();
    let config = QueueConfig {
        max_pending: 10,
        depth_warning: 0,
    };
    let (daemon, cli) = queues_over_one_file(dir.path(), &config).await;
    let base = common::midday();

    let mut producers = Vec::new();
    for n in 0..2 {
        let queue = if n == 0 { Arc::clone(&daemon) } else { Arc::clone(&cli) };
        producers.push(tokio::spawn(async move {
            for i in 0..20 {
                let at = base + Duration::milliseconds(n * 1000 + i);
                queue.push(NoiseEvent::browse(None, format!("https://{n}-{i}.example"), at)).await.unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }

    assert_eq!(daemon.depth(None).await.unwrap(), 10);
    assert_eq!(cli.pop_batch(None, 100).await.unwrap().len(), 10);
}
