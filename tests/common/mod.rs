//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use phantom::adapters::generators::MockGenerator;
use phantom::adapters::memory::{InMemoryNoiseEventRepository, InMemoryPersonaRepository};
use phantom::domain::models::{Config, GenerationKind, PersonaProfile};
use phantom::domain::ports::Clock;
use phantom::NoiseScheduler;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a temporary test database
///
/// Returns the path to a SQLite database file in a temporary directory.
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let db_path = dir.path().join("test.db");
    (dir, db_path)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Noon UTC on a fixed day; inside the default active hours.
pub fn midday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
}

/// Clock that follows tokio's (pausable) timer.
///
/// `now` is `base` plus the tokio time elapsed since construction, so with
/// `start_paused = true` both loop sleeps and timestamps advance only when
/// the runtime auto-advances or the test calls `tokio::time::advance`.
pub struct PausedClock {
    base: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl PausedClock {
    pub fn new(base: DateTime<Utc>) -> Self {
        Self {
            base,
            started: tokio::time::Instant::now(),
        }
    }
}

#[async_trait]
impl Clock for PausedClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap_or_default();
        self.base + elapsed
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub fn sample_profile(name: &str) -> PersonaProfile {
    PersonaProfile {
        name: name.to_string(),
        age: 34,
        location: "Portland, OR".to_string(),
        occupation: "bicycle mechanic".to_string(),
        interests: vec![
            "gravel cycling".to_string(),
            "sourdough".to_string(),
            "board games".to_string(),
        ],
        personality_notes: "patient, a little nerdy".to_string(),
        search_topics: vec!["tubeless tire sealant".to_string()],
        favorite_sites: vec!["https://bikeportland.org".to_string()],
        shopping_interests: vec!["bike tools".to_string()],
        personality_traits: vec!["curious".to_string()],
        daily_routine: "opens the shop at 9".to_string(),
    }
}

/// Persona response as an LLM would return it, fenced.
pub fn persona_response(name: &str) -> String {
    format!(
        "Here you go:\n```json\n{}\n```",
        serde_json::to_string(&sample_profile(name)).expect("profile serializes")
    )
}

pub fn search_response(count: usize) -> String {
    let queries: Vec<String> = (0..count).map(|i| format!("query {i}")).collect();
    serde_json::to_string(&queries).expect("queries serialize")
}

pub fn browsing_response(pages: usize, products: usize) -> String {
    serde_json::json!({
        "urls_to_visit": (0..pages).map(|i| format!("https://example.com/{i}")).collect::<Vec<_>>(),
        "products_to_browse": (0..products).map(|i| format!("product {i}")).collect::<Vec<_>>(),
    })
    .to_string()
}

pub fn form_data_response() -> String {
    serde_json::json!({
        "first_name": "Sam",
        "last_name": "Ortega",
        "email": "sam.ortega@example.net",
        "city": "Portland",
    })
    .to_string()
}

/// Mock generator that answers every request kind successfully.
pub fn happy_generator() -> MockGenerator {
    MockGenerator::new()
        .with_default(GenerationKind::Persona, persona_response("Riley Chen"))
        .with_default(GenerationKind::SearchQueries, search_response(5))
        .with_default(GenerationKind::BrowsingPlan, browsing_response(8, 3))
        .with_default(GenerationKind::FormData, form_data_response())
}

/// Config with fast retries so failure paths finish quickly.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.retry.initial_backoff_ms = 10;
    config.retry.max_backoff_ms = 40;
    config
}

/// Scheduler over in-memory stores, plus handles to inspect them.
pub struct Harness {
    pub scheduler: Arc<NoiseScheduler>,
    pub generator: Arc<MockGenerator>,
    pub events: Arc<InMemoryNoiseEventRepository>,
    pub personas: Arc<InMemoryPersonaRepository>,
}

pub fn harness(config: Config, generator: MockGenerator, clock: Arc<dyn Clock>) -> Harness {
    let generator = Arc::new(generator);
    let events = Arc::new(InMemoryNoiseEventRepository::new());
    let personas = Arc::new(InMemoryPersonaRepository::new());
    let scheduler = Arc::new(NoiseScheduler::new(
        config,
        generator.clone(),
        events.clone(),
        personas.clone(),
        clock,
    ));
    Harness {
        scheduler,
        generator,
        events,
        personas,
    }
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 100ms until it returns true or timeout is reached.
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    false
}
