//! Noise scheduler.
//!
//! Owns four independent background loops:
//! - search: persona-themed search queries
//! - browsing: page visits and product views from one browsing plan
//! - persona: rotation checks and persona summary refresh
//! - cleanup: removal of delivered events
//!
//! Each iteration is isolated: errors and panics are logged, counted and
//! followed by the loop's normal sleep. Nothing a single iteration does can
//! end its loop or any other loop.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    fingerprint_at, Config, FingerprintProfile, FormData, NoiseEvent, NoiseEventType, Persona,
    SchedulerStats,
};
use crate::domain::ports::{Clock, ContentGenerator, NoiseEventRepository, PersonaRepository};
use crate::services::active_hours::ActiveHours;
use crate::services::noise_queue::NoiseQueue;
use crate::services::persona_rotation::{PersonaState, RotationPolicy};
use crate::services::retry::{RetryPolicy, RetryingGenerator};

/// The scheduler's background loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    /// Persona-themed search queries.
    Search,
    /// Page visits and product views.
    Browsing,
    /// Rotation checks.
    Persona,
    /// Removal of delivered events.
    Cleanup,
}

impl LoopKind {
    /// Every loop, in spawn order.
    pub const ALL: [Self; 4] = [Self::Search, Self::Browsing, Self::Persona, Self::Cleanup];

    /// Name used in the `loop_name` log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Browsing => "browsing",
            Self::Persona => "persona",
            Self::Cleanup => "cleanup",
        }
    }
}

/// Result of one successful loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Work was done (possibly zero events).
    Completed,
    /// Nothing to do right now; recheck after the idle interval.
    Skipped(&'static str),
}

/// Point-in-time view for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    /// Whether the loops are running.
    pub running: bool,
    /// Summary of the cached persona.
    pub persona: Option<String>,
    /// Counters since construction.
    pub stats: SchedulerStats,
    /// Undelivered events across all types.
    pub queue_depth: u64,
}

#[derive(Default)]
struct StatsCounters {
    searches_generated: AtomicU64,
    pages_generated: AtomicU64,
    products_generated: AtomicU64,
    persona_rotations: AtomicU64,
    loop_failures: AtomicU64,
}

impl StatsCounters {
    fn add(counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> SchedulerStats {
        SchedulerStats {
            searches_generated: self.searches_generated.load(Ordering::Relaxed),
            pages_generated: self.pages_generated.load(Ordering::Relaxed),
            products_generated: self.products_generated.load(Ordering::Relaxed),
            persona_rotations: self.persona_rotations.load(Ordering::Relaxed),
            loop_failures: self.loop_failures.load(Ordering::Relaxed),
        }
    }
}

/// Runs the noise loops and serves consumers of the noise queue.
pub struct NoiseScheduler {
    config: Config,
    generator: RetryingGenerator,
    queue: NoiseQueue,
    personas: Arc<dyn PersonaRepository>,
    clock: Arc<dyn Clock>,
    active_hours: ActiveHours,
    rotation_policy: RotationPolicy,
    persona_state: RwLock<PersonaState>,
    rotation_lock: Mutex<()>,
    stats: StatsCounters,
    running: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl NoiseScheduler {
    /// Scheduler over the given generator, stores and clock. Nothing runs until `start`.
    pub fn new(
        config: Config,
        generator: Arc<dyn ContentGenerator>,
        events: Arc<dyn NoiseEventRepository>,
        personas: Arc<dyn PersonaRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let generator = RetryingGenerator::new(generator, RetryPolicy::from(&config.retry), clock.clone());
        let queue = NoiseQueue::new(events, &config.queue);

        Self {
            active_hours: ActiveHours::from(&config.scheduler),
            rotation_policy: RotationPolicy::from_hours(config.noise.persona_rotation_hours),
            config,
            generator,
            queue,
            personas,
            clock,
            persona_state: RwLock::new(PersonaState::default()),
            rotation_lock: Mutex::new(()),
            stats: StatsCounters::default(),
            running: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the four loops. Returns false when scheduling is disabled by
    /// configuration or the scheduler is already running.
    pub async fn start(self: &Arc<Self>) -> bool {
        if !self.config.scheduler.enabled {
            info!("noise scheduler disabled by configuration");
            return false;
        }

        let mut handles = self.handles.lock().await;
        if self.running.load(Ordering::Acquire) {
            debug!("noise scheduler already running");
            return false;
        }

        for kind in LoopKind::ALL {
            let this = Arc::clone(self);
            handles.push(tokio::spawn(this.run_loop(kind)));
        }
        self.running.store(true, Ordering::Release);

        info!(
            search_interval_mins = self.config.scheduler.search_interval_mins,
            browsing_interval_mins = self.config.scheduler.browsing_interval_mins,
            active_hours_start = self.active_hours.start,
            active_hours_end = self.active_hours.end,
            "noise scheduler started"
        );
        true
    }

    /// Cancel every loop and wait for them to exit. Idempotent.
    pub async fn stop(&self) {
        let mut handles = self.handles.lock().await;
        let was_running = self.running.swap(false, Ordering::AcqRel);

        let drained: Vec<_> = handles.drain(..).collect();
        for handle in &drained {
            handle.abort();
        }
        for handle in drained {
            // Cancelled tasks resolve to a JoinError; that is the expected outcome.
            let _ = handle.await;
        }

        if was_running {
            info!("noise scheduler stopped");
        }
    }

    /// Whether the loops are running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Summary of the persona the persona loop last saw or rotated in.
    pub async fn current_persona(&self) -> Option<String> {
        self.persona_state.read().await.summary.clone()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SchedulerStats {
        self.stats.snapshot()
    }

    /// Undelivered events across all types.
    pub async fn queue_depth(&self) -> DomainResult<u64> {
        self.queue.depth(None).await
    }

    /// Running flag, persona, counters and queue depth in one view.
    pub async fn status(&self) -> DomainResult<SchedulerStatus> {
        Ok(SchedulerStatus {
            running: self.is_running(),
            persona: self.current_persona().await,
            stats: self.stats(),
            queue_depth: self.queue_depth().await?,
        })
    }

    /// The underlying noise queue.
    pub fn queue(&self) -> &NoiseQueue {
        &self.queue
    }

    /// Deliver up to `limit` pending events to a consumer.
    pub async fn pop_noise(&self, event_type: Option<NoiseEventType>, limit: usize) -> DomainResult<Vec<NoiseEvent>> {
        self.queue.pop_batch(event_type, limit).await
    }

    /// Fingerprint for the clock's current time.
    pub fn fingerprint(&self) -> FingerprintProfile {
        fingerprint_at(self.clock.now(), self.config.fingerprint.rotation_interval_secs())
    }

    /// Form-fill data matching the active persona.
    pub async fn form_data(&self) -> DomainResult<FormData> {
        let persona = self
            .personas
            .find_active_persona()
            .await?
            .ok_or(DomainError::NoActivePersona)?;
        self.generator.form_data(&persona.summary()).await
    }

    /// Rotate now, regardless of the policy.
    pub async fn force_rotation(&self) -> DomainResult<Persona> {
        let _guard = self.rotation_lock.lock().await;
        self.rotate_locked().await
    }

    /// Refresh the cached persona from storage, then rotate if due.
    /// Returns whether a rotation happened.
    ///
    /// The active persona's `updated_at` feeds the rotation clock, so a
    /// rotation forced from another process resets it here too.
    pub async fn check_rotation(&self) -> DomainResult<bool> {
        let _guard = self.rotation_lock.lock().await;
        let active = self.personas.find_active_persona().await?;
        let last_rotation = {
            let mut state = self.persona_state.write().await;
            state.observe(active.as_ref());
            state.last_rotation
        };

        if self.rotation_policy.is_due(last_rotation, self.clock.now()) {
            self.rotate_locked().await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn rotate_locked(&self) -> DomainResult<Persona> {
        let profile = self.generator.persona(None).await?;
        let now = self.clock.now();

        let mut persona = Persona::new(profile, now);
        self.personas.activate(&persona).await?;
        persona.is_active = true;

        self.persona_state.write().await.rotated(&persona, now);
        self.stats.persona_rotations.fetch_add(1, Ordering::Relaxed);

        self.queue
            .push(NoiseEvent::persona_rotate(Some(persona.id), persona.summary(), now))
            .await?;

        info!(persona_id = %persona.id, name = persona.name(), "rotated persona");
        Ok(persona)
    }

    /// Run one iteration of `kind` without the surrounding loop.
    pub async fn run_cycle(&self, kind: LoopKind) -> DomainResult<CycleOutcome> {
        match kind {
            LoopKind::Search => self.search_cycle().await,
            LoopKind::Browsing => self.browsing_cycle().await,
            LoopKind::Persona => self.check_rotation().await.map(|_| CycleOutcome::Completed),
            LoopKind::Cleanup => self.queue.cleanup_delivered().await.map(|_| CycleOutcome::Completed),
        }
    }

    /// Active persona when generation may run now.
    async fn generation_persona(&self) -> DomainResult<Result<Persona, &'static str>> {
        if !self.active_hours.is_active_at(self.clock.now()) {
            return Ok(Err("outside active hours"));
        }
        Ok(self.personas.find_active_persona().await?.ok_or("no active persona"))
    }

    async fn search_cycle(&self) -> DomainResult<CycleOutcome> {
        let persona = match self.generation_persona().await? {
            Ok(persona) => persona,
            Err(reason) => return Ok(CycleOutcome::Skipped(reason)),
        };

        let count = self.config.noise.searches_per_cycle;
        let mut queries = self.generator.search_queries(&persona.summary(), count).await?;
        queries.retain(|q| !q.trim().is_empty());
        queries.truncate(count);

        let at = self.clock.now();
        let events: Vec<_> = queries
            .into_iter()
            .map(|q| NoiseEvent::search(Some(persona.id), q, at))
            .collect();
        let generated = events.len();

        self.queue.push_all(events).await?;
        StatsCounters::add(&self.stats.searches_generated, generated);

        info!(count = generated, persona_id = %persona.id, "generated search noise");
        Ok(CycleOutcome::Completed)
    }

    async fn browsing_cycle(&self) -> DomainResult<CycleOutcome> {
        let persona = match self.generation_persona().await? {
            Ok(persona) => persona,
            Err(reason) => return Ok(CycleOutcome::Skipped(reason)),
        };

        let pages = self.config.noise.pages_per_cycle;
        let products = self.config.noise.products_per_cycle;
        let mut plan = self.generator.browsing_plan(&persona.summary(), pages, products).await?;
        plan.urls_to_visit.retain(|u| !u.trim().is_empty());
        plan.urls_to_visit.truncate(pages);
        plan.products_to_browse.retain(|p| !p.trim().is_empty());
        plan.products_to_browse.truncate(products);

        let at = self.clock.now();
        let page_count = plan.urls_to_visit.len();
        let product_count = plan.products_to_browse.len();
        let events: Vec<_> = plan
            .urls_to_visit
            .into_iter()
            .map(|url| NoiseEvent::browse(Some(persona.id), url, at))
            .chain(
                plan.products_to_browse
                    .into_iter()
                    .map(|product| NoiseEvent::shop(Some(persona.id), product, at)),
            )
            .collect();

        self.queue.push_all(events).await?;
        StatsCounters::add(&self.stats.pages_generated, page_count);
        StatsCounters::add(&self.stats.products_generated, product_count);

        info!(pages = page_count, products = product_count, persona_id = %persona.id, "generated browsing noise");
        Ok(CycleOutcome::Completed)
    }

    fn interval(&self, kind: LoopKind) -> Duration {
        let scheduler = &self.config.scheduler;
        match kind {
            LoopKind::Search => scheduler.search_interval(),
            LoopKind::Browsing => scheduler.browsing_interval(),
            LoopKind::Persona => scheduler.persona_check_interval(),
            LoopKind::Cleanup => scheduler.cleanup_interval(),
        }
    }

    async fn run_loop(self: Arc<Self>, kind: LoopKind) {
        let loop_name = kind.as_str();
        info!(loop_name, "noise loop started");

        loop {
            let outcome = AssertUnwindSafe(self.run_cycle(kind)).catch_unwind().await;
            let wait = match outcome {
                Ok(Ok(CycleOutcome::Completed)) => self.interval(kind),
                Ok(Ok(CycleOutcome::Skipped(reason))) => {
                    debug!(loop_name, reason, "noise cycle skipped");
                    self.config.scheduler.idle_recheck()
                }
                Ok(Err(err)) => {
                    self.stats.loop_failures.fetch_add(1, Ordering::Relaxed);
                    error!(loop_name, error = %err, "noise loop iteration failed");
                    self.interval(kind)
                }
                Err(panic) => {
                    self.stats.loop_failures.fetch_add(1, Ordering::Relaxed);
                    error!(loop_name, panic = %panic_message(panic.as_ref()), "noise loop iteration panicked");
                    self.interval(kind)
                }
            };

            if wait.is_zero() {
                warn!(loop_name, "zero loop interval, yielding instead of sleeping");
                tokio::task::yield_now().await;
            } else {
                self.clock.sleep(wait).await;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use crate::adapters::generators::MockGenerator;
    use crate::adapters::memory::{InMemoryNoiseEventRepository, InMemoryPersonaRepository};
    use crate::domain::errors::GeneratorError;
    use crate::domain::models::GenerationKind;
    use chrono::{DateTime, TimeZone, Utc};

    const PERSONA_JSON: &str = r#"{"name":"Ann Lee","age":33,"location":"Reno, NV","occupation":"nurse","interests":["bouldering","podcasts"]}"#;

    struct Harness {
        scheduler: Arc<NoiseScheduler>,
        generator: Arc<MockGenerator>,
        events: Arc<InMemoryNoiseEventRepository>,
        personas: Arc<InMemoryPersonaRepository>,
        clock: Arc<ManualClock>,
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn harness(config: Config, generator: MockGenerator, start: DateTime<Utc>) -> Harness {
        let generator = Arc::new(generator);
        let events = Arc::new(InMemoryNoiseEventRepository::new());
        let personas = Arc::new(InMemoryPersonaRepository::new());
        let clock = Arc::new(ManualClock::new(start));
        let scheduler = Arc::new(NoiseScheduler::new(
            config,
            generator.clone(),
            events.clone(),
            personas.clone(),
            clock.clone(),
        ));
        Harness {
            scheduler,
            generator,
            events,
            personas,
            clock,
        }
    }

    fn default_mock() -> MockGenerator {
        MockGenerator::new()
            .with_default(GenerationKind::Persona, PERSONA_JSON)
            .with_default(GenerationKind::SearchQueries, r#"["a","b","c","d","e","f","g"]"#)
            .with_default(
                GenerationKind::BrowsingPlan,
                r#"{"urls_to_visit":["https://1.example","https://2.example"],"products_to_browse":["tent","stove","lamp","rope"]}"#,
            )
            .with_default(GenerationKind::FormData, r#"{"first_name":"Ann","last_name":"Lee","email":"ann@example.com"}"#)
    }

    #[tokio::test]
    async fn test_rotation_scenario_four_hours() {
        let h = harness(Config::default(), default_mock(), noon());

        assert!(h.scheduler.check_rotation().await.unwrap());
        assert_eq!(h.scheduler.stats().persona_rotations, 1);

        h.clock.advance(Duration::from_secs(3 * 3600 + 59 * 60));
        assert!(!h.scheduler.check_rotation().await.unwrap());
        assert_eq!(h.scheduler.stats().persona_rotations, 1);

        h.clock.set(noon() + chrono::Duration::minutes(4 * 60 + 1));
        assert!(h.scheduler.check_rotation().await.unwrap());
        assert_eq!(h.scheduler.stats().persona_rotations, 2);
        assert_eq!(h.personas.list().await.unwrap().iter().filter(|p| p.is_active).count(), 1);
    }

    fn sibling(h: &Harness) -> NoiseScheduler {
        NoiseScheduler::new(
            Config::default(),
            Arc::new(default_mock()),
            h.events.clone(),
            h.personas.clone(),
            h.clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_rotation_forced_elsewhere_resets_policy_clock() {
        let h = harness(Config::default(), default_mock(), noon());
        assert!(h.scheduler.check_rotation().await.unwrap());

        h.clock.set(noon() + chrono::Duration::minutes(3 * 60 + 50));
        let forced = sibling(&h).force_rotation().await.unwrap();

        h.clock.set(noon() + chrono::Duration::minutes(4 * 60 + 1));
        assert!(!h.scheduler.check_rotation().await.unwrap());
        assert_eq!(h.scheduler.current_persona().await, Some(forced.summary()));

        h.clock.set(noon() + chrono::Duration::minutes(3 * 60 + 50 + 4 * 60 + 1));
        assert!(h.scheduler.check_rotation().await.unwrap());
        assert_eq!(h.scheduler.stats().persona_rotations, 2);
    }

    #[tokio::test]
    async fn test_restart_keeps_recent_persona() {
        let h = harness(Config::default(), default_mock(), noon());
        let existing = h.scheduler.force_rotation().await.unwrap();

        h.clock.advance(Duration::from_secs(60));
        let restarted = sibling(&h);
        assert!(!restarted.check_rotation().await.unwrap());
        assert_eq!(restarted.current_persona().await, Some(existing.summary()));
        assert_eq!(restarted.stats().persona_rotations, 0);
    }

    #[tokio::test]
    async fn test_rotation_enqueues_persona_event() {
        let h = harness(Config::default(), default_mock(), noon());
        let persona = h.scheduler.force_rotation().await.unwrap();

        let events = h.scheduler.pop_noise(Some(NoiseEventType::PersonaRotate), 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].persona_id, Some(persona.id));
        assert_eq!(events[0].primary_value(), Some(persona.summary().as_str()));
        assert_eq!(h.scheduler.current_persona().await, Some(persona.summary()));
    }

    #[tokio::test]
    async fn test_search_cycle_skips_without_persona() {
        let h = harness(Config::default(), default_mock(), noon());
        let outcome = h.scheduler.run_cycle(LoopKind::Search).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Skipped("no active persona"));
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_cycle_skips_outside_active_hours() {
        let h = harness(Config::default(), default_mock(), noon());
        h.scheduler.force_rotation().await.unwrap();
        h.clock.set(Utc.with_ymd_and_hms(2024, 6, 1, 23, 0, 0).unwrap());

        let outcome = h.scheduler.run_cycle(LoopKind::Search).await.unwrap();
        assert_eq!(outcome, CycleOutcome::Skipped("outside active hours"));
    }

    #[tokio::test]
    async fn test_search_cycle_caps_and_counts() {
        let h = harness(Config::default(), default_mock(), noon());
        let persona = h.scheduler.force_rotation().await.unwrap();

        assert_eq!(h.scheduler.run_cycle(LoopKind::Search).await.unwrap(), CycleOutcome::Completed);
        let searches = h.events.query_undelivered(Some(NoiseEventType::Search), 100).await.unwrap();
        assert_eq!(searches.len(), 5);
        assert!(searches.iter().all(|e| e.persona_id == Some(persona.id)));
        assert_eq!(h.scheduler.stats().searches_generated, 5);
    }

    #[tokio::test]
    async fn test_browsing_cycle_emits_browse_and_shop() {
        let h = harness(Config::default(), default_mock(), noon());
        h.scheduler.force_rotation().await.unwrap();

        h.scheduler.run_cycle(LoopKind::Browsing).await.unwrap();
        assert_eq!(h.events.count_undelivered(Some(NoiseEventType::Browse)).await.unwrap(), 2);
        assert_eq!(h.events.count_undelivered(Some(NoiseEventType::Shop)).await.unwrap(), 3);

        let stats = h.scheduler.stats();
        assert_eq!((stats.pages_generated, stats.products_generated), (2, 3));
    }

    #[tokio::test]
    async fn test_generator_failure_surfaces_from_cycle() {
        let mock = default_mock();
        let h = harness(Config::default(), mock, noon());
        h.scheduler.force_rotation().await.unwrap();
        for _ in 0..3 {
            h.generator.push_err(GeneratorError::Transient("timeout".into()));
        }

        let err = h.scheduler.run_cycle(LoopKind::Search).await.unwrap_err();
        assert!(matches!(err, DomainError::Generation(_)));
        assert_eq!(h.scheduler.stats().searches_generated, 0);
    }

    #[tokio::test]
    async fn test_form_data_requires_active_persona() {
        let h = harness(Config::default(), default_mock(), noon());
        assert!(matches!(h.scheduler.form_data().await, Err(DomainError::NoActivePersona)));

        h.scheduler.force_rotation().await.unwrap();
        assert_eq!(h.scheduler.form_data().await.unwrap().first_name, "Ann");
    }

    #[tokio::test]
    async fn test_fingerprint_uses_injected_clock() {
        let h = harness(Config::default(), default_mock(), noon());
        let expected = fingerprint_at(noon(), 30 * 60);
        assert_eq!(h.scheduler.fingerprint(), expected);
    }

    #[tokio::test]
    async fn test_disabled_scheduler_does_not_start() {
        let mut config = Config::default();
        config.scheduler.enabled = false;
        let h = harness(config, default_mock(), noon());

        assert!(!h.scheduler.start().await);
        assert!(!h.scheduler.is_running());
        h.scheduler.stop().await;
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
