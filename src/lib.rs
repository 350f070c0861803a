//! Phantom - persona-driven decoy traffic generator
//!
//! Phantom keeps a synthetic persona active and continuously generates
//! plausible search queries, page visits and product views in that persona's
//! voice. A consumer (typically a browser extension) pops the queued events
//! and acts them out, burying real activity in coherent noise.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, port traits and errors
//! - **Adapters** (`adapters`): SQLite and in-memory stores, LLM backends, clocks
//! - **Service Layer** (`services`): retrying generation, the noise queue and the scheduler
//! - **Infrastructure Layer** (`infrastructure`): configuration loading and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use phantom::adapters::{generators::build_generator, sqlite, SystemClock};
//! use phantom::{ConfigLoader, NoiseScheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let pool = sqlite::initialize_database(&config.database).await?;
//!     let scheduler = Arc::new(NoiseScheduler::new(
//!         config.clone(),
//!         build_generator(&config.llm)?,
//!         Arc::new(sqlite::SqliteNoiseEventRepository::new(pool.clone())),
//!         Arc::new(sqlite::SqlitePersonaRepository::new(pool)),
//!         Arc::new(SystemClock),
//!     ));
//!     scheduler.start().await;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult, GenerationError, GeneratorError};
pub use domain::models::{
    fingerprint, fingerprint_at, Config, FingerprintProfile, FormData, NoiseEvent, NoiseEventType,
    Persona, PersonaProfile, SchedulerStats,
};
pub use infrastructure::config::ConfigLoader;
pub use services::{NoiseQueue, NoiseScheduler, SchedulerStatus};
