//! CLI command implementations.

pub mod config;
pub mod fingerprint;
pub mod form_data;
pub mod noise;
pub mod persona;
pub mod run;
pub mod status;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::adapters::generators::build_generator;
use crate::adapters::sqlite::{initialize_database, SqliteNoiseEventRepository, SqlitePersonaRepository};
use crate::adapters::SystemClock;
use crate::domain::models::Config;
use crate::domain::ports::{NoiseEventRepository, PersonaRepository};
use crate::infrastructure::config::ConfigLoader;
use crate::services::NoiseScheduler;

/// Load and validate configuration, honouring `--config`.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    ConfigLoader::load_with_override(path)
}

/// Repositories backed by the configured SQLite database.
pub struct Stores {
    /// Noise event store.
    pub events: Arc<dyn NoiseEventRepository>,
    /// Persona store.
    pub personas: Arc<dyn PersonaRepository>,
}

/// Open the configured database and wrap it in repositories.
pub async fn open_stores(config: &Config) -> Result<Stores> {
    let pool = initialize_database(&config.database)
        .await
        .with_context(|| format!("Failed to initialize database at {}", config.database.path))?;
    Ok(Stores {
        events: Arc::new(SqliteNoiseEventRepository::new(pool.clone())),
        personas: Arc::new(SqlitePersonaRepository::new(pool)),
    })
}

/// Wire a scheduler from configuration: SQLite stores, the configured
/// generator backend and the system clock.
pub async fn build_scheduler(config: Config) -> Result<Arc<NoiseScheduler>> {
    let stores = open_stores(&config).await?;
    let generator = build_generator(&config.llm).context("Failed to build content generator")?;
    Ok(Arc::new(NoiseScheduler::new(
        config,
        generator,
        stores.events,
        stores.personas,
        Arc::new(SystemClock),
    )))
}
