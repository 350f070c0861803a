use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{Config, LlmBackend};

/// Project config file, created by `phantom config init`
pub const PROJECT_CONFIG_PATH: &str = ".phantom/config.yaml";

/// Optional local overrides, not meant to be committed
pub const LOCAL_CONFIG_PATH: &str = ".phantom/local.yaml";

/// Environment variable prefix; nested keys use `__` (e.g. `PHANTOM_NOISE__SEARCHES_PER_CYCLE`)
pub const ENV_PREFIX: &str = "PHANTOM_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {field}: {value}. Must be between 0 and 23")]
    InvalidHour { field: &'static str, value: u32 },

    #[error("Invalid {0}: must be greater than 0")]
    ZeroValue(&'static str),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error("Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})")]
    InvalidBackoff(u64, u64),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("OpenAI backend selected but no API key configured (set llm.openai_api_key or OPENAI_API_KEY)")]
    MissingOpenAiKey,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .phantom/config.yaml (project config, created by init)
    /// 3. .phantom/local.yaml (project local overrides, optional)
    /// 4. Environment variables (PHANTOM_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG_PATH))
            .merge(Yaml::file(LOCAL_CONFIG_PATH))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file instead of the project files.
    /// Environment overrides still apply.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// `load_from_file` when a path is given, `load` otherwise.
    pub fn load_with_override(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Write the default configuration as YAML, creating parent directories.
    /// Refuses to overwrite an existing file.
    pub fn write_default(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            anyhow::bail!("Config file already exists: {}", path.display());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let yaml = serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
        std::fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let scheduler = &config.scheduler;
        for (field, value) in [
            ("active_hours_start", scheduler.active_hours_start),
            ("active_hours_end", scheduler.active_hours_end),
        ] {
            if value > 23 {
                return Err(ConfigError::InvalidHour { field, value });
            }
        }

        let non_zero = [
            ("search_interval_mins", scheduler.search_interval_mins),
            ("browsing_interval_mins", scheduler.browsing_interval_mins),
            ("persona_check_secs", scheduler.persona_check_secs),
            ("cleanup_interval_secs", scheduler.cleanup_interval_secs),
            ("idle_recheck_secs", scheduler.idle_recheck_secs),
            ("searches_per_cycle", config.noise.searches_per_cycle as u64),
            ("pages_per_cycle", config.noise.pages_per_cycle as u64),
            ("products_per_cycle", config.noise.products_per_cycle as u64),
            ("persona_rotation_hours", config.noise.persona_rotation_hours),
            ("rotation_interval_mins", config.fingerprint.rotation_interval_mins),
            ("timeout_secs", config.llm.timeout_secs),
        ];
        if let Some((field, _)) = non_zero.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ZeroValue(*field));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        if config.llm.backend == LlmBackend::Openai && config.llm.resolved_openai_key().is_none() {
            return Err(ConfigError::MissingOpenAiKey);
        }

        Ok(())
    }
}
