use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Phantom
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Content generator (LLM) configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Noise loop timing configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Per-cycle noise volumes and persona lifetime
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Fingerprint rotation configuration
    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Noise queue capacity policy
    #[serde(default)]
    pub queue: QueueConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which content generator backend to call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server.
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions API.
    Openai,
}

/// Content generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Which LLM backend to use.
    #[serde(default)]
    pub backend: LlmBackend,

    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Ollama model name.
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// API key (can also be set via OPENAI_API_KEY env var)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    /// OpenAI model name.
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Base URL for OpenAI-compatible APIs (for proxies and local servers)
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_llm_timeout() -> u64 {
    120
}

const fn default_temperature() -> f32 {
    0.9
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            ollama_url: default_ollama_url(),
            ollama_model: default_ollama_model(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: default_openai_base_url(),
            timeout_secs: default_llm_timeout(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// API key from config or environment.
    pub fn resolved_openai_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Noise loop timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// When false, `start()` does nothing
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minutes between search generation cycles
    #[serde(default = "default_search_interval")]
    pub search_interval_mins: u64,

    /// Minutes between browsing/shopping generation cycles
    #[serde(default = "default_browsing_interval")]
    pub browsing_interval_mins: u64,

    /// First active hour (UTC, 0-23)
    #[serde(default = "default_active_start")]
    pub active_hours_start: u32,

    /// Hour at which activity stops (UTC, 0-23, exclusive)
    #[serde(default = "default_active_end")]
    pub active_hours_end: u32,

    /// Seconds between persona rotation checks
    #[serde(default = "default_persona_check")]
    pub persona_check_secs: u64,

    /// Seconds between delivered-event cleanups
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,

    /// Seconds to wait after a skipped cycle (inactive hours, no persona)
    #[serde(default = "default_idle_recheck")]
    pub idle_recheck_secs: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_search_interval() -> u64 {
    10
}

const fn default_browsing_interval() -> u64 {
    15
}

const fn default_active_start() -> u32 {
    8
}

const fn default_active_end() -> u32 {
    22
}

const fn default_persona_check() -> u64 {
    60
}

const fn default_cleanup_interval() -> u64 {
    300
}

const fn default_idle_recheck() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            search_interval_mins: default_search_interval(),
            browsing_interval_mins: default_browsing_interval(),
            active_hours_start: default_active_start(),
            active_hours_end: default_active_end(),
            persona_check_secs: default_persona_check(),
            cleanup_interval_secs: default_cleanup_interval(),
            idle_recheck_secs: default_idle_recheck(),
        }
    }
}

impl SchedulerConfig {
    /// Pause between search cycles.
    pub fn search_interval(&self) -> Duration {
        Duration::from_secs(self.search_interval_mins * 60)
    }

    /// Pause between browsing cycles.
    pub fn browsing_interval(&self) -> Duration {
        Duration::from_secs(self.browsing_interval_mins * 60)
    }

    /// Pause between persona rotation checks.
    pub fn persona_check_interval(&self) -> Duration {
        Duration::from_secs(self.persona_check_secs)
    }

    /// Pause between cleanup runs.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Pause after a skipped cycle.
    pub fn idle_recheck(&self) -> Duration {
        Duration::from_secs(self.idle_recheck_secs)
    }
}

/// Per-cycle noise volumes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NoiseConfig {
    /// Search queries kept per cycle.
    #[serde(default = "default_searches_per_cycle")]
    pub searches_per_cycle: usize,

    /// Page visits kept per cycle.
    #[serde(default = "default_pages_per_cycle")]
    pub pages_per_cycle: usize,

    /// Product views kept per cycle.
    #[serde(default = "default_products_per_cycle")]
    pub products_per_cycle: usize,

    /// Hours a persona stays active before rotation
    #[serde(default = "default_rotation_hours")]
    pub persona_rotation_hours: u64,
}

const fn default_searches_per_cycle() -> usize {
    5
}

const fn default_pages_per_cycle() -> usize {
    8
}

const fn default_products_per_cycle() -> usize {
    3
}

const fn default_rotation_hours() -> u64 {
    4
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            searches_per_cycle: default_searches_per_cycle(),
            pages_per_cycle: default_pages_per_cycle(),
            products_per_cycle: default_products_per_cycle(),
            persona_rotation_hours: default_rotation_hours(),
        }
    }
}

/// Fingerprint rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FingerprintConfig {
    /// Minutes each fingerprint stays stable
    #[serde(default = "default_fingerprint_rotation")]
    pub rotation_interval_mins: u64,
}

const fn default_fingerprint_rotation() -> u64 {
    30
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            rotation_interval_mins: default_fingerprint_rotation(),
        }
    }
}

impl FingerprintConfig {
    /// Fingerprint bucket width in seconds.
    pub fn rotation_interval_secs(&self) -> u64 {
        self.rotation_interval_mins * 60
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of attempts per call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Noise queue capacity policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QueueConfig {
    /// Maximum undelivered events kept; the oldest are dropped beyond this. 0 = unbounded
    #[serde(default = "default_max_pending")]
    pub max_pending: u64,

    /// Undelivered depth above which every push logs a warning
    #[serde(default = "default_depth_warning")]
    pub depth_warning: u64,
}

const fn default_max_pending() -> u64 {
    10_000
}

const fn default_depth_warning() -> u64 {
    1_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
            depth_warning: default_depth_warning(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".phantom/phantom.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// sqlx connection URL for the database file.
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_log_rotation(),
        }
    }
}
