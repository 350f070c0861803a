pub mod config;
pub mod fingerprint;
pub mod generation;
pub mod noise_event;
pub mod persona;
pub mod stats;

pub use config::{
    Config, DatabaseConfig, FingerprintConfig, LlmBackend, LlmConfig, LoggingConfig, NoiseConfig,
    QueueConfig, RetryConfig, SchedulerConfig,
};
pub use fingerprint::{fingerprint, fingerprint_at, FingerprintProfile};
pub use generation::{
    extract_structured_block, BrowsingPlan, DecodeError, FormData, GeneratedContent,
    GenerationKind, GenerationRequest,
};
pub use noise_event::{NoiseEvent, NoiseEventType};
pub use persona::{Persona, PersonaProfile};
pub use stats::SchedulerStats;
