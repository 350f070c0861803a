//! Domain errors for the Phantom noise engine.

use thiserror::Error;
use uuid::Uuid;

/// Maximum number of characters of a raw response kept for diagnostics.
pub const RAW_PREVIEW_CHARS: usize = 300;

/// Failure reported by a single call into a content generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeneratorError {
    /// Network, timeout, rate limit or server-side failure. Worth retrying.
    #[error("transient generator failure: {0}")]
    Transient(String),

    /// Client error, bad credentials or an unreadable response envelope.
    #[error("generator failure: {0}")]
    Permanent(String),
}

impl GeneratorError {
    /// Returns true if this error should be retried with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Failure of the retrying generation envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("content generator failed after {attempts} attempts: {message}")]
    Transient { attempts: u32, message: String },

    #[error("content generator returned malformed output after {attempts} attempts: {preview}")]
    Malformed { attempts: u32, preview: String },

    #[error("content generator failed: {0}")]
    Permanent(String),
}

impl GenerationError {
    /// Build a `Malformed` error, keeping only a short preview of the raw text.
    pub fn malformed(attempts: u32, raw: &str) -> Self {
        Self::Malformed {
            attempts,
            preview: raw.chars().take(RAW_PREVIEW_CHARS).collect(),
        }
    }
}

/// Domain-level errors that can occur in the Phantom system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Persona not found: {0}")]
    PersonaNotFound(Uuid),

    #[error("No active persona")]
    NoActivePersona,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Unexpected generated content: expected {expected}, got {actual}")]
    UnexpectedContent {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::PersistenceError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
