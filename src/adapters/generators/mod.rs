//! Content generator adapters.
//!
//! Each backend makes a single HTTP call per `generate` and classifies
//! failures: timeouts, connection errors, 429 and 5xx are transient; any
//! other non-success status or an unreadable envelope is permanent.

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod prompts;

pub use mock::MockGenerator;
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

use reqwest::StatusCode;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult, GeneratorError};
use crate::domain::models::{LlmBackend, LlmConfig};
use crate::domain::ports::ContentGenerator;

/// Build the configured backend.
pub fn build_generator(config: &LlmConfig) -> DomainResult<Arc<dyn ContentGenerator>> {
    match config.backend {
        LlmBackend::Ollama => Ok(Arc::new(OllamaGenerator::new(config)?)),
        LlmBackend::Openai => {
            let api_key = config.resolved_openai_key().ok_or_else(|| {
                DomainError::ValidationFailed("OpenAI backend selected but no API key configured".to_string())
            })?;
            Ok(Arc::new(OpenAiGenerator::new(config, api_key)?))
        }
    }
}

pub(crate) fn http_client(timeout_secs: u64) -> DomainResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DomainError::ValidationFailed(format!("Failed to create HTTP client: {}", e)))
}

/// Classify a failure to get any response at all.
pub(crate) fn classify_send_error(backend: &str, err: &reqwest::Error) -> GeneratorError {
    if err.is_builder() {
        GeneratorError::Permanent(format!("{backend} request invalid: {err}"))
    } else {
        GeneratorError::Transient(format!("{backend} request failed: {err}"))
    }
}

/// Classify a non-success HTTP status.
pub(crate) fn classify_status(backend: &str, status: StatusCode, body: &str) -> GeneratorError {
    let preview: String = body.chars().take(200).collect();
    let message = format!("{backend} API error {status}: {preview}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        GeneratorError::Transient(message)
    } else {
        GeneratorError::Permanent(message)
    }
}
