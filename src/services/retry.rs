//! Retry wrapper around a content generator.
//!
//! Two independent envelopes:
//! - [`RetryingGenerator::generate`] retries transient transport failures with
//!   exponential backoff. Permanent failures propagate at once.
//! - [`RetryingGenerator::generate_structured`] re-asks the generator when the
//!   output cannot be decoded. Each of its attempts runs the full transport
//!   envelope.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult, GenerationError, GeneratorError};
use crate::domain::models::{
    BrowsingPlan, FormData, GeneratedContent, GenerationRequest, PersonaProfile, RetryConfig,
};
use crate::domain::ports::{Clock, ContentGenerator};

/// Retry policy with exponential backoff.
///
/// Backoff before retry `k` (0-based) is `initial * 2^k`, capped at the max:
/// 1s, 2s, 4s with the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts per call
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl RetryPolicy {
    /// A zero `max_retries` is raised to one attempt.
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            initial_backoff_ms,
            max_backoff_ms: max_backoff_ms.max(initial_backoff_ms),
        }
    }

    /// Total transport attempts per request.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Calculate exponential backoff duration for a given retry
    ///
    /// Formula: min(initial_backoff * 2^attempt, max_backoff)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }
}

/// Content generator wrapped in the retry envelopes.
pub struct RetryingGenerator {
    inner: Arc<dyn ContentGenerator>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl RetryingGenerator {
    /// Wrap `inner` with `policy`, sleeping on `clock` between attempts.
    pub fn new(inner: Arc<dyn ContentGenerator>, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { inner, policy, clock }
    }

    /// The transport retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Raw text, retrying transient failures.
    ///
    /// No wait follows the final failed attempt.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut attempt: u32 = 0;

        loop {
            match self.inner.generate(request).await {
                Ok(text) => {
                    if attempt > 0 {
                        debug!(backend = self.inner.name(), attempt = attempt + 1, "generation succeeded after retry");
                    }
                    return Ok(text);
                }
                Err(GeneratorError::Permanent(message)) => {
                    debug!(backend = self.inner.name(), error = %message, "permanent generator error, not retrying");
                    return Err(GenerationError::Permanent(message));
                }
                Err(GeneratorError::Transient(message)) => {
                    let attempts = attempt + 1;
                    if attempts >= self.policy.max_retries {
                        warn!(backend = self.inner.name(), attempts, error = %message, "generator failed after all retries");
                        return Err(GenerationError::Transient { attempts, message });
                    }

                    let backoff = self.policy.calculate_backoff(attempt);
                    warn!(
                        backend = self.inner.name(),
                        attempt = attempts,
                        wait_ms = backoff.as_millis() as u64,
                        error = %message,
                        "transient generator error, retrying"
                    );
                    self.clock.sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Decoded content, re-asking the generator when the output is malformed.
    ///
    /// Transport failures inside an attempt are not counted here; they
    /// consume their own backoff sequence and propagate if exhausted.
    pub async fn generate_structured(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedContent, GenerationError> {
        let kind = request.kind();
        let max = self.policy.max_retries;
        let mut last_raw = String::new();

        for attempt in 1..=max {
            let raw = self.generate(request).await?;
            match GeneratedContent::parse(kind, &raw) {
                Ok(content) => return Ok(content),
                Err(err) => {
                    warn!(kind = kind.as_str(), attempt, max_attempts = max, error = %err, "malformed generator output");
                    last_raw = raw;
                }
            }
        }

        Err(GenerationError::malformed(max, &last_raw))
    }

    /// Generate a persona profile, optionally steered by `hint`.
    pub async fn persona(&self, hint: Option<String>) -> DomainResult<PersonaProfile> {
        match self.generate_structured(&GenerationRequest::Persona { hint }).await? {
            GeneratedContent::Persona(profile) => Ok(profile),
            other => Err(unexpected("persona", &other)),
        }
    }

    /// Generate up to `count` search queries for the persona.
    pub async fn search_queries(&self, persona_summary: &str, count: usize) -> DomainResult<Vec<String>> {
        let request = GenerationRequest::SearchQueries {
            persona_summary: persona_summary.to_string(),
            count,
        };
        match self.generate_structured(&request).await? {
            GeneratedContent::SearchQueries(queries) => Ok(queries),
            other => Err(unexpected("search_queries", &other)),
        }
    }

    /// Generate a browsing plan of pages and products for the persona.
    pub async fn browsing_plan(
        &self,
        persona_summary: &str,
        pages: usize,
        products: usize,
    ) -> DomainResult<BrowsingPlan> {
        let request = GenerationRequest::BrowsingPlan {
            persona_summary: persona_summary.to_string(),
            pages,
            products,
        };
        match self.generate_structured(&request).await? {
            GeneratedContent::BrowsingPlan(plan) => Ok(plan),
            other => Err(unexpected("browsing_plan", &other)),
        }
    }

    /// Generate form-fill data consistent with the persona.
    pub async fn form_data(&self, persona_summary: &str) -> DomainResult<FormData> {
        let request = GenerationRequest::FormData {
            persona_summary: persona_summary.to_string(),
        };
        match self.generate_structured(&request).await? {
            GeneratedContent::FormData(data) => Ok(data),
            other => Err(unexpected("form_data", &other)),
        }
    }
}

fn unexpected(expected: &'static str, actual: &GeneratedContent) -> DomainError {
    DomainError::UnexpectedContent {
        expected,
        actual: actual.kind().as_str(),
    }
}
