//! Scripted content generator for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::errors::GeneratorError;
use crate::domain::models::{GenerationKind, GenerationRequest};
use crate::domain::ports::ContentGenerator;

/// Replays queued responses in order, then falls back to a per-kind default.
///
/// With no script and no default for a kind, returns a permanent error.
#[derive(Default)]
pub struct MockGenerator {
    script: Mutex<VecDeque<Result<String, GeneratorError>>>,
    defaults: Mutex<Vec<(GenerationKind, String)>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    /// Generator with no scripted results or defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_ok(&self, text: impl Into<String>) -> &Self {
        self.push(Ok(text.into()))
    }

    /// Queue a failure.
    pub fn push_err(&self, err: GeneratorError) -> &Self {
        self.push(Err(err))
    }

    fn push(&self, result: Result<String, GeneratorError>) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(result);
        }
        self
    }

    /// Response used for `kind` once the script is exhausted.
    pub fn with_default(self, kind: GenerationKind, text: impl Into<String>) -> Self {
        if let Ok(mut defaults) = self.defaults.lock() {
            defaults.retain(|(k, _)| *k != kind);
            defaults.push((kind, text.into()));
        }
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContentGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let scripted = self.script.lock().ok().and_then(|mut s| s.pop_front());
        if let Some(result) = scripted {
            return result;
        }

        let kind = request.kind();
        self.defaults
            .lock()
            .ok()
            .and_then(|d| d.iter().find(|(k, _)| *k == kind).map(|(_, text)| text.clone()))
            .ok_or_else(|| GeneratorError::Permanent(format!("no mock response for {}", kind.as_str())))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_request() -> GenerationRequest {
        GenerationRequest::SearchQueries {
            persona_summary: "x".into(),
            count: 2,
        }
    }

    #[tokio::test]
    async fn test_script_then_default() {
        let mock = MockGenerator::new().with_default(GenerationKind::SearchQueries, "[\"d\"]");
        mock.push_err(GeneratorError::Transient("boom".into())).push_ok("[\"a\"]");

        assert!(mock.generate(&search_request()).await.unwrap_err().is_transient());
        assert_eq!(mock.generate(&search_request()).await.unwrap(), "[\"a\"]");
        assert_eq!(mock.generate(&search_request()).await.unwrap(), "[\"d\"]");
        assert_eq!(mock.calls(), 3);
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_default_is_permanent() {
        let mock = MockGenerator::new();
        let err = mock.generate(&GenerationRequest::Persona { hint: None }).await.unwrap_err();
        assert!(!err.is_transient());
    }
}
