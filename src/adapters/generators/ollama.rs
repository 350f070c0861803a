//! Ollama content generator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompts::render;
use super::{classify_send_error, classify_status, http_client};
use crate::domain::errors::{DomainResult, GeneratorError};
use crate::domain::models::{GenerationRequest, LlmConfig};
use crate::domain::ports::ContentGenerator;

const BACKEND: &str = "ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Talks to `POST {base_url}/api/generate` with streaming disabled.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    /// Client for the configured Ollama endpoint and model.
    pub fn new(config: &LlmConfig) -> DomainResult<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ContentGenerator for OllamaGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        let prompt = render(request);
        let body = GenerateRequest {
            model: &self.model,
            system: &prompt.system,
            prompt: &prompt.user,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(BACKEND, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(BACKEND, status, &body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Permanent(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::debug!(model = %self.model, kind = request.kind().as_str(), chars = parsed.response.len(), "ollama generation complete");
        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }
}
