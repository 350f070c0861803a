//! OpenAI-compatible chat completions generator.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

use super::prompts::render;
use super::{classify_send_error, classify_status, http_client};
use crate::domain::errors::{DomainResult, GeneratorError};
use crate::domain::models::{GenerationRequest, LlmConfig};
use crate::domain::ports::ContentGenerator;

const BACKEND: &str = "openai";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Talks to `POST {base_url}/chat/completions`.
pub struct OpenAiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Client for the configured OpenAI-compatible endpoint, authenticating with `api_key`.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            api_key: api_key.into(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GeneratorError> {
        let prompt = render(request);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_send_error(BACKEND, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(BACKEND, status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Permanent(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GeneratorError::Permanent("OpenAI response contained no choices".to_string()))?;

        tracing::debug!(model = %self.model, kind = request.kind().as_str(), chars = text.len(), "openai generation complete");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }
}
