//! Chat-completion client used to answer queries over extracted document text.
//!
//! The pipeline builds one prompt per request and sends it as a single user message. There is
//! no token budgeting, truncation, streaming or retry; the first choice is returned verbatim.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while requesting a completion.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP client could not be constructed or the provider could not be reached.
    #[error("Completion provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion ({status}): {body}")]
    GenerationFailed {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider response could not be parsed or carried no answer.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by chat-completion providers.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as a single user message and return the answer text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Assemble the prompt sent for a query over the combined document text.
pub fn build_prompt(query: &str, document_text: &str) -> String {
    format!("{query}\n\nDocument Content:\n{document_text}")
}

/// OpenAI-compatible `chat/completions` client.
pub struct OpenAiClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
}

impl OpenAiClient {
    /// Construct a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .user_agent("docbridge/completion")
            .build()
            .map_err(|error| CompletionError::ProviderUnavailable(error.to_string()))?;
        tracing::debug!(
            base_url = %config.openai_base_url,
            model = %config.openai_model,
            has_api_key = !config.openai_api_key.is_empty(),
            "Initialized completion client"
        );
        Ok(Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            model: config.openai_model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Requesting completion");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                CompletionError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.endpoint()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = CompletionError::GenerationFailed { status, body };
            tracing::error!(error = %error, "Completion request failed");
            return Err(error);
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            CompletionError::InvalidResponse(format!("failed to decode completion: {error}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("response carried no content".into()))
    }
}
