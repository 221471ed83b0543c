//! Client for the Ollama chat API.

use crate::config::OllamaConfig;
use habla_types::{Message, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Timeout for the lightweight `/api/tags` probe.
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum OllamaError {
    #[error("Ollama request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Ollama returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Ollama returned an empty response")]
    EmptyResponse,
}

/// A locally installed model as reported by `/api/tags`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: u64,
    pub modified: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    modified_at: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: ChatOptions<'a>,
}

#[derive(Serialize)]
struct ChatOptions<'a> {
    temperature: f32,
    seed: i64,
    num_predict: u32,
    stop: &'a [String],
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Talks to one Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    config: OllamaConfig,
    system_message: String,
}

impl OllamaClient {
    /// Builds a client for `config`, prepending `system_message` to any
    /// history sent without one.
    pub fn new(config: OllamaConfig, system_message: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: config.base_url(),
            config,
            system_message: system_message.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_tags(&self) -> Result<TagsResponse, OllamaError> {
        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Whether the API answers `/api/tags` with a success status.
    pub async fn is_connected(&self) -> bool {
        match self.fetch_tags().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "ollama health probe failed");
                false
            }
        }
    }

    /// Lists the installed models.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, OllamaError> {
        let tags = self.fetch_tags().await?;
        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name,
                size: m.size,
                modified: m.modified_at,
            })
            .collect())
    }

    /// Sends `messages` to `model` and returns the reply text.
    ///
    /// # Errors
    ///
    /// `Request` on transport failure, `Status` on a non-2xx answer and
    /// `EmptyResponse` when the model produced no content.
    pub async fn chat(&self, messages: &[Message], model: &str) -> Result<String, OllamaError> {
        let with_system;
        let messages = match messages.first() {
            Some(first) if first.role == Role::System => messages,
            _ => {
                let mut prefixed = Vec::with_capacity(messages.len() + 1);
                prefixed.push(Message::system(self.system_message.as_str()));
                prefixed.extend_from_slice(messages);
                with_system = prefixed;
                &with_system
            }
        };

        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                seed: self.config.seed,
                num_predict: self.config.num_predict,
                stop: &self.config.stop,
            },
        };

        tracing::info!(model, messages = messages.len(), "sending chat request to ollama");

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let content = reply
            .message
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(OllamaError::EmptyResponse);
        }

        let preview: String = content.chars().take(50).collect();
        tracing::debug!(model, preview = %preview, "received chat reply");
        Ok(content)
    }
}
