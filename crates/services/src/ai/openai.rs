use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionClient, CompletionConfig};
use crate::error::{CompletionError, ConfigError};

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    config: Option<CompletionConfig>,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns `ConfigError` if the environment holds unparsable settings
    /// or the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(CompletionConfig::from_env()?)
    }

    /// A client honoring the configured timeout; disabled when `config` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::HttpClient` if the HTTP client cannot be built.
    pub fn new(config: Option<CompletionConfig>) -> Result<Self, ConfigError> {
        let client = match &config {
            Some(c) => Client::builder()
                .timeout(c.timeout)
                .build()
                .map_err(ConfigError::HttpClient)?,
            None => Client::new(),
        };
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn generate_completion(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, CompletionError> {
        let config = self.config.as_ref().ok_or(CompletionError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature,
        };

        debug!(model = %config.model, %url, "sending completion request");
        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
