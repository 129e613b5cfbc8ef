use std::env;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{CompletionError, ConfigError};

pub mod openai;

pub use openai::OpenAiClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Sends one system + user prompt pair to a language model and returns its text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// # Errors
    ///
    /// Returns `CompletionError` when the client is disabled, the transport
    /// fails, or the model returns nothing.
    async fn generate_completion(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, CompletionError>;
}

#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Read settings from `QUIZ_AI_*` variables, falling back to
    /// `OPENAI_API_KEY` for the key.
    ///
    /// Returns `Ok(None)` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base url or timeout cannot be parsed.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`CompletionConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base url or timeout cannot be parsed.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(api_key) = non_blank("QUIZ_AI_API_KEY").or_else(|| non_blank("OPENAI_API_KEY"))
        else {
            return Ok(None);
        };

        let base_url = non_blank("QUIZ_AI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            value: base_url.clone(),
            source,
        })?;

        let model = non_blank("QUIZ_AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into());

        let timeout = match non_blank("QUIZ_AI_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(Some(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            model,
            timeout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_key_disables_client() {
        let config = CompletionConfig::from_lookup(lookup(&[("QUIZ_AI_MODEL", "x")])).unwrap();
        assert!(config.is_none());
        let blank = CompletionConfig::from_lookup(lookup(&[("QUIZ_AI_API_KEY", "  ")])).unwrap();
        assert!(blank.is_none());
    }

    #[test]
    fn defaults_apply_with_fallback_key() {
        let config = CompletionConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap()
            .unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn overrides_and_validation() {
        let config = CompletionConfig::from_lookup(lookup(&[
            ("QUIZ_AI_API_KEY", "primary"),
            ("OPENAI_API_KEY", "fallback"),
            ("QUIZ_AI_BASE_URL", "http://localhost:8080/v1"),
            ("QUIZ_AI_TIMEOUT_SECS", "5"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.api_key, "primary");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let err = CompletionConfig::from_lookup(lookup(&[
            ("QUIZ_AI_API_KEY", "k"),
            ("QUIZ_AI_BASE_URL", "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let err = CompletionConfig::from_lookup(lookup(&[
            ("QUIZ_AI_API_KEY", "k"),
            ("QUIZ_AI_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
