//! Connection settings for the chat-completion endpoint.

use std::time::Duration;

use skald_core::env::{self, Lookup, ProcessEnv};
use skald_core::error::DomainError;

/// Model used when `SKALD_LLM_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Where and how to reach the chat-completion endpoint.
#[derive(Clone, PartialEq)]
pub struct LlmConfig {
    /// Base URL, e.g. `http://localhost:11434/v1`. `/chat/completions` is appended.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Sampling temperature.
    pub temperature: f32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl LlmConfig {
    /// A config for `base_url` with default model and timeouts.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_owned(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
            temperature: 0.7,
        }
    }

    /// Reads the config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a value does not parse.
    pub fn from_env() -> Result<Option<Self>, DomainError> {
        Self::from_lookup(&ProcessEnv)
    }

    /// Reads the config through `lookup`. Returns `None` when
    /// `SKALD_LLM_BASE_URL` is unset, meaning no external service is used.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a value does not parse.
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Option<Self>, DomainError> {
        let Some(base_url) = lookup.get("SKALD_LLM_BASE_URL") else {
            return Ok(None);
        };
        let defaults = Self::new(base_url);
        Ok(Some(Self {
            model: lookup
                .get("SKALD_LLM_MODEL")
                .unwrap_or_else(|| defaults.model.clone()),
            api_key: lookup.get("SKALD_LLM_API_KEY"),
            request_timeout: env::millis(
                lookup,
                "SKALD_LLM_TIMEOUT_MS",
                defaults.request_timeout,
            )?,
            temperature: env::parsed(lookup, "SKALD_LLM_TEMPERATURE", defaults.temperature)?,
            ..defaults
        }))
    }

    /// The full completions URL.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_base_url_means_no_service() {
        let config = LlmConfig::from_lookup(&|_: &str| -> Option<String> { None }).unwrap();

        assert!(config.is_none());
    }

    #[test]
    fn test_config_reads_every_variable() {
        let lookup = |key: &str| match key {
            "SKALD_LLM_BASE_URL" => Some("http://localhost:11434/v1/".to_owned()),
            "SKALD_LLM_MODEL" => Some("llama3".to_owned()),
            "SKALD_LLM_API_KEY" => Some("secret".to_owned()),
            "SKALD_LLM_TIMEOUT_MS" => Some("1500".to_owned()),
            _ => None,
        };

        let config = LlmConfig::from_lookup(&lookup).unwrap().unwrap();

        assert_eq!(config.model, "llama3");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(
            config.completions_url(),
            "http://localhost:11434/v1/chat/completions"
        );
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_bad_temperature_is_rejected() {
        let lookup = |key: &str| match key {
            "SKALD_LLM_BASE_URL" => Some("http://localhost".to_owned()),
            "SKALD_LLM_TEMPERATURE" => Some("warm".to_owned()),
            _ => None,
        };

        assert!(matches!(
            LlmConfig::from_lookup(&lookup),
            Err(DomainError::Validation(_))
        ));
    }
}
