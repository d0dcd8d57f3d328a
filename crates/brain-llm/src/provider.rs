//! The `LlmProvider` seam (spec §6): two interchangeable endpoints, router and
//! finalizer, each implementing `chat_detailed` and `is_available`.

use async_trait::async_trait;

use crate::error::LlmResult;
use crate::types::{ChatResponse, Message};

/// An LLM completion endpoint. Implemented once per backend (an
/// OpenAI-compatible HTTP API here; a test double in unit tests) and used
/// interchangeably as either the router or the finalizer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable name, used in logs and error messages.
    fn name(&self) -> &str;

    /// The model identifier this provider is configured for.
    fn model(&self) -> &str;

    /// Run a non-streaming chat completion over `messages`.
    ///
    /// # Errors
    /// Returns [`crate::LlmError`] on transport failure, a non-2xx response,
    /// a malformed response body, or a deadline overrun.
    async fn chat_detailed(
        &self,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<ChatResponse>;

    /// Probe whether the endpoint is reachable within `timeout_seconds`.
    /// Never returns an error — unreachability is itself the answer.
    async fn is_available(&self, timeout_seconds: u64) -> bool;
}

#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    async fn chat_detailed(
        &self,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<ChatResponse> {
        (**self).chat_detailed(messages, temperature, max_tokens).await
    }

    async fn is_available(&self, timeout_seconds: u64) -> bool {
        (**self).is_available(timeout_seconds).await
    }
}

/// Construction-time configuration for an [`LlmProvider`] implementation.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Model identifier to request.
    pub model: String,
    /// Default max output tokens when a call doesn't override it.
    pub max_tokens: u32,
    /// Default sampling temperature.
    pub temperature: f64,
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
}

impl ProviderConfig {
    /// Start a config for `model` at `base_url`, with no API key set.
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            max_tokens: 1024,
            temperature: 0.2,
            base_url: base_url.into(),
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the default max output tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Override the default sampling temperature, clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_clamped() {
        let config = ProviderConfig::new("http://localhost:1234/v1/chat/completions", "local-model")
            .with_temperature(5.0);
        assert!((config.temperature - 1.0).abs() < f64::EPSILON);

        let config = ProviderConfig::new("http://localhost:1234/v1/chat/completions", "local-model")
            .with_temperature(-5.0);
        assert!((config.temperature - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn builder_sets_api_key_and_max_tokens() {
        let config = ProviderConfig::new("https://api.openai.com/v1/chat/completions", "gpt-4o")
            .with_api_key("sk-test")
            .with_max_tokens(256);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.max_tokens, 256);
    }
}
