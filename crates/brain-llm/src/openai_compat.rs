//! An OpenAI-compatible `LlmProvider` — works against LM Studio, vLLM,
//! Ollama's OpenAI-compat surface, or the real OpenAI API, same as any other
//! `/v1/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LlmError, LlmResult};
use crate::provider::{LlmProvider, ProviderConfig};
use crate::types::{ChatResponse, Message, Role, Usage};

/// Chat-completion client speaking the OpenAI wire format.
pub struct OpenAiCompatProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiCompatProvider {
    /// Build a provider from `config`, with a fresh [`reqwest::Client`].
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self { client: Client::new(), config }
    }

    fn is_local(&self) -> bool {
        self.config.base_url.contains("localhost") || self.config.base_url.contains("127.0.0.1")
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChoiceWire>,
    #[serde(default)]
    usage: Option<UsageWire>,
}

#[derive(Debug, Deserialize)]
struct ChoiceWire {
    message: ResponseMessageWire,
}

#[derive(Debug, Deserialize)]
struct ResponseMessageWire {
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct UsageWire {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat_detailed(
        &self,
        messages: &[Message],
        temperature: f64,
        max_tokens: u32,
    ) -> LlmResult<ChatResponse> {
        if self.config.api_key.as_deref().unwrap_or_default().is_empty() && !self.is_local() {
            return Err(LlmError::ApiKeyNotConfigured { provider: self.name().to_string() });
        }

        let body = ChatRequest {
            model: &self.config.model,
            messages: messages.iter().map(|m| WireMessage { role: role_str(m.role), content: &m.content }).collect(),
            temperature,
            max_tokens,
        };

        debug!(model = %self.config.model, base_url = %self.config.base_url, "chat_detailed request");

        let mut request = self.client.post(&self.config.base_url).header("Content-Type", "application/json");
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::RequestFailed { provider: self.name().to_string(), source })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiRequestFailed { provider: self.name().to_string(), status, body });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse { provider: self.name().to_string(), detail: e.to_string() })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| LlmError::InvalidResponse {
            provider: self.name().to_string(),
            detail: "no choices in response".to_string(),
        })?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: Usage { prompt_tokens: usage.prompt_tokens, completion_tokens: usage.completion_tokens },
        })
    }

    async fn is_available(&self, timeout_seconds: u64) -> bool {
        let probe = self.client.get(&self.config.base_url).timeout(Duration::from_secs(timeout_seconds)).send();
        match tokio::time::timeout(Duration::from_secs(timeout_seconds), probe).await {
            Ok(Ok(_response)) => true,
            Ok(Err(err)) => {
                warn!(provider = %self.name(), error = %err, "availability probe failed");
                false
            }
            Err(_elapsed) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_local_detects_loopback_urls() {
        let provider = OpenAiCompatProvider::new(ProviderConfig::new("http://localhost:1234/v1/chat/completions", "m"));
        assert!(provider.is_local());

        let provider = OpenAiCompatProvider::new(ProviderConfig::new("https://api.openai.com/v1/chat/completions", "m"));
        assert!(!provider.is_local());
    }

    #[tokio::test]
    async fn missing_api_key_against_remote_host_is_rejected_before_any_request() {
        let provider = OpenAiCompatProvider::new(ProviderConfig::new("https://api.openai.com/v1/chat/completions", "gpt-4o"));
        let result = provider.chat_detailed(&[Message::user("hi")], 0.2, 64).await;
        assert!(matches!(result, Err(LlmError::ApiKeyNotConfigured { .. })));
    }
}
