//! A deterministic [`LlmProvider`] double for exercising the router,
//! finalizer, and orchestrator without a live endpoint.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmResult;
use crate::provider::LlmProvider;
use crate::types::{ChatResponse, Message, Usage};

/// Returns a fixed `content` string for every call and records the messages
/// it was invoked with, so tests can assert on what was sent.
pub struct FakeProvider {
    name: String,
    model: String,
    response: String,
    available: bool,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl FakeProvider {
    /// Build a fake that always answers with `response`.
    #[must_use]
    pub fn new(name: impl Into<String>, model: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            response: response.into(),
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make `is_available` report `false`.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Number of `chat_detailed` calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// The messages passed to the most recent `chat_detailed` call, if any.
    #[must_use]
    pub fn last_call(&self) -> Option<Vec<Message>> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).last().cloned()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_detailed(&self, messages: &[Message], _temperature: f64, _max_tokens: u32) -> LlmResult<ChatResponse> {
        self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(messages.to_vec());
        Ok(ChatResponse {
            content: self.response.clone(),
            usage: Usage { prompt_tokens: 10, completion_tokens: 10 },
        })
    }

    async fn is_available(&self, _timeout_seconds: u64) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_provider_returns_fixed_response_and_records_calls() {
        let provider = FakeProvider::new("fake", "fake-model", "hello");
        let response = provider.chat_detailed(&[Message::user("hi")], 0.2, 64).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_call().unwrap()[0].content, "hi");
    }

    #[tokio::test]
    async fn unavailable_fake_reports_false() {
        let provider = FakeProvider::new("fake", "fake-model", "hello").unavailable();
        assert!(!provider.is_available(1).await);
    }
}
