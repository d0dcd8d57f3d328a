//! Message and response types for the router/finalizer LLM interface (spec
//! §6). Narrower than a full agentic chat API on purpose: no tool-calling or
//! streaming surface, since tool invocation is owned by the tool executor
//! (C8), not the model.

use serde::{Deserialize, Serialize};

/// A message role in a chat-style completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// The end user's turn.
    User,
    /// A prior model turn.
    Assistant,
}

/// One message in the ordered conversation sent to `chat_detailed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who said it.
    pub role: Role,
    /// Plain-text content.
    pub content: String,
}

impl Message {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// Build an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Token usage reported alongside a completion (spec §6).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens consumed by the generated completion.
    pub completion_tokens: u32,
}

impl Usage {
    /// Total tokens billed for the call.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Result of a non-streaming chat completion.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The model's reply text.
    pub content: String,
    /// Token accounting for this call.
    pub usage: Usage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_totals_saturate_rather_than_panic() {
        let usage = Usage { prompt_tokens: u32::MAX, completion_tokens: 10 };
        assert_eq!(usage.total(), u32::MAX);
    }

    #[test]
    fn message_constructors_set_role() {
        assert_eq!(Message::system("x").role, Role::System);
        assert_eq!(Message::user("x").role, Role::User);
        assert_eq!(Message::assistant("x").role, Role::Assistant);
    }
}
