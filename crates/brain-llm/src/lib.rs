//! LLM provider abstraction backing the router and finalizer endpoints (spec
//! §6), grounded on `astrid-llm`'s provider seam but narrowed to a
//! non-streaming, tool-call-free chat interface — tool invocation belongs to
//! the tool executor, not the model.

pub mod error;
pub mod openai_compat;
pub mod provider;
pub mod testing;
pub mod types;

pub use error::{LlmError, LlmResult};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{LlmProvider, ProviderConfig};
pub use testing::FakeProvider;
pub use types::{ChatResponse, Message, Role, Usage};
