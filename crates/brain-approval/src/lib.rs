//! C6: tool risk registry and confirmation firewall. Enforces that
//! destructive tools can never execute without explicit user confirmation,
//! independent of whatever the router/finalizer LLM claims about the tool.

pub mod firewall;
pub mod registry;

pub use firewall::{classify_turkish_response, get_confirmation_prompt, requires_confirmation, ConfirmationReply};
pub use registry::{ToolDefinition, ToolRiskRegistry};
