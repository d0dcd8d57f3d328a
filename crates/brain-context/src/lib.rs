//! C5: token-budgeted context composition for the router/finalizer LLM.
//!
//! [`ContextBuilder::build`] composes the `DIALOG_SUMMARY` / `USER_PROFILE` /
//! `LONG_TERM_MEMORY` / `PERSONALITY` / `RECENT_CONVERSATION` /
//! `LAST_TOOL_RESULTS` / `REFERENCE_TABLE` sections into one prompt block,
//! trimming in a fixed priority order when the result would exceed the
//! configured token budget.

pub mod budget;
pub mod builder;
pub mod cache;
pub mod render;
pub mod tracer;
pub mod types;

pub use budget::ContextBudget;
pub use builder::{build, ContextBuilder};
pub use tracer::{MemoryTracer, NullTracer, TracingTracer};
pub use types::{ContextBuildResult, ContextInputs, ConversationTurn};
