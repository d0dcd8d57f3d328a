//! Router + hybrid finalizer orchestration for the brain runtime (spec
//! §4.10, §4.11): [`router::route`] is the stage-1 LLM call (C11);
//! [`hybrid::HybridOrchestrator`] combines it with a quality finalizer,
//! gated by `brain-gating` and checked by `brain-guard`'s no-new-facts
//! guard (C12).

pub mod error;
pub mod hybrid;
pub mod router;
pub mod summarize_tools;

pub use error::{OrchestratorError, OrchestratorResult};
pub use hybrid::HybridOrchestrator;
pub use router::route;
pub use summarize_tools::summarize_tool_results;
