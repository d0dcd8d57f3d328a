use thiserror::Error;

/// Failure modes for the router and hybrid orchestrator (spec §4.10, §4.11).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The router LLM call itself failed (transport, timeout, non-2xx).
    #[error("router call failed: {0}")]
    Router(#[from] brain_llm::LlmError),
    /// The finalizer LLM call failed and `fallback_to_router` was disabled.
    #[error("finalizer call failed: {0}")]
    Finalizer(brain_llm::LlmError),
}

/// Result alias used throughout this crate.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
