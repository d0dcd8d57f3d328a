use thiserror::Error;

/// Failures that can escape `process_turn` itself (spec §6). Tool and
/// finalizer failures are folded into the returned `OrchestratorOutput`
/// instead — this type only covers the runtime's own plumbing.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The router/finalizer stage failed outright (LLM transport error).
    #[error("orchestration failed: {0}")]
    Orchestration(#[from] brain_orchestrator::OrchestratorError),
    /// The dialog summary store could not be read or written.
    #[error("memory error: {0}")]
    Memory(#[from] brain_memory::MemoryError),
}

/// Result alias used throughout this crate.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
