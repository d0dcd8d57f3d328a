//! Idempotency store error types.

/// Errors from the idempotency store.
#[derive(Debug, thiserror::Error)]
pub enum IdempotencyError {
    /// The store file couldn't be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The store file's contents didn't parse as the expected schema.
    #[error("malformed store file: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The handler invoked for creation returned an application-level error.
    #[error("create_fn failed: {0}")]
    CreateFailed(String),
}

/// Result type for idempotency store operations.
pub type IdempotencyResult<T> = Result<T, IdempotencyError>;
