//! Shared error type for the brain runtime's foundation crate.

use thiserror::Error;

/// Errors originating from `brain-core` utilities.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A value fell outside its expected domain (e.g. confidence not in [0,1]).
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// Result alias for `brain-core` operations.
pub type CoreResult<T> = Result<T, CoreError>;
