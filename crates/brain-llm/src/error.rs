//! Error type for LLM provider calls.

use thiserror::Error;

/// Errors a [`crate::LlmProvider`] can return.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider has no API key configured and the endpoint isn't local.
    #[error("{provider} has no API key configured")]
    ApiKeyNotConfigured {
        /// Name of the provider that's missing a key.
        provider: String,
    },

    /// The HTTP request itself failed (network, TLS, DNS).
    #[error("request to {provider} failed: {source}")]
    RequestFailed {
        /// Name of the provider that was being called.
        provider: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint replied with a non-2xx status.
    #[error("{provider} returned HTTP {status}: {body}")]
    ApiRequestFailed {
        /// Name of the provider that replied with an error status.
        provider: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The response body didn't parse into the shape this provider expects.
    #[error("invalid response from {provider}: {detail}")]
    InvalidResponse {
        /// Name of the provider whose response was malformed.
        provider: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The call exceeded its wall-clock deadline (spec §5, non-retryable).
    #[error("{provider} call timed out after {deadline_ms}ms")]
    Timeout {
        /// Name of the provider that timed out.
        provider: String,
        /// The deadline that was exceeded.
        deadline_ms: u64,
    },
}

/// Result alias for LLM provider calls.
pub type LlmResult<T> = Result<T, LlmError>;
