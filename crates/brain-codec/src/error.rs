use thiserror::Error;

/// Failure modes for [`crate::extract::extract_first_json_object`] and the
/// wider validate/repair pipeline (spec §4.1, §7 `codec_error`).
#[derive(Debug, Error)]
pub enum CodecError {
    /// The raw LLM output was empty or whitespace-only.
    #[error("empty model output")]
    EmptyOutput,
    /// No `{` was found anywhere in the text.
    #[error("no JSON object found in model output")]
    NoJsonObject,
    /// A `{` was found but braces never balanced before the text ended.
    #[error("unbalanced braces in candidate JSON")]
    UnbalancedJson,
    /// Braces balanced but the candidate slice failed to parse as JSON.
    #[error("JSON decode error: {0}")]
    JsonDecodeError(#[source] serde_json::Error),
    /// The parsed object failed strict schema validation even after repair.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result alias used throughout this crate.
pub type CodecResult<T> = Result<T, CodecError>;

impl CodecError {
    /// Stable machine-readable reason string, mirroring the Python
    /// implementation's `JsonParseError.reason` used by callers to branch on
    /// failure kind without string-matching the display message.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            CodecError::EmptyOutput => "empty_output",
            CodecError::NoJsonObject => "no_json_object",
            CodecError::UnbalancedJson => "unbalanced_json",
            CodecError::JsonDecodeError(_) => "json_decode_error",
            CodecError::Validation(_) => "validation_error",
        }
    }
}
