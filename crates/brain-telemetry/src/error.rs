use thiserror::Error;

/// Failure modes for run tracking, metrics logging, and the event bus
/// (spec §4.9).
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The underlying SQLite connection or query failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A JSONL metrics line or artifact path couldn't be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A JSONL metrics record failed to (de)serialize.
    #[error("malformed jsonl record: {0}")]
    Malformed(String),
    /// A run or tool-call id didn't resolve to a stored row.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Which entity was missing (`"run"`, `"tool call"`, ...).
        kind: &'static str,
        /// The id that was looked up.
        id: String,
    },
}

/// Result alias used throughout this crate.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
