use thiserror::Error;

/// Failure modes for the dialog memory store (spec §4.3).
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The underlying SQLite connection or query failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A JSONL export/import path couldn't be read or written.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A JSONL record failed to (de)serialize.
    #[error("malformed jsonl record: {0}")]
    Malformed(String),
}

/// Result alias used throughout this crate.
pub type MemoryResult<T> = Result<T, MemoryError>;
