//! C8: per-tool dispatch with safety and observability (spec §4.7).

pub mod confirm;
pub mod events;
pub mod executor;
pub mod summarize;
pub mod types;

pub use confirm::ConfirmationStore;
pub use events::{NullEventSink, ToolEventSink};
pub use executor::ToolExecutor;
pub use summarize::{result_hash, result_summary};
pub use types::{ExecutionResult, Step, ToolCallRecord};
