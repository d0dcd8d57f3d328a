//! Run tracking, LLM metrics logging, and an in-process event bus for the
//! brain runtime (spec §4.9).
//!
//! [`RunTracker`] records one SQLite row per run/tool-call/artifact via RAII
//! guards; [`MetricsLog`] appends a JSONL line per LLM call and aggregates
//! them into a [`MetricsReport`]; [`EventBus`] lets components publish and
//! subscribe to lifecycle events without depending on each other directly.

pub mod error;
pub mod event_bus;
pub mod metrics_log;
pub mod run_tracker;
mod schema;
mod summarize;
pub mod types;

pub use error::{TelemetryError, TelemetryResult};
pub use event_bus::{Event, EventBus, Handler, Middleware};
pub use metrics_log::{analyze, format_markdown, load_metrics, MetricEntry, MetricsLog, MetricsReport};
pub use run_tracker::{RunGuard, RunTracker, ToolCallGuard};
pub use types::{Artifact, ErrorBreakdownEntry, Run, RunStats, RunStatus, ToolCall, ToolCallStatus, ToolStat};
