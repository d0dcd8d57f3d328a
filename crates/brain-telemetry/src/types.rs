//! Data types for the observability store (spec §3 "Run / ToolCall / Artifact").

use chrono::{DateTime, Utc};
use serde_json::Value;

use brain_core::ids::{ArtifactId, RunId, ToolCallId};

/// Terminal status of a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Completed without error.
    Success,
    /// Raised/returned an error before completion.
    Error,
    /// Completed, but at least one tool call inside it errored.
    Partial,
}

impl RunStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Partial => "partial",
        }
    }

    pub(crate) fn parse(raw: &str) -> Self {
        match raw {
            "error" => Self::Error,
            "partial" => Self::Partial,
            _ => Self::Success,
        }
    }
}

/// Terminal status of a [`ToolCall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCallStatus {
    /// The tool ran and produced a result.
    Success,
    /// The tool raised/returned an error.
    Error,
    /// The tool was never invoked (e.g. the user denied confirmation).
    Skipped,
}

impl ToolCallStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    pub(crate) fn parse(raw: &str) -> Self {
        match raw {
            "error" => Self::Error,
            "skipped" => Self::Skipped,
            _ => Self::Success,
        }
    }
}

/// One observed turn (spec §3 `Run`).
#[derive(Debug, Clone)]
pub struct Run {
    /// Primary key.
    pub run_id: RunId,
    /// The dialog session this run belongs to, if any.
    pub session_id: Option<String>,
    /// The raw user message that started the run.
    pub user_input: String,
    /// When the run began.
    pub started_at: DateTime<Utc>,
    /// When the run ended, once finished.
    pub ended_at: Option<DateTime<Utc>>,
    /// Terminal status.
    pub status: RunStatus,
    /// Which route the orchestrator picked (`calendar`, `gmail`, ...).
    pub route: Option<String>,
    /// The finalized assistant reply.
    pub final_output: Option<String>,
    /// The model used for the finalizer/router call, if any.
    pub model: Option<String>,
    /// Total LLM tokens spent across this run.
    pub total_tokens: u64,
    /// Wall-clock duration once ended.
    pub latency_ms: Option<u64>,
    /// Error message, set only when `status == Error`.
    pub error: Option<String>,
}

impl Run {
    pub(crate) fn new(run_id: RunId, session_id: Option<String>, user_input: String) -> Self {
        Self {
            run_id,
            session_id,
            user_input,
            started_at: Utc::now(),
            ended_at: None,
            status: RunStatus::Success,
            route: None,
            final_output: None,
            model: None,
            total_tokens: 0,
            latency_ms: None,
            error: None,
        }
    }
}

/// One tool invocation within a run (spec §3 `ToolCall`).
#[derive(Debug, Clone)]
pub struct ToolCall {
    /// Primary key.
    pub call_id: ToolCallId,
    /// The run this call belongs to.
    pub run_id: RunId,
    /// The tool that was invoked.
    pub tool_name: String,
    /// Tool parameters, as passed to the handler.
    pub params: Value,
    /// Terminal status.
    pub status: ToolCallStatus,
    /// SHA-256 over the normalized result JSON, set on success.
    pub result_hash: Option<String>,
    /// Truncated human-readable summary of the result.
    pub result_summary: Option<String>,
    /// Error message, set only when `status == Error`.
    pub error: Option<String>,
    /// Wall-clock duration of the call.
    pub elapsed_ms: u64,
    /// How many times the call was retried before settling.
    pub retry_count: u32,
    /// How the destructive-action confirmation was resolved, if applicable.
    pub confirmation: Option<String>,
}

impl ToolCall {
    pub(crate) fn new(call_id: ToolCallId, run_id: RunId, tool_name: String, params: Value) -> Self {
        Self {
            call_id,
            run_id,
            tool_name,
            params,
            status: ToolCallStatus::Success,
            result_hash: None,
            result_summary: None,
            error: None,
            elapsed_ms: 0,
            retry_count: 0,
            confirmation: None,
        }
    }
}

/// A stored content blob produced by a run (spec §3 `Artifact`).
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Primary key.
    pub artifact_id: ArtifactId,
    /// The run that produced it, if any (`save_artifact` allows `None`).
    pub run_id: Option<RunId>,
    /// Artifact kind (`"summary"`, `"transcript"`, `"draft"`, ...).
    pub artifact_type: String,
    /// Optional display title.
    pub title: Option<String>,
    /// The blob itself.
    pub content: String,
    /// MIME type, defaulting to `text/plain`.
    pub mime_type: String,
    /// `content`'s byte length.
    pub size_bytes: u64,
    /// When it was stored.
    pub created_at: DateTime<Utc>,
}

/// Aggregate over all runs in a time window (spec §4.9 `run_stats`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    /// Total runs in the window.
    pub total: u64,
    /// Runs that ended `success` or `partial`.
    pub success: u64,
    /// Runs that ended `error`.
    pub errors: u64,
    /// `success / total * 100`, or `0.0` when `total == 0`.
    pub success_rate: f64,
    /// Sum of `total_tokens` across the window.
    pub total_tokens: u64,
}

/// Per-tool aggregate (spec §4.9 `tool_stats`).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStat {
    /// The tool name.
    pub tool_name: String,
    /// Total calls recorded.
    pub calls: u64,
    /// Calls that ended in error.
    pub errors: u64,
    /// `errors / calls * 100`.
    pub error_rate: f64,
    /// Mean `elapsed_ms` across all calls.
    pub avg_latency_ms: f64,
}

/// One entry in an error breakdown (spec §4.9 `error_breakdown`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBreakdownEntry {
    /// The tool that failed.
    pub tool_name: String,
    /// The recorded error message.
    pub error: String,
    /// The call this entry came from.
    pub call_id: String,
}
