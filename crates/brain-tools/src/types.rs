//! The unit of work C8 dispatches, and the result it hands back (spec
//! §4.7). Grounded on `test_confirmation_firewall.py`'s `DummyStep` — a
//! tool name plus its params, nothing else the executor needs to know about.

use std::collections::BTreeMap;

use brain_core::types::RiskLevel;
use serde_json::Value;

/// One planned tool invocation: a tool name and its JSON-valued params
/// (the router's `tool_plan` entries, expanded with `slots`).
#[derive(Debug, Clone)]
pub struct Step {
    /// Registered tool name (the router's `tool_plan` entry).
    pub action: String,
    /// Parameters to invoke it with, keyed by the router's `slots` map.
    pub params: BTreeMap<String, Value>,
}

impl Step {
    /// Build a step for `action` with `params`.
    #[must_use]
    pub fn new(action: impl Into<String>, params: BTreeMap<String, Value>) -> Self {
        Self { action: action.into(), params }
    }
}

/// A row describing one tool invocation, ready for the caller to persist as
/// a `ToolCall` record (spec §3 / §4.9) — C8 computes it, C10 stores it.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Tool name.
    pub tool_name: String,
    /// The params the tool was invoked with, as JSON.
    pub params: Value,
    /// Whether the call succeeded.
    pub ok: bool,
    /// SHA-256 over the canonical JSON of the result (`None` on error).
    pub result_hash: Option<String>,
    /// A truncated (`<=500` char) preview of the result, for audit logs.
    pub result_summary: Option<String>,
    /// Error message, if `ok` is false.
    pub error: Option<String>,
    /// Wall-clock duration of the call.
    pub elapsed_ms: u64,
    /// Whether this call proceeded because of a consumed confirmation token.
    pub confirmed: bool,
    /// Risk classification at the time of the call.
    pub risk_level: RiskLevel,
}

/// Outcome of [`crate::executor::ToolExecutor::execute`] (spec §4.7
/// `ExecutionResult`).
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether the call (or the confirmation gate) succeeded.
    pub ok: bool,
    /// Success payload.
    pub data: Option<Value>,
    /// Error message, set only when `ok` is false and not awaiting
    /// confirmation.
    pub error: Option<String>,
    /// True if this call was short-circuited by the confirmation firewall.
    pub awaiting_confirmation: bool,
    /// The localized prompt to show the user, set iff `awaiting_confirmation`.
    pub confirmation_prompt: Option<String>,
    /// Risk classification of `step.action`.
    pub risk_level: RiskLevel,
    /// The record to persist to C10, set whenever the handler actually ran.
    pub record: Option<ToolCallRecord>,
}

impl ExecutionResult {
    /// Build the awaiting-confirmation sentinel (spec §4.7 step 2).
    #[must_use]
    pub fn awaiting_confirmation(prompt: String, risk_level: RiskLevel) -> Self {
        Self {
            ok: false,
            data: None,
            error: None,
            awaiting_confirmation: true,
            confirmation_prompt: Some(prompt),
            risk_level,
            record: None,
        }
    }

    /// Build a success result carrying `data` and its `record`.
    #[must_use]
    pub fn success(data: Value, risk_level: RiskLevel, record: ToolCallRecord) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            awaiting_confirmation: false,
            confirmation_prompt: None,
            risk_level,
            record: Some(record),
        }
    }

    /// Build a failure result carrying the handler's error and its `record`.
    #[must_use]
    pub fn failure(error: String, risk_level: RiskLevel, record: ToolCallRecord) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            awaiting_confirmation: false,
            confirmation_prompt: None,
            risk_level,
            record: Some(record),
        }
    }
}
