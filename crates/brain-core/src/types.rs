//! The brain's data model (spec §3): `OrchestratorOutput`, `OrchestratorState`,
//! `CompactSummary`, `ToolResult`, and the enums they're built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::ids::SessionId;

/// Top-level conversational route chosen by the router/finalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Calendar scheduling intents.
    Calendar,
    /// Gmail / mail intents.
    Gmail,
    /// Small talk, no tool use.
    Smalltalk,
    /// System / meta commands.
    System,
    /// Turn cancelled by the user declining a pending confirmation.
    Cancelled,
    /// Could not be classified.
    Unknown,
}

impl Route {
    /// All valid enum values, used by the codec's repair step.
    pub const ALL: [Route; 6] = [
        Route::Calendar,
        Route::Gmail,
        Route::Smalltalk,
        Route::System,
        Route::Cancelled,
        Route::Unknown,
    ];

    /// Parse from a raw keyword, returning `None` if unrecognized.
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "calendar" => Some(Route::Calendar),
            "gmail" => Some(Route::Gmail),
            "smalltalk" => Some(Route::Smalltalk),
            "system" => Some(Route::System),
            "cancelled" => Some(Route::Cancelled),
            "unknown" => Some(Route::Unknown),
            _ => None,
        }
    }
}

/// Calendar-specific sub-intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarIntent {
    /// Create a new event.
    Create,
    /// Modify an existing event.
    Modify,
    /// Cancel/delete an event.
    Cancel,
    /// Query existing events.
    Query,
    /// No calendar intent.
    None,
}

impl CalendarIntent {
    /// All valid enum values.
    pub const ALL: [CalendarIntent; 5] = [
        CalendarIntent::Create,
        CalendarIntent::Modify,
        CalendarIntent::Cancel,
        CalendarIntent::Query,
        CalendarIntent::None,
    ];

    /// Parse from a raw keyword.
    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "create" => Some(CalendarIntent::Create),
            "modify" => Some(CalendarIntent::Modify),
            "cancel" => Some(CalendarIntent::Cancel),
            "query" => Some(CalendarIntent::Query),
            "none" => Some(CalendarIntent::None),
            _ => None,
        }
    }
}

/// The router/finalizer's validated structured decision for one turn.
///
/// Constructed only by the codec's `validate` step (spec §4.1); never mutated
/// in place afterwards — a "finalized" variant is a new value built with
/// [`OrchestratorOutput::with_reply`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorOutput {
    /// High-level route.
    pub route: Route,
    /// Calendar sub-intent (only meaningful when `route == Calendar`).
    pub calendar_intent: CalendarIntent,
    /// Extracted slots (free-form key/value pairs from the LLM).
    pub slots: BTreeMap<String, Value>,
    /// Model confidence, clamped to `[0, 1]`.
    pub confidence: f64,
    /// Ordered tool names to execute this turn.
    pub tool_plan: Vec<String>,
    /// The user-facing reply text.
    pub assistant_reply: String,
    /// Whether the assistant is asking the user a clarifying question.
    pub ask_user: bool,
    /// Non-empty iff `ask_user`.
    pub question: String,
    /// Whether execution requires explicit user confirmation before proceeding.
    pub requires_confirmation: bool,
    /// Non-empty iff `requires_confirmation`.
    pub confirmation_prompt: String,
    /// Opaque memory-update payload for downstream learning components.
    pub memory_update: BTreeMap<String, Value>,
    /// Free-text reasoning trace, one entry per step.
    pub reasoning_summary: Vec<String>,
    /// The raw (pre-validation) JSON object, kept for debugging.
    pub raw_output: BTreeMap<String, Value>,
}

impl OrchestratorOutput {
    /// Build a minimal fallback output (spec §4.10, §7): used whenever the
    /// router's structured output could not be parsed/repaired.
    #[must_use]
    pub fn fallback_unknown(apology: impl Into<String>) -> Self {
        Self {
            route: Route::Unknown,
            calendar_intent: CalendarIntent::None,
            slots: BTreeMap::new(),
            confidence: 0.0,
            tool_plan: Vec::new(),
            assistant_reply: apology.into(),
            ask_user: false,
            question: String::new(),
            requires_confirmation: false,
            confirmation_prompt: String::new(),
            memory_update: BTreeMap::new(),
            reasoning_summary: Vec::new(),
            raw_output: BTreeMap::new(),
        }
    }

    /// Return a copy of `self` with `assistant_reply` replaced (used by the
    /// finalizer to produce a "finalized" variant without mutating the
    /// router's original decision).
    #[must_use]
    pub fn with_reply(&self, reply: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.assistant_reply = reply.into();
        out
    }

    /// Whether this turn's invariants hold (spec §8 invariant 3), useful in
    /// tests and debug assertions.
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        let confidence_ok = (0.0..=1.0).contains(&self.confidence);
        let confirmation_ok = !self.requires_confirmation || !self.confirmation_prompt.is_empty();
        let ask_ok = !self.ask_user || !self.question.is_empty();
        confidence_ok && confirmation_ok && ask_ok
    }
}

/// Risk level assigned to a pending or executed tool call (mirrors
/// `brain_approval::ToolRisk`, duplicated here since the data model must not
/// depend on the approval crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No confirmation needed.
    Safe,
    /// Confirmation only if the LLM asked for it.
    Moderate,
    /// Confirmation is always required.
    Destructive,
}

/// An action awaiting user confirmation, recorded on `OrchestratorState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Tool name.
    pub tool: String,
    /// Slots/params the tool would be invoked with.
    pub slots: BTreeMap<String, Value>,
    /// Localized confirmation prompt shown to the user.
    pub prompt: String,
    /// Risk level that triggered the gate.
    pub risk_level: RiskLevel,
    /// Optional params fingerprint, for moderate tools that opt into one.
    pub fingerprint: Option<String>,
}

/// Status of a single tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Completed successfully.
    Ok,
    /// Failed with an error.
    Error,
    /// Not executed (e.g. plan step skipped).
    Skipped,
    /// Execution deferred pending user confirmation.
    AwaitingConfirmation,
}

/// Outcome of dispatching one tool (spec §3 `ToolResult`).
///
/// Invariant: exactly one of `result` / `error` is populated, enforced by the
/// constructors below rather than at the type level (mirrors how the
/// original JSON wire format represents it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name.
    pub tool_name: String,
    /// Outcome status.
    pub status: ToolStatus,
    /// Success payload (`None` unless `status == Ok`).
    pub result: Option<Value>,
    /// Error message (`None` unless `status == Error`).
    pub error: Option<String>,
    /// Wall-clock duration of the call.
    pub elapsed_ms: u64,
    /// Whether this call proceeded because the user had already confirmed it.
    pub confirmed: bool,
    /// Risk classification at time of execution.
    pub risk_level: RiskLevel,
}

impl ToolResult {
    /// Build a successful result.
    #[must_use]
    pub fn ok(tool_name: impl Into<String>, result: Value, elapsed_ms: u64, risk_level: RiskLevel) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Ok,
            result: Some(result),
            error: None,
            elapsed_ms,
            confirmed: false,
            risk_level,
        }
    }

    /// Build an error result.
    #[must_use]
    pub fn error(tool_name: impl Into<String>, error: impl Into<String>, elapsed_ms: u64, risk_level: RiskLevel) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Error,
            result: None,
            error: Some(error.into()),
            elapsed_ms,
            confirmed: false,
            risk_level,
        }
    }

    /// Build an awaiting-confirmation sentinel result.
    #[must_use]
    pub fn awaiting_confirmation(tool_name: impl Into<String>, risk_level: RiskLevel) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::AwaitingConfirmation,
            result: None,
            error: None,
            elapsed_ms: 0,
            confirmed: false,
            risk_level,
        }
    }
}

/// A tagged reference to an entity surfaced by a tool result, bound into the
/// context builder's anaphora reference table (spec §4.4 `REFERENCE_TABLE`,
/// §9 "Cyclic/mutable graphs").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityRef {
    /// A calendar event.
    Event {
        /// Provider-assigned event id.
        id: String,
        /// Human-readable title.
        title: String,
    },
    /// An email message.
    Email {
        /// Provider-assigned message id.
        id: String,
        /// Subject line.
        subject: String,
    },
    /// A filesystem path.
    File {
        /// Absolute or workspace-relative path.
        path: String,
    },
}

/// One dialog turn's compact record (spec §3 `CompactSummary`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactSummary {
    /// 1-based turn number within the session.
    pub turn_number: u32,
    /// The user's utterance (PII-filtered before persistence).
    pub user_intent: String,
    /// Short description of what the turn did.
    pub action_taken: String,
    /// Any items still open at turn end (e.g. unanswered questions).
    pub pending_items: Vec<String>,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
}

/// Per-session orchestrator state (spec §3 `OrchestratorState`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorState {
    /// Owning session.
    pub session_id: SessionId,
    /// Actions awaiting user confirmation, oldest first.
    pub pending_confirmations: Vec<PendingAction>,
    /// Tool name the user has just confirmed, if any, consumed on next dispatch.
    pub confirmed_tool: Option<String>,
    /// Results from the most recently executed tool plan.
    pub last_tool_results: Vec<ToolResult>,
    /// Anaphora reference table (`#1`, `#2`, ... -> entity).
    pub reference_table: BTreeMap<u32, EntityRef>,
    /// Opaque debug trace, accumulated across turns.
    pub trace: BTreeMap<String, Value>,
}

impl OrchestratorState {
    /// Create fresh state for a new session.
    #[must_use]
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            pending_confirmations: Vec::new(),
            confirmed_tool: None,
            last_tool_results: Vec::new(),
            reference_table: BTreeMap::new(),
            trace: BTreeMap::new(),
        }
    }
}
