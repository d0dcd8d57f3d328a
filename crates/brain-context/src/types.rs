//! Inputs to and outputs from context composition.

use brain_core::types::OrchestratorState;
use serde_json::Value;

/// One prior turn, rendered as a `(user, assistant)` utterance pair.
pub type ConversationTurn = (String, String);

/// Everything the builder needs to compose one turn's context. Every field
/// beyond `user_input` and `state` is optional: callers wire in whatever
/// upstream components (C4's dialog summary, a profile/personality store, a
/// planner's first-pass decision) happen to be available for this turn.
pub struct ContextInputs<'a> {
    /// The current turn's raw user utterance.
    pub user_input: &'a str,
    /// Prior turns, oldest first; only the last pair survives trimming.
    pub conversation_history: &'a [ConversationTurn],
    /// Already-labelled `DIALOG_SUMMARY:` block from
    /// [`brain_memory::PersistentDialogSummaryManager::to_prompt_block`].
    pub dialog_summary_block: Option<&'a str>,
    /// Pre-rendered user-profile text, skipped entirely on smalltalk turns.
    pub user_profile: Option<&'a str>,
    /// Long-term-memory bullets, most relevant first.
    pub long_term_memory: &'a [String],
    /// Pre-rendered personality/persona block.
    pub personality: Option<&'a str>,
    /// Current per-session orchestrator state, source of `LAST_TOOL_RESULTS`
    /// and `REFERENCE_TABLE`.
    pub state: &'a OrchestratorState,
    /// Whether this turn was routed as smalltalk (suppresses `USER_PROFILE`).
    pub is_smalltalk: bool,
    /// A first-pass planner decision to surface to the finalizer, rendered
    /// verbatim as JSON when present (spec §4.4, used by C12's hybrid flow).
    pub planner_decision: Option<&'a Value>,
}

/// The composed context plus the raw dialog-summary text, for callers that
/// want to log or re-use the summary independently of the full block.
#[derive(Debug, Clone)]
pub struct ContextBuildResult {
    /// The final prompt, sections joined by blank lines in composition order.
    pub enhanced_summary: String,
    /// The `DIALOG_SUMMARY:` section's content alone (may be empty).
    pub dialog_summary: String,
}
