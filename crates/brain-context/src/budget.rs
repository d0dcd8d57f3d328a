//! Token/char budget knobs for context composition (spec §4.4 "Token budget").

/// Per-section char caps and the overall token budget. Defaults mirror the
/// spec's stated figures; callers needing stricter budgets (e.g. a
/// smaller-context local model) can construct their own.
#[derive(Debug, Clone, Copy)]
pub struct ContextBudget {
    /// Overall token budget the composed context must fit within.
    pub token_budget: usize,
    /// Char cap applied to the `LAST_TOOL_RESULTS:` section before the first
    /// trim pass.
    pub tool_results_cap: usize,
    /// Char cap each tool result's rendered summary is truncated to.
    pub tool_result_summary_cap: usize,
    /// Char cap applied to `DIALOG_SUMMARY:` during the dialog-summary trim
    /// step.
    pub dialog_summary_trim: usize,
    /// Char cap applied to a rendered `PLANNER_DECISION:` section.
    pub planner_decision_trim: usize,
    /// Char cap applied to `PERSONALITY:` before it is dropped entirely.
    pub personality_trim: usize,
    /// Max long-term-memory bullets included.
    pub long_term_memory_max: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            token_budget: 3500,
            tool_results_cap: 1800,
            tool_result_summary_cap: 500,
            dialog_summary_trim: 800,
            planner_decision_trim: 400,
            personality_trim: 400,
            long_term_memory_max: 5,
        }
    }
}
