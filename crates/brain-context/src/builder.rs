//! `ContextBuilder::build` — the C5 entry point (spec §4.4).

use crate::budget::ContextBudget;
use crate::cache::SectionCache;
use crate::render;
use crate::tracer::{MemoryTracer, NullTracer};
use crate::types::{ContextBuildResult, ContextInputs};

/// Rough chars-per-token ratio used to translate the char-based section caps
/// into the token budget spec §4.4 states (a precise tokenizer isn't worth
/// depending on here — the budget is a soft ceiling, not a hard API limit).
const CHARS_PER_TOKEN: usize = 4;

/// Stateful composer: holds the two memoized sections (dialog summary,
/// personality) across calls so repeat turns in the same session skip
/// re-filtering/re-rendering when the underlying content hasn't changed.
pub struct ContextBuilder {
    budget: ContextBudget,
    dialog_summary_cache: SectionCache,
    personality_cache: SectionCache,
}

impl ContextBuilder {
    /// Build a new composer with the given budget.
    #[must_use]
    pub fn new(budget: ContextBudget) -> Self {
        Self { budget, dialog_summary_cache: SectionCache::new(), personality_cache: SectionCache::new() }
    }

    /// Compose one turn's context (spec §4.4 contract).
    pub fn build(&mut self, inputs: &ContextInputs<'_>, tracer: &dyn MemoryTracer) -> ContextBuildResult {
        tracer.begin_turn(inputs.user_input);

        let session_context = render::session_context(chrono::Utc::now());

        let dialog_raw = inputs.dialog_summary_block.unwrap_or("");
        let dialog_summary = self.dialog_summary_cache.get_or_build(dialog_raw, brain_memory::pii::filter);

        let user_profile =
            if inputs.is_smalltalk { String::new() } else { render::user_profile(inputs.user_profile) };

        let long_term_memory = render::long_term_memory(inputs.long_term_memory, self.budget.long_term_memory_max);

        let personality_raw = inputs.personality.unwrap_or("");
        let personality =
            self.personality_cache.get_or_build(personality_raw, |s| render::personality(Some(s)));

        let recent_conversation = render::recent_conversation(inputs.conversation_history, 2);

        let mut last_tool_results =
            render::last_tool_results(&inputs.state.last_tool_results, self.budget.tool_result_summary_cap);
        if last_tool_results.chars().count() > self.budget.tool_results_cap {
            last_tool_results = truncate_body(&last_tool_results, self.budget.tool_results_cap);
        }

        let reference_table = render::reference_table(&inputs.state.reference_table);
        let planner_decision = render::planner_decision(inputs.planner_decision);
        let user_input_section = format!("USER_INPUT:\n{}", inputs.user_input);

        let dialog_summary_for_result = dialog_summary.clone();

        let mut sections: Vec<(&'static str, String)> = vec![
            ("SESSION_CONTEXT", session_context),
            ("DIALOG_SUMMARY", dialog_summary),
            ("USER_PROFILE", user_profile),
            ("LONG_TERM_MEMORY", long_term_memory),
            ("PERSONALITY", personality),
            ("RECENT_CONVERSATION", recent_conversation),
            ("LAST_TOOL_RESULTS", last_tool_results),
            ("REFERENCE_TABLE", reference_table),
            ("PLANNER_DECISION", planner_decision),
            ("USER_INPUT", user_input_section),
        ];

        self.trim_to_budget(inputs, &mut sections, tracer);

        for (name, content) in &sections {
            if !content.is_empty() {
                tracer.record_injection(name, content.chars().count());
            }
        }

        let enhanced_summary = sections
            .iter()
            .map(|(_, content)| content.as_str())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        ContextBuildResult { enhanced_summary, dialog_summary: dialog_summary_for_result }
    }

    /// Apply the spec §4.4 trim order, stopping as soon as the composed
    /// context fits `token_budget`.
    fn trim_to_budget(
        &self,
        inputs: &ContextInputs<'_>,
        sections: &mut [(&'static str, String)],
        tracer: &dyn MemoryTracer,
    ) {
        let char_budget = self.budget.token_budget.saturating_mul(CHARS_PER_TOKEN);
        if joined_len(sections) <= char_budget {
            return;
        }

        let tool_results_trim = truncate_body(get(sections, "LAST_TOOL_RESULTS"), self.budget.tool_results_cap);
        set(sections, "LAST_TOOL_RESULTS", tool_results_trim);
        tracer.record_trim("LAST_TOOL_RESULTS", "trimmed to tool_results_cap");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "RECENT_CONVERSATION", render::recent_conversation(inputs.conversation_history, 1));
        tracer.record_trim("RECENT_CONVERSATION", "kept last pair only");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "DIALOG_SUMMARY", truncate_body(get(sections, "DIALOG_SUMMARY"), self.budget.dialog_summary_trim));
        tracer.record_trim("DIALOG_SUMMARY", "trimmed to dialog_summary_trim");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(
            sections,
            "PLANNER_DECISION",
            truncate_body(get(sections, "PLANNER_DECISION"), self.budget.planner_decision_trim),
        );
        tracer.record_trim("PLANNER_DECISION", "trimmed to planner_decision_trim");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "PERSONALITY", truncate_body(get(sections, "PERSONALITY"), self.budget.personality_trim));
        tracer.record_trim("PERSONALITY", "trimmed to personality_trim");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "PERSONALITY", String::new());
        tracer.record_trim("PERSONALITY", "dropped");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "RECENT_CONVERSATION", String::new());
        tracer.record_trim("RECENT_CONVERSATION", "dropped");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "DIALOG_SUMMARY", String::new());
        tracer.record_trim("DIALOG_SUMMARY", "dropped");
        if joined_len(sections) <= char_budget {
            return;
        }

        set(sections, "SESSION_CONTEXT", String::new());
        tracer.record_trim("SESSION_CONTEXT", "dropped");
        if joined_len(sections) <= char_budget {
            return;
        }

        let without_input = joined_len(sections) - get(sections, "USER_INPUT").chars().count();
        let remaining = char_budget.saturating_sub(without_input).max(50);
        set(sections, "USER_INPUT", truncate_body(get(sections, "USER_INPUT"), remaining));
        tracer.record_trim("USER_INPUT", "truncated as last resort");
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(ContextBudget::default())
    }
}

/// Build one turn's context with a fresh, uncached [`ContextBuilder`] and no
/// tracer. Convenience for callers that don't keep a long-lived builder
/// around (cross-turn caching is then lost — prefer holding a
/// [`ContextBuilder`] per session when that matters).
#[must_use]
pub fn build(inputs: &ContextInputs<'_>, budget: ContextBudget) -> ContextBuildResult {
    ContextBuilder::new(budget).build(inputs, &NullTracer)
}

fn joined_len(sections: &[(&'static str, String)]) -> usize {
    sections.iter().filter(|(_, c)| !c.is_empty()).map(|(_, c)| c.chars().count()).sum()
}

fn set(sections: &mut [(&'static str, String)], name: &str, value: String) {
    if let Some(entry) = sections.iter_mut().find(|(n, _)| *n == name) {
        entry.1 = value;
    }
}

fn get<'a>(sections: &'a [(&'static str, String)], name: &str) -> &'a str {
    sections.iter().find(|(n, _)| *n == name).map(|(_, c)| c.as_str()).unwrap_or("")
}

/// Truncate a labelled section's body (text after the first newline),
/// keeping the label line intact. No-ops on sections without a body already
/// under `cap` chars.
fn truncate_body(section: &str, cap: usize) -> String {
    if section.is_empty() {
        return String::new();
    }
    match section.split_once('\n') {
        Some((label, body)) => {
            if body.chars().count() <= cap {
                section.to_string()
            } else {
                let truncated: String = body.chars().take(cap).collect();
                format!("{label}\n{truncated}... [truncated]")
            }
        }
        None => {
            if section.chars().count() <= cap {
                section.to_string()
            } else {
                section.chars().take(cap).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::ids::SessionId;
    use brain_core::types::OrchestratorState;

    fn state() -> OrchestratorState {
        OrchestratorState::new(SessionId::from_string("sess-1"))
    }

    #[test]
    fn omits_empty_sections() {
        let st = state();
        let inputs = ContextInputs {
            user_input: "merhaba",
            conversation_history: &[],
            dialog_summary_block: None,
            user_profile: None,
            long_term_memory: &[],
            personality: None,
            state: &st,
            is_smalltalk: false,
            planner_decision: None,
        };
        let result = build(&inputs, ContextBudget::default());
        assert!(!result.enhanced_summary.contains("USER_PROFILE"));
        assert!(result.enhanced_summary.contains("USER_INPUT"));
        assert!(result.enhanced_summary.contains("merhaba"));
    }

    #[test]
    fn smalltalk_suppresses_user_profile() {
        let st = state();
        let inputs = ContextInputs {
            user_input: "naber",
            conversation_history: &[],
            dialog_summary_block: None,
            user_profile: Some("Name: Aylin"),
            long_term_memory: &[],
            personality: None,
            state: &st,
            is_smalltalk: true,
            planner_decision: None,
        };
        let result = build(&inputs, ContextBudget::default());
        assert!(!result.enhanced_summary.contains("USER_PROFILE"));
    }

    #[test]
    fn recent_conversation_keeps_only_last_two_pairs() {
        let st = state();
        let history = vec![
            ("turn1 user".to_string(), "turn1 assistant".to_string()),
            ("turn2 user".to_string(), "turn2 assistant".to_string()),
            ("turn3 user".to_string(), "turn3 assistant".to_string()),
        ];
        let inputs = ContextInputs {
            user_input: "devam",
            conversation_history: &history,
            dialog_summary_block: None,
            user_profile: None,
            long_term_memory: &[],
            personality: None,
            state: &st,
            is_smalltalk: false,
            planner_decision: None,
        };
        let result = build(&inputs, ContextBudget::default());
        assert!(!result.enhanced_summary.contains("turn1 user"));
        assert!(result.enhanced_summary.contains("turn2 user"));
        assert!(result.enhanced_summary.contains("turn3 user"));
    }

    #[test]
    fn over_budget_trims_tool_results_first() {
        let mut st = state();
        for i in 0..20 {
            st.last_tool_results.push(brain_core::types::ToolResult::ok(
                format!("tool_{i}"),
                serde_json::json!({ "detail": "x".repeat(200) }),
                5,
                brain_core::types::RiskLevel::Safe,
            ));
        }
        let inputs = ContextInputs {
            user_input: "toplantilari listele",
            conversation_history: &[],
            dialog_summary_block: Some("DIALOG_SUMMARY:\n- some history"),
            user_profile: None,
            long_term_memory: &[],
            personality: None,
            state: &st,
            is_smalltalk: false,
            planner_decision: None,
        };
        let tiny_budget = ContextBudget { token_budget: 50, ..ContextBudget::default() };
        let result = build(&inputs, tiny_budget);
        assert!(result.enhanced_summary.chars().count() < 50 * CHARS_PER_TOKEN * 3);
    }

    #[test]
    fn cache_reuses_filtered_dialog_summary_across_calls() {
        let st = state();
        let mut builder = ContextBuilder::default();
        let inputs = ContextInputs {
            user_input: "merhaba",
            conversation_history: &[],
            dialog_summary_block: Some("DIALOG_SUMMARY:\n- contact me at test@example.com"),
            user_profile: None,
            long_term_memory: &[],
            personality: None,
            state: &st,
            is_smalltalk: false,
            planner_decision: None,
        };
        let first = builder.build(&inputs, &NullTracer);
        assert!(first.dialog_summary.contains("[EMAIL]"));
        let second = builder.build(&inputs, &NullTracer);
        assert_eq!(first.dialog_summary, second.dialog_summary);
    }
}
