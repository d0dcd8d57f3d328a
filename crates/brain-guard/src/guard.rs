//! The grounding guard itself (spec §4.2 `validate`): unions numeric/
//! temporal/currency/percentage tokens across every source text, diffs them
//! against the candidate reply's tokens, and reports violations.

use serde_json::Value;

use crate::extract::{
    extract_currencies, extract_dates, extract_numbers, extract_percentages, extract_times,
    extract_turkish_numbers,
};
use crate::types::{GuardResult, Violation, ViolationType};

/// A no-new-facts grounding guard with a configurable violation tolerance.
#[derive(Debug, Clone, Copy)]
pub struct GroundingGuard {
    max_violations: usize,
}

impl Default for GroundingGuard {
    fn default() -> Self {
        Self { max_violations: 0 }
    }
}

impl GroundingGuard {
    /// Build a guard that tolerates up to `max_violations` before failing.
    #[must_use]
    pub fn new(max_violations: usize) -> Self {
        Self { max_violations }
    }

    /// Check `candidate_text` against every source (user input, planner
    /// decision JSON, dialog summary, tool results).
    #[must_use]
    pub fn validate(
        &self,
        user_input: &str,
        planner_decision: Option<&Value>,
        dialog_summary: Option<&str>,
        tool_results: &[Value],
        candidate_text: &str,
    ) -> GuardResult {
        if candidate_text.trim().is_empty() {
            return GuardResult {
                passed: true,
                violations: Vec::new(),
                allowed_numbers: Default::default(),
                candidate_numbers: Default::default(),
            };
        }

        let mut source_texts: Vec<String> = vec![user_input.to_string()];
        if let Some(decision) = planner_decision {
            source_texts.push(serde_json::to_string(decision).unwrap_or_default());
        }
        if let Some(summary) = dialog_summary {
            source_texts.push(summary.to_string());
        }
        for result in tool_results {
            source_texts.push(serde_json::to_string(result).unwrap_or_default());
        }
        let combined_sources = source_texts.join("\n");

        let allowed_numbers: std::collections::HashSet<String> = source_texts
            .iter()
            .flat_map(|t| extract_numbers(t).into_iter().chain(extract_turkish_numbers(t)))
            .collect();
        let allowed_times: std::collections::HashSet<String> =
            source_texts.iter().flat_map(|t| extract_times(t)).collect();
        let allowed_dates: std::collections::HashSet<String> =
            source_texts.iter().flat_map(|t| extract_dates(t)).collect();
        let allowed_currencies: std::collections::HashSet<String> =
            source_texts.iter().flat_map(|t| extract_currencies(t)).collect();
        let allowed_percentages: std::collections::HashSet<String> =
            source_texts.iter().flat_map(|t| extract_percentages(t)).collect();

        let candidate_numbers: std::collections::HashSet<String> =
            extract_numbers(candidate_text).into_iter().chain(extract_turkish_numbers(candidate_text)).collect();
        let candidate_times = extract_times(candidate_text);
        let candidate_dates = extract_dates(candidate_text);
        let candidate_currencies = extract_currencies(candidate_text);
        let candidate_percentages = extract_percentages(candidate_text);

        let mut violations = Vec::new();
        for value in candidate_numbers.difference(&allowed_numbers) {
            violations.push(Violation::new(ViolationType::NewNumber, value.clone()));
        }
        for value in candidate_times.difference(&allowed_times) {
            violations.push(Violation::new(ViolationType::NewTime, value.clone()));
        }
        for value in candidate_dates.difference(&allowed_dates) {
            violations.push(Violation::new(ViolationType::NewDate, value.clone()));
        }
        for value in candidate_currencies.difference(&allowed_currencies) {
            violations.push(Violation::new(ViolationType::NewCurrency, value.clone()));
        }
        for value in candidate_percentages.difference(&allowed_percentages) {
            violations.push(Violation::new(ViolationType::NewPercentage, value.clone()));
        }

        let passed = violations.len() <= self.max_violations;
        if !passed {
            tracing::debug!(
                violation_count = violations.len(),
                sources_len = combined_sources.len(),
                "grounding guard rejected candidate reply"
            );
        }

        GuardResult { passed, violations, allowed_numbers, candidate_numbers }
    }

    /// Rebuild `original_prompt` with a strict no-new-facts clause prepended
    /// and the offending values spelled out, for the hybrid orchestrator's
    /// single retry (spec §4.2 retry protocol).
    #[must_use]
    pub fn build_retry_prompt(&self, original_prompt: &str, result: &GuardResult) -> String {
        let offending: Vec<String> = result.violations.iter().map(|v| v.value.clone()).collect();
        format!(
            "STRICT_NO_NEW_FACTS: Yalnızca TOOL_RESULTS ve sağlanan kaynaklardan yanıt ver. \
             Şu değerler kaynaklarda bulunmuyor ve kullanılmaları YASAK: {offending_joined}. \
             Emin olmadığın bir bilgi varsa 'bilmiyorum' de.\n\n{original_prompt}",
            offending_joined = offending.join(", "),
        )
    }
}

/// Convenience free function mirroring the spec's `validate(...)` signature,
/// using the default zero-tolerance guard.
#[must_use]
pub fn validate(
    user_input: &str,
    planner_decision: Option<&Value>,
    dialog_summary: Option<&str>,
    tool_results: &[Value],
    candidate_text: &str,
) -> GuardResult {
    GroundingGuard::default().validate(user_input, planner_decision, dialog_summary, tool_results, candidate_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_response_passes() {
        let result = validate(
            "Yarın saat 14:00'de toplantı ayarla",
            Some(&json!({"slots": {"time": "14:00"}})),
            None,
            &[json!({"success": true})],
            "Toplantınızı saat 14:00'e ayarladım efendim.",
        );
        assert!(result.passed);
    }

    #[test]
    fn invented_time_fails() {
        let result = validate(
            "Yarın saat 14:00'de toplantı ayarla",
            Some(&json!({"slots": {"time": "14:00"}})),
            None,
            &[json!({"success": true})],
            "Toplantınızı saat 14:30'a ayarladım efendim.",
        );
        assert!(!result.passed);
        assert!(result.violations.iter().any(|v| v.value == "14:30"));
    }

    #[test]
    fn empty_candidate_passes() {
        let result = validate("Test", None, None, &[], "");
        assert!(result.passed);
    }

    #[test]
    fn max_violations_threshold_tolerates_one() {
        let guard = GroundingGuard::new(1);
        let result = guard.validate("Meeting with 5 people", None, None, &[], "Toplantı 10 kişiyle");
        assert!(result.passed);
    }

    #[test]
    fn turkish_numbers_in_source_allow_digit_in_candidate() {
        let result = validate("iki kişi gelecek", None, None, &[], "2 people coming");
        assert!(result.passed);
    }

    #[test]
    fn dialog_summary_and_tool_results_extend_the_source_union() {
        let from_summary = validate(
            "Continue meeting",
            None,
            Some("Previous: Meeting scheduled for 15:00"),
            &[],
            "Toplantı 15:00'de devam edecek",
        );
        assert!(from_summary.passed);

        let from_tools = validate(
            "Check my calendar",
            None,
            None,
            &[json!({"events": [{"time": "10:00", "title": "Standup"}]})],
            "10:00'da Standup toplantınız var",
        );
        assert!(from_tools.passed);
    }

    #[test]
    fn retry_prompt_includes_marker_and_offending_value() {
        let result = validate("Meeting at 14:00", None, None, &[], "Toplantı 16:00'da");
        let retry = GroundingGuard::default().build_retry_prompt("Generate response", &result);
        assert!(retry.contains("STRICT_NO_NEW_FACTS"));
        assert!(retry.contains("YASAK") || retry.contains("16:00"));
    }
}
