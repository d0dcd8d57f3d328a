//! Result hashing and truncation for `ToolCall` records (spec §4.7 step 5).

use serde_json::Value;
use sha2::{Digest, Sha256};

const SUMMARY_CHAR_CAP: usize = 500;

/// SHA-256 over the canonical JSON encoding of `result`. `serde_json`
/// serializes object keys in `BTreeMap` order by default, so this is
/// deterministic across calls with the same logical result.
#[must_use]
pub fn result_hash(result: &Value) -> String {
    let canonical = serde_json::to_vec(result).unwrap_or_default();
    let digest = Sha256::digest(&canonical);
    format!("{digest:x}")
}

/// A `<=500`-char preview of `result`, truncated with a marker (spec §4.7
/// step 5 "result_summary (<=500 chars)").
#[must_use]
pub fn result_summary(result: &Value) -> String {
    let rendered = match result {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    if rendered.chars().count() <= SUMMARY_CHAR_CAP {
        rendered
    } else {
        let truncated: String = rendered.chars().take(SUMMARY_CHAR_CAP).collect();
        format!("{truncated}... [truncated]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_equal_values() {
        let a = serde_json::json!({"event_id": "evt1", "title": "x"});
        let b = serde_json::json!({"event_id": "evt1", "title": "x"});
        assert_eq!(result_hash(&a), result_hash(&b));
    }

    #[test]
    fn hash_differs_for_different_values() {
        let a = serde_json::json!({"event_id": "evt1"});
        let b = serde_json::json!({"event_id": "evt2"});
        assert_ne!(result_hash(&a), result_hash(&b));
    }

    #[test]
    fn summary_passes_through_short_results() {
        let result = serde_json::json!({"event_id": "evt1"});
        assert_eq!(result_summary(&result), r#"{"event_id":"evt1"}"#);
    }

    #[test]
    fn summary_truncates_long_results() {
        let long = Value::String("x".repeat(1000));
        let summary = result_summary(&long);
        assert!(summary.ends_with("... [truncated]"));
        assert!(summary.chars().count() <= SUMMARY_CHAR_CAP + "... [truncated]".chars().count());
    }
}
