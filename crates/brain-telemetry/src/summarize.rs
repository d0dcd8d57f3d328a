//! Result hashing/truncation for stored tool calls, grounded the same way as
//! `brain-tools`'s executor-side copy (both mirror `JsonlLogger`'s
//! truncate-to-500-chars convention) — duplicated rather than shared because
//! C8 and C10 must not depend on each other; `brain-runtime` is the seam that
//! eventually joins them.

use serde_json::Value;
use sha2::{Digest, Sha256};

const SUMMARY_CHAR_CAP: usize = 500;

pub(crate) fn result_hash(result: &Value) -> String {
    let bytes = serde_json::to_vec(result).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    format!("{digest:x}")
}

pub(crate) fn result_summary(result: &Value) -> String {
    let raw = match result {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    if raw.chars().count() <= SUMMARY_CHAR_CAP {
        return raw;
    }
    let truncated: String = raw.chars().take(SUMMARY_CHAR_CAP).collect();
    format!("{truncated}... [truncated]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_equal_values() {
        let a = serde_json::json!({"messages": [{"id": "m1"}]});
        let b = serde_json::json!({"messages": [{"id": "m1"}]});
        assert_eq!(result_hash(&a), result_hash(&b));
    }

    #[test]
    fn summary_truncates_long_results() {
        let big = Value::String("x".repeat(2000));
        let summary = result_summary(&big);
        assert!(summary.len() <= SUMMARY_CHAR_CAP + "... [truncated]".len());
        assert!(summary.ends_with("... [truncated]"));
    }
}
