//! Violation/result types returned by [`crate::guard::validate`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The category of fact a violation falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// A number not present in any source text.
    NewNumber,
    /// A time not present in any source text.
    NewTime,
    /// A date not present in any source text.
    NewDate,
    /// A currency amount not present in any source text.
    NewCurrency,
    /// A percentage not present in any source text.
    NewPercentage,
}

impl ViolationType {
    /// Stable lowercase identifier, used in telemetry and retry prompts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationType::NewNumber => "new_number",
            ViolationType::NewTime => "new_time",
            ViolationType::NewDate => "new_date",
            ViolationType::NewCurrency => "new_currency",
            ViolationType::NewPercentage => "new_percentage",
        }
    }
}

/// One fact that appeared in the candidate reply without grounding in any
/// source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Which category this violation belongs to.
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    /// The offending token, in its normalized form.
    pub value: String,
    /// Severity label, currently always `"high"` — reserved for future
    /// tiering (e.g. downgrading near-miss rounding differences).
    pub severity: String,
}

impl Violation {
    /// Build a high-severity violation of the given kind.
    #[must_use]
    pub fn new(violation_type: ViolationType, value: impl Into<String>) -> Self {
        Self { violation_type, value: value.into(), severity: "high".to_string() }
    }

    /// Serializable form for logs/telemetry.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.violation_type.as_str(),
            "value": self.value,
            "severity": self.severity,
        })
    }
}

/// Outcome of a grounding-guard check over one candidate reply.
#[derive(Debug, Clone)]
pub struct GuardResult {
    /// Whether `violations.len() <= max_violations`.
    pub passed: bool,
    /// Every fact in the candidate not traceable to a source text.
    pub violations: Vec<Violation>,
    /// The union of numeric tokens allowed by the sources, for debugging.
    pub allowed_numbers: HashSet<String>,
    /// The candidate's own numeric tokens, for debugging.
    pub candidate_numbers: HashSet<String>,
}

impl GuardResult {
    /// Serializable summary for logs/telemetry.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "passed": self.passed,
            "violation_count": self.violations.len(),
            "violations": self.violations.iter().map(Violation::to_json).collect::<Vec<_>>(),
            "allowed_numbers_count": self.allowed_numbers.len(),
            "candidate_numbers_count": self.candidate_numbers.len(),
        })
    }
}
