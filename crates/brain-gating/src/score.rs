//! `QualityScore`: the weighted heuristic score driving C9's tier decision
//! (spec §4.8), grounded on `quality_gating.py`'s `QualityScore.compute`.

use std::collections::BTreeMap;

use brain_core::text::{score_complexity, score_risk, score_writing_need};

/// Weights applied to each component before summing into `total` (spec §4.8
/// "Default weights: (0.35, 0.45, 0.20)").
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    /// Weight on the complexity component.
    pub complexity: f64,
    /// Weight on the writing component.
    pub writing: f64,
    /// Weight on the risk component.
    pub risk: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { complexity: 0.35, writing: 0.45, risk: 0.20 }
    }
}

/// The combined heuristic score for one turn's quality-tier decision.
#[derive(Debug, Clone)]
pub struct QualityScore {
    /// 0-5 multi-step/planning complexity.
    pub complexity: u8,
    /// 0-5 formal-writing need.
    pub writing: u8,
    /// 0-5 destructive-action risk.
    pub risk: u8,
    /// The weighted sum of the three components.
    pub total: f64,
    /// Each component's weighted contribution, for debugging/telemetry.
    pub components: BTreeMap<String, f64>,
}

impl QualityScore {
    /// Compute the score for `text`, given the tools the router planned and
    /// whether this turn already requires confirmation.
    #[must_use]
    pub fn compute(text: &str, tool_names: &[String], requires_confirmation: bool, weights: ScoreWeights) -> Self {
        let complexity = score_complexity(text);
        let writing = score_writing_need(text);
        let risk = score_risk(text, tool_names, requires_confirmation);

        let complexity_weighted = f64::from(complexity) * weights.complexity;
        let writing_weighted = f64::from(writing) * weights.writing;
        let risk_weighted = f64::from(risk) * weights.risk;
        let total = complexity_weighted + writing_weighted + risk_weighted;

        let mut components = BTreeMap::new();
        components.insert("complexity".to_string(), complexity_weighted);
        components.insert("writing".to_string(), writing_weighted);
        components.insert("risk".to_string(), risk_weighted);

        Self { complexity, writing, risk, total: (total * 100.0).round() / 100.0, components }
    }
}
