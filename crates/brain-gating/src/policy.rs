//! `GatingPolicy::evaluate` (spec §4.8 "Decision rules"), grounded on
//! `quality_gating.py`'s `GatingPolicy.evaluate` — the decision order below
//! mirrors it clause for clause.

use std::collections::VecDeque;
use std::sync::Mutex;

use brain_config::{FinalizerMode, GatingConfig};

use crate::rate_limiter::{QualityRateLimiter, RateLimiterStats};
use crate::score::{QualityScore, ScoreWeights};

/// Which tier to use for this turn's finalizer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatingDecision {
    /// Use the fast (local) tier.
    UseFast,
    /// Use the quality (cloud) tier.
    UseQuality,
    /// Neither — the rate limiter has no capacity and this isn't a mode
    /// that falls back (spec §4.8 "`BLOCKED` outcome is only reported in
    /// `force_quality` and `always` modes").
    Blocked,
}

/// The outcome of one `evaluate` call.
#[derive(Debug, Clone)]
pub struct GatingResult {
    /// Which tier to use.
    pub decision: GatingDecision,
    /// The score that drove the decision.
    pub score: QualityScore,
    /// Which rule matched (spec §4.8 reason strings, e.g.
    /// `"bypass_pattern_match"`).
    pub reason: String,
    /// Whether the rate limiter was the deciding factor.
    pub rate_limited: bool,
}

fn matches_any(text: &str, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let lowered = text.to_lowercase();
    patterns.iter().any(|p| !p.is_empty() && lowered.contains(&p.to_lowercase()))
}

const MAX_HISTORY: usize = 100;

/// Policy engine deciding between the fast and quality finalizer tiers
/// (spec §4.8).
pub struct GatingPolicy {
    config: GatingConfig,
    rate_limiter: QualityRateLimiter,
    history: Mutex<VecDeque<GatingDecision>>,
}

impl GatingPolicy {
    /// Build a policy from `config`, with its own rate limiter sized from
    /// `config.quality_rate_limit` / `config.rate_window_seconds`.
    #[must_use]
    pub fn new(config: GatingConfig) -> Self {
        let rate_limiter = QualityRateLimiter::new(config.quality_rate_limit, config.rate_window_seconds);
        Self { config, rate_limiter, history: Mutex::new(VecDeque::new()) }
    }

    /// Decide which tier to use for `user_input` (spec §4.8 decision rules,
    /// evaluated in order, first match wins).
    #[must_use]
    pub fn evaluate(&self, user_input: &str, tool_names: &[String], requires_confirmation: bool, enforce_rate_limit: bool) -> GatingResult {
        let score = QualityScore::compute(user_input, tool_names, requires_confirmation, ScoreWeights::default());

        if matches_any(user_input, &self.config.bypass_patterns) {
            return self.record(score, GatingDecision::UseFast, "bypass_pattern_match", false);
        }

        if matches_any(user_input, &self.config.force_quality_patterns) {
            if enforce_rate_limit && !self.rate_limiter.acquire() {
                return self.record(score, GatingDecision::Blocked, "force_quality_rate_limited", true);
            }
            return self.record(score, GatingDecision::UseQuality, "force_quality_pattern_match", false);
        }

        match self.config.finalizer_mode {
            FinalizerMode::Never => return self.record(score, GatingDecision::UseFast, "finalizer_mode_never", false),
            FinalizerMode::Always => {
                if enforce_rate_limit && !self.rate_limiter.acquire() {
                    return self.record(score, GatingDecision::Blocked, "finalizer_mode_always_rate_limited", true);
                }
                return self.record(score, GatingDecision::UseQuality, "finalizer_mode_always", false);
            }
            FinalizerMode::Auto => {}
        }

        if score.total <= self.config.fast_max_threshold {
            return self.record(score, GatingDecision::UseFast, "score_below_fast_threshold", false);
        }

        if score.total >= self.config.quality_threshold {
            if enforce_rate_limit && !self.rate_limiter.acquire() {
                return self.record(score, GatingDecision::UseFast, "quality_rate_limited_fallback", true);
            }
            return self.record(score, GatingDecision::UseQuality, "score_above_quality_threshold", false);
        }

        if score.complexity >= self.config.min_complexity_for_quality || score.writing >= self.config.min_writing_for_quality {
            if enforce_rate_limit && !self.rate_limiter.acquire() {
                return self.record(score, GatingDecision::UseFast, "component_escalation_rate_limited", true);
            }
            return self.record(score, GatingDecision::UseQuality, "component_threshold_exceeded", false);
        }

        self.record(score, GatingDecision::UseFast, "default_fast", false)
    }

    fn record(&self, score: QualityScore, decision: GatingDecision, reason: &str, rate_limited: bool) -> GatingResult {
        let mut history = self.history.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        history.push_back(decision);
        if history.len() > MAX_HISTORY {
            history.pop_front();
        }
        GatingResult { decision, score, reason: reason.to_string(), rate_limited }
    }

    /// Aggregate stats over the last (up to 100) decisions.
    #[must_use]
    pub fn stats(&self) -> GatingStats {
        let history = self.history.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let total = history.len();
        let quality_count = history.iter().filter(|d| **d == GatingDecision::UseQuality).count();
        let fast_count = history.iter().filter(|d| **d == GatingDecision::UseFast).count();
        let blocked_count = history.iter().filter(|d| **d == GatingDecision::Blocked).count();
        GatingStats {
            total_decisions: total,
            quality_count,
            fast_count,
            blocked_count,
            quality_ratio: if total == 0 { 0.0 } else { (quality_count as f64 / total as f64 * 1000.0).round() / 1000.0 },
            rate_limiter: self.rate_limiter.stats(),
        }
    }

    /// Clear decision history and the rate limiter's counters.
    pub fn reset_stats(&self) {
        self.history.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
        self.rate_limiter.reset();
    }
}

/// Aggregate policy statistics (spec §4.8 `get_stats`).
#[derive(Debug, Clone, Copy)]
pub struct GatingStats {
    /// Decisions in the retained history window.
    pub total_decisions: usize,
    /// How many chose the quality tier.
    pub quality_count: usize,
    /// How many chose the fast tier.
    pub fast_count: usize,
    /// How many were blocked outright.
    pub blocked_count: usize,
    /// `quality_count / total_decisions`.
    pub quality_ratio: f64,
    /// The underlying rate limiter's own stats.
    pub rate_limiter: RateLimiterStats,
}
