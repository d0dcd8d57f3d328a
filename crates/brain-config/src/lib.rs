//! Environment-variable configuration for the brain runtime (spec §6).
//!
//! Follows the shape of `astrid-config`/`PolicyConfig::from_env`: one typed
//! struct per concern, loaded from environment variables with documented
//! defaults, never panicking on a malformed value (falls back silently,
//! matching `quality_gating.py`'s `env_float`/`env_int` helpers).

use std::env;
use std::path::PathBuf;

mod env_helpers;
use env_helpers::{env_bool, env_float, env_int, env_list, env_path, env_str};

/// `FINALIZER_MODE` values (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizerMode {
    /// Decide per-turn via score thresholds.
    Auto,
    /// Always attempt the finalizer (subject to rate limiting).
    Always,
    /// Never attempt the finalizer.
    Never,
}

impl FinalizerMode {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "always" => Self::Always,
            "never" => Self::Never,
            _ => Self::Auto,
        }
    }
}

/// `FINALIZER_TYPE` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizerType {
    /// Cloud-hosted high-quality model.
    Quality,
    /// Locally-hosted model.
    Local,
}

impl FinalizerType {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            _ => Self::Quality,
        }
    }
}

/// `CLOUD_MODE` values: `local` disables any cloud finalizer outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudMode {
    /// Cloud calls permitted (subject to other gates).
    Cloud,
    /// Cloud calls forbidden regardless of other flags.
    Local,
}

/// Dialog memory store configuration (spec §4.3 / §6).
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Max past sessions to reload on boot.
    pub max_sessions: u32,
    /// Max turns per session to reload on boot.
    pub max_turns: u32,
    /// Whether to apply the PII filter before persisting.
    pub pii_filter_enabled: bool,
}

impl MemoryConfig {
    fn from_env() -> Self {
        let default_db = directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".bantz").join("memory.db"))
            .unwrap_or_else(|| PathBuf::from(".bantz/memory.db"));
        Self {
            db_path: env_path("MEMORY_DB_PATH", default_db),
            max_sessions: env_int("MEMORY_MAX_SESSIONS", 5).max(1) as u32,
            max_turns: env_int("MEMORY_MAX_TURNS", 20).max(1) as u32,
            pii_filter_enabled: env_bool("MEMORY_PII_FILTER", true),
        }
    }
}

/// Quality gating thresholds and rate limit (spec §4.8 / §6).
#[derive(Debug, Clone)]
pub struct GatingConfig {
    /// Score at/above which the quality tier is used (auto mode).
    pub quality_threshold: f64,
    /// Score at/below which the fast tier is always used (auto mode).
    pub fast_max_threshold: f64,
    /// Minimum `complexity` component to escalate to quality.
    pub min_complexity_for_quality: u8,
    /// Minimum `writing` component to escalate to quality.
    pub min_writing_for_quality: u8,
    /// Max quality-tier requests per window.
    pub quality_rate_limit: u32,
    /// Sliding window size, in seconds.
    pub rate_window_seconds: f64,
    /// Finalizer invocation mode.
    pub finalizer_mode: FinalizerMode,
    /// Substrings that force the fast tier when matched.
    pub bypass_patterns: Vec<String>,
    /// Substrings that force the quality tier when matched.
    pub force_quality_patterns: Vec<String>,
}

impl GatingConfig {
    fn from_env() -> Self {
        Self {
            quality_threshold: env_float("QUALITY_SCORE_THRESHOLD", 2.5),
            fast_max_threshold: env_float("FAST_MAX_THRESHOLD", 1.5),
            min_complexity_for_quality: env_int("MIN_COMPLEXITY_FOR_QUALITY", 4).clamp(0, 5) as u8,
            min_writing_for_quality: env_int("MIN_WRITING_FOR_QUALITY", 4).clamp(0, 5) as u8,
            quality_rate_limit: env_int("QUALITY_RATE_LIMIT", 30).max(1) as u32,
            rate_window_seconds: env_float("RATE_WINDOW_SECONDS", 60.0).max(0.001),
            finalizer_mode: FinalizerMode::parse(&env_str("FINALIZER_MODE", "auto")),
            bypass_patterns: env_list("QUALITY_BYPASS_PATTERNS"),
            force_quality_patterns: env_list("FORCE_QUALITY_PATTERNS"),
        }
    }
}

/// Finalizer provider selection (spec §6).
#[derive(Debug, Clone)]
pub struct FinalizerConfig {
    /// `quality` vs `local`.
    pub finalizer_type: FinalizerType,
    /// Optional model id override.
    pub model: Option<String>,
    /// Kill switch; default enabled.
    pub enabled: bool,
    /// `local` forbids any cloud finalizer regardless of other flags.
    pub cloud_mode: CloudMode,
    /// Sampling temperature for finalizer calls.
    pub temperature: f64,
    /// Sampling temperature for router calls (deterministic by default).
    pub router_temperature: f64,
    /// Use the router's reply when the finalizer errors.
    pub fallback_to_router: bool,
    /// Enable the no-new-facts grounding guard (C3).
    pub no_new_facts_guard: bool,
}

impl FinalizerConfig {
    fn from_env() -> Self {
        let cloud_mode = if env_str("CLOUD_MODE", "cloud").trim().eq_ignore_ascii_case("local") {
            CloudMode::Local
        } else {
            CloudMode::Cloud
        };
        Self {
            finalizer_type: FinalizerType::parse(&env_str("FINALIZER_TYPE", "quality")),
            model: env::var("FINALIZER_MODEL").ok().filter(|s| !s.is_empty()),
            enabled: env_bool("FINALIZE_WITH_FINALIZER", true),
            cloud_mode,
            temperature: env_float("FINALIZER_TEMPERATURE", 0.4),
            router_temperature: env_float("ROUTER_TEMPERATURE", 0.0),
            fallback_to_router: env_bool("FALLBACK_TO_ROUTER", true),
            no_new_facts_guard: env_bool("NO_NEW_FACTS_GUARD", true),
        }
    }

    /// Whether the finalizer may be invoked at all this process.
    #[must_use]
    pub fn finalizer_usable(&self) -> bool {
        self.enabled && !matches!(self.cloud_mode, CloudMode::Local)
    }
}

/// LLM metrics log configuration (spec §4.9 / §6).
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether the JSONL metrics log is enabled.
    pub enabled: bool,
    /// Path to the JSONL file.
    pub file: PathBuf,
}

impl MetricsConfig {
    fn from_env() -> Self {
        let default_path = directories::BaseDirs::new()
            .map(|b| b.home_dir().join(".bantz").join("llm_metrics.jsonl"))
            .unwrap_or_else(|| PathBuf::from(".bantz/llm_metrics.jsonl"));
        Self {
            enabled: env_bool("LLM_METRICS_ENABLED", false),
            file: env_path("LLM_METRICS_FILE", default_path),
        }
    }
}

/// The idempotency store's on-disk location (spec §4.6 / §6).
#[derive(Debug, Clone)]
pub struct IdempotencyConfig {
    /// JSON store path.
    pub store_path: PathBuf,
    /// Default record TTL, in seconds.
    pub ttl_seconds: u64,
}

impl IdempotencyConfig {
    fn from_env() -> Self {
        Self {
            store_path: env_path("IDEMPOTENCY_STORE", PathBuf::from("artifacts/tmp/calendar_idempotency.json")),
            ttl_seconds: env_int("IDEMPOTENCY_TTL_SECONDS", 24 * 60 * 60).max(1) as u64,
        }
    }
}

/// Aggregate configuration for the whole brain runtime.
#[derive(Debug, Clone)]
pub struct BrainConfig {
    /// Dialog memory store config.
    pub memory: MemoryConfig,
    /// Quality gating config.
    pub gating: GatingConfig,
    /// Finalizer selection & guard config.
    pub finalizer: FinalizerConfig,
    /// LLM metrics log config.
    pub metrics: MetricsConfig,
    /// Idempotency store config.
    pub idempotency: IdempotencyConfig,
}

impl BrainConfig {
    /// Load the full configuration from environment variables, falling back
    /// to documented defaults for anything unset or malformed.
    #[must_use]
    pub fn from_env() -> Self {
        let config = Self {
            memory: MemoryConfig::from_env(),
            gating: GatingConfig::from_env(),
            finalizer: FinalizerConfig::from_env(),
            metrics: MetricsConfig::from_env(),
            idempotency: IdempotencyConfig::from_env(),
        };
        tracing::debug!(?config, "loaded brain configuration from environment");
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane_without_any_env_vars() {
        // SAFETY: test-only; no other test in this crate mutates these vars
        // concurrently (single-threaded test binary default for this crate).
        let config = BrainConfig::from_env();
        assert_eq!(config.gating.quality_threshold, 2.5);
        assert_eq!(config.gating.fast_max_threshold, 1.5);
        assert!(config.finalizer.enabled);
        assert!(!config.metrics.enabled);
        assert_eq!(config.idempotency.ttl_seconds, 24 * 60 * 60);
    }

    #[test]
    fn finalizer_usable_respects_cloud_mode_local() {
        let mut config = FinalizerConfig::from_env();
        config.cloud_mode = CloudMode::Local;
        assert!(!config.finalizer_usable());
    }
}
