//! Append-only JSONL log of LLM call metrics (spec §4.9 "LLM metrics log"),
//! grounded on `bantz.llm.metrics`: one thread-safe file writer plus a pure
//! `analyze`/`format_markdown` reporting pair.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::TelemetryResult;

/// One LLM call metric entry (spec §3 `LLMMetric`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    /// ISO-8601 timestamp.
    pub ts: String,
    /// `"vllm"` | `"gemini"`.
    pub backend: String,
    /// Model identifier.
    pub model: String,
    /// Input token count.
    pub prompt_tokens: u32,
    /// Output token count.
    pub completion_tokens: u32,
    /// `prompt_tokens + completion_tokens`, unless explicitly overridden.
    pub total_tokens: u32,
    /// Request latency.
    pub latency_ms: u32,
    /// Whether the call succeeded.
    pub success: bool,
    /// Error classification, present only when `success == false`.
    pub error_type: Option<String>,
    /// `"fast"` | `"quality"`.
    pub tier: String,
    /// Why this tier was chosen (e.g. `"router_call"`, `"complex_query"`).
    pub reason: String,
}

impl MetricEntry {
    fn success(
        backend: &str,
        model: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
        latency_ms: u32,
        tier: &str,
        reason: &str,
        total_tokens: Option<u32>,
    ) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            backend: backend.to_lowercase(),
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
            total_tokens: total_tokens.unwrap_or(prompt_tokens + completion_tokens),
            latency_ms,
            success: true,
            error_type: None,
            tier: tier.to_lowercase(),
            reason: reason.to_string(),
        }
    }

    fn failure(backend: &str, model: &str, prompt_tokens: u32, latency_ms: u32, error_type: &str, tier: &str, reason: &str) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            backend: backend.to_lowercase(),
            model: model.to_string(),
            prompt_tokens,
            completion_tokens: 0,
            total_tokens: 0,
            latency_ms,
            success: false,
            error_type: Some(error_type.to_string()),
            tier: tier.to_lowercase(),
            reason: reason.to_string(),
        }
    }
}

/// Thread-safe JSONL writer, toggled by [`brain_config::MetricsConfig::enabled`].
pub struct MetricsLog {
    enabled: bool,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MetricsLog {
    /// Build a log from config. Disabled configs accept `record_*` calls as
    /// no-ops, matching the env-var toggle in the original.
    #[must_use]
    pub fn new(config: &brain_config::MetricsConfig) -> Self {
        Self { enabled: config.enabled, path: config.file.clone(), write_lock: Mutex::new(()) }
    }

    /// Whether this log actually writes to disk.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record a successful LLM call. Returns `None` without writing when
    /// disabled.
    pub fn record_success(
        &self,
        backend: &str,
        model: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
        latency_ms: u32,
        tier: &str,
        reason: &str,
    ) -> TelemetryResult<Option<MetricEntry>> {
        let entry = MetricEntry::success(backend, model, prompt_tokens, completion_tokens, latency_ms, tier, reason, None);
        self.write(entry)
    }

    /// Record a failed LLM call. Returns `None` without writing when
    /// disabled.
    pub fn record_failure(
        &self,
        backend: &str,
        model: &str,
        prompt_tokens: u32,
        latency_ms: u32,
        error_type: &str,
        tier: &str,
        reason: &str,
    ) -> TelemetryResult<Option<MetricEntry>> {
        let entry = MetricEntry::failure(backend, model, prompt_tokens, latency_ms, error_type, tier, reason);
        self.write(entry)
    }

    fn write(&self, entry: MetricEntry) -> TelemetryResult<Option<MetricEntry>> {
        if !self.enabled {
            return Ok(None);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(&entry).unwrap_or_default();
        let guard = self.write_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        drop(guard);
        tracing::debug!(backend = %entry.backend, model = %entry.model, latency_ms = entry.latency_ms, "recorded LLM metric");
        Ok(Some(entry))
    }

    /// Load every entry from the backing file, skipping unparseable lines.
    ///
    /// # Errors
    /// Returns [`crate::error::TelemetryError::Io`] if the file exists but
    /// can't be read.
    pub fn load(&self) -> TelemetryResult<Vec<MetricEntry>> {
        load_metrics(&self.path)
    }
}

/// Load metrics from an arbitrary JSONL path (used by reporting tools that
/// don't hold a live [`MetricsLog`]).
///
/// # Errors
/// Returns [`crate::error::TelemetryError::Io`] if the file exists but can't
/// be read.
pub fn load_metrics(path: &Path) -> TelemetryResult<Vec<MetricEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<MetricEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(err) => tracing::warn!(line = line_no + 1, %err, "failed to parse metrics line"),
        }
    }
    Ok(entries)
}

/// Aggregated metrics report, produced by [`analyze`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsReport {
    /// Total entries analyzed.
    pub total_calls: u64,
    /// Entries with `success == true`.
    pub successful_calls: u64,
    /// Entries with `success == false`.
    pub failed_calls: u64,
    /// `successful_calls / total_calls`, `0.0` when empty.
    pub success_rate: f64,
    /// vLLM call count and token sum.
    pub vllm_calls: u64,
    /// Total tokens across vLLM calls.
    pub vllm_tokens: u64,
    /// Gemini call count.
    pub gemini_calls: u64,
    /// Total tokens across Gemini calls.
    pub gemini_tokens: u64,
    /// Calls routed to the fast tier.
    pub fast_calls: u64,
    /// Calls routed to the quality tier.
    pub quality_calls: u64,
    /// `quality_calls / total_calls`.
    pub quality_call_rate: f64,
    /// Latency percentiles/summary over successful calls, in milliseconds.
    pub latency_p50: u32,
    /// p95 latency.
    pub latency_p95: u32,
    /// Mean latency.
    pub latency_mean: u32,
    /// Minimum latency.
    pub latency_min: u32,
    /// Maximum latency.
    pub latency_max: u32,
    /// vLLM-only p50 latency.
    pub vllm_latency_p50: u32,
    /// vLLM-only p95 latency.
    pub vllm_latency_p95: u32,
    /// Gemini-only p50 latency.
    pub gemini_latency_p50: u32,
    /// Gemini-only p95 latency.
    pub gemini_latency_p95: u32,
    /// Count of failed calls by `error_type`.
    pub error_types: std::collections::BTreeMap<String, u64>,
    /// Earliest `ts` in the analyzed set.
    pub first_ts: String,
    /// Latest `ts` in the analyzed set.
    pub last_ts: String,
}

fn percentile(values: &[u32], p: f64) -> u32 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Summarize raw entries into a [`MetricsReport`].
#[must_use]
pub fn analyze(entries: &[MetricEntry]) -> MetricsReport {
    let mut report = MetricsReport::default();
    if entries.is_empty() {
        return report;
    }

    report.total_calls = entries.len() as u64;
    report.successful_calls = entries.iter().filter(|e| e.success).count() as u64;
    report.failed_calls = report.total_calls - report.successful_calls;
    report.success_rate = report.successful_calls as f64 / report.total_calls as f64;

    let vllm: Vec<&MetricEntry> = entries.iter().filter(|e| e.backend == "vllm").collect();
    let gemini: Vec<&MetricEntry> = entries.iter().filter(|e| e.backend == "gemini").collect();
    report.vllm_calls = vllm.len() as u64;
    report.vllm_tokens = vllm.iter().map(|e| u64::from(e.total_tokens)).sum();
    report.gemini_calls = gemini.len() as u64;
    report.gemini_tokens = gemini.iter().map(|e| u64::from(e.total_tokens)).sum();

    report.fast_calls = entries.iter().filter(|e| e.tier == "fast").count() as u64;
    report.quality_calls = entries.iter().filter(|e| e.tier == "quality").count() as u64;
    report.quality_call_rate = report.quality_calls as f64 / report.total_calls as f64;

    let latencies: Vec<u32> = entries.iter().filter(|e| e.success).map(|e| e.latency_ms).collect();
    if !latencies.is_empty() {
        report.latency_p50 = percentile(&latencies, 50.0);
        report.latency_p95 = percentile(&latencies, 95.0);
        report.latency_mean = (latencies.iter().map(|&v| u64::from(v)).sum::<u64>() / latencies.len() as u64) as u32;
        report.latency_min = *latencies.iter().min().unwrap();
        report.latency_max = *latencies.iter().max().unwrap();
    }

    let vllm_latencies: Vec<u32> = vllm.iter().filter(|e| e.success).map(|e| e.latency_ms).collect();
    if !vllm_latencies.is_empty() {
        report.vllm_latency_p50 = percentile(&vllm_latencies, 50.0);
        report.vllm_latency_p95 = percentile(&vllm_latencies, 95.0);
    }
    let gemini_latencies: Vec<u32> = gemini.iter().filter(|e| e.success).map(|e| e.latency_ms).collect();
    if !gemini_latencies.is_empty() {
        report.gemini_latency_p50 = percentile(&gemini_latencies, 50.0);
        report.gemini_latency_p95 = percentile(&gemini_latencies, 95.0);
    }

    for entry in entries.iter().filter(|e| !e.success) {
        if let Some(error_type) = &entry.error_type {
            *report.error_types.entry(error_type.clone()).or_insert(0) += 1;
        }
    }

    let timestamps: Vec<&str> = entries.iter().map(|e| e.ts.as_str()).filter(|ts| !ts.is_empty()).collect();
    if let (Some(min), Some(max)) = (timestamps.iter().min(), timestamps.iter().max()) {
        report.first_ts = (*min).to_string();
        report.last_ts = (*max).to_string();
    }

    report
}

/// Render a [`MetricsReport`] as a Markdown document.
#[must_use]
pub fn format_markdown(report: &MetricsReport) -> String {
    let mut out = String::new();
    out.push_str("# LLM Metrics Report\n\n");
    out.push_str(&format!("**Time Range**: {} → {}\n\n", report.first_ts, report.last_ts));
    out.push_str("## Summary\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| Total Calls | {} |\n", report.total_calls));
    out.push_str(&format!("| Successful | {} ({:.1}%) |\n", report.successful_calls, report.success_rate * 100.0));
    out.push_str(&format!("| Failed | {} |\n\n", report.failed_calls));
    out.push_str("## Latency (Successful Calls)\n\n");
    out.push_str("| Metric | Value |\n|--------|-------|\n");
    out.push_str(&format!("| p50 | {} ms |\n", report.latency_p50));
    out.push_str(&format!("| p95 | {} ms |\n", report.latency_p95));
    out.push_str(&format!("| Mean | {} ms |\n", report.latency_mean));
    out.push_str(&format!("| Min | {} ms |\n", report.latency_min));
    out.push_str(&format!("| Max | {} ms |\n\n", report.latency_max));
    out.push_str("## Backend Breakdown\n\n");
    out.push_str("| Backend | Calls | Total Tokens | p50 Latency | p95 Latency |\n|---------|-------|--------------|-------------|-------------|\n");
    out.push_str(&format!("| vLLM | {} | {} | {} ms | {} ms |\n", report.vllm_calls, report.vllm_tokens, report.vllm_latency_p50, report.vllm_latency_p95));
    out.push_str(&format!(
        "| Gemini | {} | {} | {} ms | {} ms |\n\n",
        report.gemini_calls, report.gemini_tokens, report.gemini_latency_p50, report.gemini_latency_p95
    ));
    out.push_str("## Tier Distribution\n\n");
    out.push_str("| Tier | Calls | Rate |\n|------|-------|------|\n");
    let fast_rate = if report.total_calls == 0 { 0.0 } else { report.fast_calls as f64 / report.total_calls as f64 * 100.0 };
    out.push_str(&format!("| Fast | {} | {fast_rate:.1}% |\n", report.fast_calls));
    out.push_str(&format!("| Quality | {} | {:.1}% |\n\n", report.quality_calls, report.quality_call_rate * 100.0));

    if !report.error_types.is_empty() {
        out.push_str("## Error Breakdown\n\n| Error Type | Count |\n|------------|-------|\n");
        let mut counts: Vec<(&String, &u64)> = report.error_types.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (error_type, count) in counts {
            out.push_str(&format!("| {error_type} | {count} |\n"));
        }
        out.push('\n');
    }

    out.push_str("---\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_log_records_nothing() {
        let config = brain_config::MetricsConfig { enabled: false, file: PathBuf::from("/tmp/should-not-exist.jsonl") };
        let log = MetricsLog::new(&config);
        let result = log.record_success("vllm", "qwen2.5-3b", 100, 50, 200, "fast", "router_call").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn enabled_log_writes_and_loads_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let config = brain_config::MetricsConfig { enabled: true, file: path.clone() };
        let log = MetricsLog::new(&config);

        log.record_success("vllm", "qwen2.5-3b", 100, 50, 200, "fast", "router_call").unwrap();
        log.record_failure("gemini", "gemini-flash", 80, 500, "timeout", "quality", "complex_query").unwrap();

        let entries = log.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].total_tokens, 150);
        assert!(!entries[1].success);
    }

    #[test]
    fn analyze_computes_rates_and_latency_percentiles() {
        let entries = vec![
            MetricEntry::success("vllm", "m", 10, 10, 100, "fast", "r", None),
            MetricEntry::success("vllm", "m", 10, 10, 200, "fast", "r", None),
            MetricEntry::failure("gemini", "m", 10, 50, "timeout", "quality", "r"),
        ];
        let report = analyze(&entries);
        assert_eq!(report.total_calls, 3);
        assert_eq!(report.successful_calls, 2);
        assert_eq!(report.failed_calls, 1);
        assert_eq!(report.error_types.get("timeout"), Some(&1));
        assert_eq!(report.latency_min, 100);
        assert_eq!(report.latency_max, 200);
    }

    #[test]
    fn format_markdown_includes_key_sections() {
        let entries = vec![MetricEntry::success("vllm", "m", 10, 10, 100, "fast", "r", None)];
        let report = analyze(&entries);
        let markdown = format_markdown(&report);
        assert!(markdown.contains("# LLM Metrics Report"));
        assert!(markdown.contains("Total Calls"));
    }

    #[test]
    fn empty_analyze_has_zero_rates() {
        let report = analyze(&[]);
        assert_eq!(report.total_calls, 0);
        assert!((report.success_rate - 0.0).abs() < f64::EPSILON);
    }
}
