//! Small `std::env::var` parsing helpers, mirroring the `env_float`/`env_int`
//! free functions in `quality_gating.py` and `memory_store.py`: read a
//! variable, fall back to a default on absence or parse failure, never panic.

use std::env;
use std::path::PathBuf;

pub(crate) fn env_str(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_path(name: &str, default: PathBuf) -> PathBuf {
    env::var(name).ok().filter(|v| !v.is_empty()).map(PathBuf::from).unwrap_or(default)
}

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

pub(crate) fn env_int(name: &str, default: i64) -> i64 {
    env::var(name).ok().and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(default)
}

pub(crate) fn env_float(name: &str, default: f64) -> f64 {
    env::var(name).ok().and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(default)
}

/// Comma-separated list, trimmed, empty entries dropped. Returns an empty
/// vector when unset, matching `force_quality_patterns` defaulting to `[]`
/// in the original `PolicyConfig`.
pub(crate) fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
