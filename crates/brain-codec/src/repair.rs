//! Enum/type coercion and structural repair for router JSON output (spec
//! §4.1 `repair_enums`), plus the lower-effort regex-based extraction path
//! and its attempt/success counters.

use std::sync::{LazyLock, Mutex};

use regex::Regex;
use serde_json::{Map, Value};

use brain_core::types::{CalendarIntent, Route};

/// Regex-based fenced/raw JSON block finder, cheaper than the balanced-brace
/// scanner and tried first by callers that only care about markdown fences.
/// Returns `None` rather than erroring; the caller falls back to
/// [`crate::extract::extract_first_json_object`] on a miss.
#[must_use]
pub fn extract_json_from_text(text: &str) -> Option<String> {
    static FENCE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());
    static BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)(\{.*\})").unwrap());

    if let Some(caps) = FENCE.captures(text) {
        return Some(caps[1].to_string());
    }
    BARE.captures(text).map(|caps| caps[1].to_string())
}

/// Map a non-canonical route keyword onto its nearest valid [`Route`],
/// defaulting to `unknown` (ground truth: `repair_route_enum`).
#[must_use]
pub fn repair_route_enum(raw: &str) -> &'static str {
    let lowered = raw.trim().to_ascii_lowercase();
    if Route::from_keyword(&lowered).is_some() {
        return route_keyword(&lowered);
    }
    match lowered.as_str() {
        "create_meeting" | "schedule_meeting" | "meeting" | "event" | "calendar_event" => "calendar",
        "mail" | "email" | "inbox" | "message" => "gmail",
        "chat" | "chitchat" | "greeting" | "small_talk" => "smalltalk",
        "meta" | "settings" | "config" | "admin" => "system",
        "cancel" | "cancelled" | "abort" | "stop" => "cancelled",
        _ => "unknown",
    }
}

fn route_keyword(canonical: &str) -> &'static str {
    match canonical {
        "calendar" => "calendar",
        "gmail" => "gmail",
        "smalltalk" => "smalltalk",
        "system" => "system",
        "cancelled" => "cancelled",
        _ => "unknown",
    }
}

/// Map a non-canonical calendar-intent keyword onto its nearest valid
/// [`CalendarIntent`], defaulting to `none` (ground truth: `repair_intent_enum`).
#[must_use]
pub fn repair_intent_enum(raw: &str) -> &'static str {
    let lowered = raw.trim().to_ascii_lowercase();
    if CalendarIntent::from_keyword(&lowered).is_some() {
        return intent_keyword(&lowered);
    }
    match lowered.as_str() {
        "schedule" | "add" | "new" | "book" => "create",
        "update" | "edit" | "change" | "reschedule" => "modify",
        "delete" | "remove" | "abort" => "cancel",
        "find" | "search" | "list" | "show" => "query",
        _ => "none",
    }
}

fn intent_keyword(canonical: &str) -> &'static str {
    match canonical {
        "create" => "create",
        "modify" => "modify",
        "cancel" => "cancel",
        "query" => "query",
        _ => "none",
    }
}

/// Coerce a `tool_plan` value of any reasonable shape into a `Vec<String>`
/// (ground truth: `repair_tool_plan`): `null` -> empty, a bare string ->
/// single-element list unless it parses as a JSON array or looks
/// comma-separated, already-a-list -> passed through verbatim.
#[must_use]
pub fn repair_tool_plan(raw: &Value) -> Vec<String> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Vec::new();
            }
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
                return items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
            }
            if trimmed.contains(',') {
                return trimmed.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            }
            vec![trimmed.to_string()]
        }
        _ => Vec::new(),
    }
}

/// Coerce a `confidence` value into `[0.0, 1.0]`, defaulting to `0.5` for
/// anything that doesn't parse as a plain float (a Turkish word like
/// "yüksek", or a locale-formatted "0,85").
fn repair_confidence(raw: Option<&Value>) -> (f64, bool) {
    match raw {
        Some(Value::Number(n)) => {
            if let Some(f) = n.as_f64() {
                return (f.clamp(0.0, 1.0), f < 0.0 || f > 1.0);
            }
            (0.5, true)
        }
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) => (f.clamp(0.0, 1.0), f < 0.0 || f > 1.0),
            Err(_) => (0.5, true),
        },
        _ => (0.5, true),
    }
}

/// Tracks how often each repair kicks in, for observability (ground truth:
/// `RepairStats`). A single process-wide instance, reset between test runs
/// or orchestrator restarts via [`reset_repair_stats`].
#[derive(Debug, Clone, Default)]
pub struct RepairStats {
    /// Total repair attempts recorded.
    pub total_attempts: u64,
    /// Attempts that produced a change (a repair "fired").
    pub successful_repairs: u64,
    /// Attempts where nothing needed fixing.
    pub failed_repairs: u64,
    /// Per-kind counts (`route_enum`, `intent_enum`, `tool_plan`, `confidence`, ...).
    pub repair_types: std::collections::BTreeMap<String, u64>,
}

impl RepairStats {
    /// Percentage of attempts that resulted in a successful repair.
    #[must_use]
    pub fn repair_rate(&self) -> f64 {
        if self.total_attempts == 0 {
            0.0
        } else {
            (self.successful_repairs as f64 / self.total_attempts as f64) * 100.0
        }
    }

    /// Record that a repair was attempted.
    pub fn record_attempt(&mut self) {
        self.total_attempts += 1;
    }

    /// Record a successful repair of the given kind.
    pub fn record_success(&mut self, kind: &str) {
        self.successful_repairs += 1;
        *self.repair_types.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Record a repair attempt that did not change anything.
    pub fn record_failure(&mut self) {
        self.failed_repairs += 1;
    }

    /// Snapshot as a serializable summary for logs/telemetry.
    #[must_use]
    pub fn summary(&self) -> Value {
        serde_json::json!({
            "total_attempts": self.total_attempts,
            "successful_repairs": self.successful_repairs,
            "failed_repairs": self.failed_repairs,
            "repair_rate": self.repair_rate(),
            "repair_types": self.repair_types,
        })
    }
}

static REPAIR_STATS: LazyLock<Mutex<RepairStats>> = LazyLock::new(|| Mutex::new(RepairStats::default()));

/// Reset the process-wide repair stats counter, typically called at the
/// start of a test or a fresh orchestrator run.
pub fn reset_repair_stats() {
    *REPAIR_STATS.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = RepairStats::default();
}

/// Snapshot the process-wide repair stats counter.
#[must_use]
pub fn get_repair_stats() -> RepairStats {
    REPAIR_STATS.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
}

fn record(kind: &str, changed: bool) {
    let mut stats = REPAIR_STATS.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    stats.record_attempt();
    if changed {
        stats.record_success(kind);
    } else {
        stats.record_failure();
    }
}

/// Repair a raw parsed JSON object's field types and enum values in place,
/// filling in spec-mandated defaults for anything missing (ground truth:
/// `repair_json_structure`). Always succeeds — this never rejects input,
/// only coerces it towards something [`crate::validate::validate`] can accept.
#[must_use]
pub fn repair_json_structure(mut value: Value) -> Value {
    let mut obj = value.as_object_mut().map_or_else(
        || {
            let mut fresh = Map::new();
            fresh.insert("assistant_reply".to_string(), Value::String(String::new()));
            fresh
        },
        std::mem::take,
    );

    let route_raw = obj.get("route").and_then(Value::as_str).unwrap_or("unknown").to_string();
    let repaired_route = repair_route_enum(&route_raw);
    record("route_enum", repaired_route != route_raw);
    obj.insert("route".to_string(), Value::String(repaired_route.to_string()));

    let intent_raw = obj.get("calendar_intent").and_then(Value::as_str).unwrap_or("none").to_string();
    let repaired_intent = repair_intent_enum(&intent_raw);
    record("intent_enum", repaired_intent != intent_raw);
    obj.insert("calendar_intent".to_string(), Value::String(repaired_intent.to_string()));

    let plan_raw = obj.get("tool_plan").cloned().unwrap_or(Value::Null);
    let was_list = matches!(plan_raw, Value::Array(_));
    let repaired_plan = repair_tool_plan(&plan_raw);
    record("tool_plan", !was_list);
    obj.insert(
        "tool_plan".to_string(),
        Value::Array(repaired_plan.into_iter().map(Value::String).collect()),
    );

    let (confidence, was_defaulted) = repair_confidence(obj.get("confidence"));
    record("confidence", was_defaulted);
    obj.insert("confidence".to_string(), serde_json::json!(confidence));

    obj.entry("slots".to_string()).or_insert_with(|| Value::Object(Map::new()));
    obj.entry("assistant_reply".to_string()).or_insert_with(|| Value::String(String::new()));
    obj.entry("ask_user".to_string()).or_insert(Value::Bool(false));
    obj.entry("question".to_string()).or_insert_with(|| Value::String(String::new()));
    obj.entry("requires_confirmation".to_string()).or_insert(Value::Bool(false));
    obj.entry("confirmation_prompt".to_string()).or_insert_with(|| Value::String(String::new()));
    obj.entry("memory_update".to_string()).or_insert_with(|| Value::Object(Map::new()));
    obj.entry("reasoning_summary".to_string()).or_insert_with(|| Value::Array(Vec::new()));

    value = Value::Object(obj);
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_enum_maps_known_aliases() {
        assert_eq!(repair_route_enum("create_meeting"), "calendar");
        assert_eq!(repair_route_enum("chat"), "smalltalk");
        assert_eq!(repair_route_enum("calendar"), "calendar");
        assert_eq!(repair_route_enum("gibberish_xyz"), "unknown");
    }

    #[test]
    fn intent_enum_maps_known_aliases() {
        assert_eq!(repair_intent_enum("schedule"), "create");
        assert_eq!(repair_intent_enum("find"), "query");
        assert_eq!(repair_intent_enum("create"), "create");
    }

    #[test]
    fn tool_plan_coerces_every_shape() {
        assert_eq!(repair_tool_plan(&Value::Null), Vec::<String>::new());
        assert_eq!(
            repair_tool_plan(&Value::String("calendar.create_event".to_string())),
            vec!["calendar.create_event".to_string()]
        );
        assert_eq!(
            repair_tool_plan(&Value::String(r#"["calendar.create_event", "gmail.send"]"#.to_string())),
            vec!["calendar.create_event".to_string(), "gmail.send".to_string()]
        );
        assert_eq!(
            repair_tool_plan(&Value::String("calendar.create, gmail.send".to_string())),
            vec!["calendar.create".to_string(), "gmail.send".to_string()]
        );
        assert_eq!(repair_tool_plan(&Value::String(String::new())), Vec::<String>::new());
    }

    #[test]
    fn confidence_defaults_on_non_numeric_string() {
        let (value, defaulted) = repair_confidence(Some(&Value::String("yüksek".to_string())));
        assert_eq!(value, 0.5);
        assert!(defaulted);
    }

    #[test]
    fn structure_repair_fills_missing_fields() {
        let input = serde_json::json!({"assistant_reply": "Merhaba!"});
        let repaired = repair_json_structure(input);
        assert_eq!(repaired["route"], "unknown");
        assert_eq!(repaired["calendar_intent"], "none");
        assert_eq!(repaired["confidence"], 0.5);
        assert_eq!(repaired["tool_plan"], serde_json::json!([]));
    }

    #[test]
    fn repair_stats_track_rate() {
        reset_repair_stats();
        for _ in 0..8 {
            record("route_enum", true);
        }
        for _ in 0..2 {
            record("route_enum", false);
        }
        let stats = get_repair_stats();
        assert_eq!(stats.total_attempts, 10);
        assert_eq!(stats.successful_repairs, 8);
        assert_eq!(stats.failed_repairs, 2);
        assert!((stats.repair_rate() - 80.0).abs() < f64::EPSILON);
    }
}
