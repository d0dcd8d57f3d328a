//! Section renderers (spec §4.4 "Sections composed in order").

use brain_core::types::{EntityRef, ToolResult, ToolStatus};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::ConversationTurn;

/// Labels a non-empty block with a `NAME:` header, or returns empty when the
/// body is empty (sections are "omitted when empty" per spec).
fn labelled(label: &str, body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!("{label}:\n{body}")
    }
}

pub(crate) fn user_profile(profile: Option<&str>) -> String {
    labelled("USER_PROFILE", profile.unwrap_or_default())
}

pub(crate) fn personality(block: Option<&str>) -> String {
    labelled("PERSONALITY", block.unwrap_or_default())
}

pub(crate) fn long_term_memory(bullets: &[String], max: usize) -> String {
    let body = bullets
        .iter()
        .take(max)
        .map(|b| format!("- {b}"))
        .collect::<Vec<_>>()
        .join("\n");
    labelled("LONG_TERM_MEMORY", &body)
}

pub(crate) fn recent_conversation(history: &[ConversationTurn], count: usize) -> String {
    let tail_start = history.len().saturating_sub(count);
    let body = history[tail_start..]
        .iter()
        .map(|(u, a)| format!("U: {u}\nA: {a}"))
        .collect::<Vec<_>>()
        .join("\n");
    labelled("RECENT_CONVERSATION", &body)
}

/// Summarize one tool result's payload to a `≤cap`-char preview (spec §4.4
/// rule 6): lists beyond 5 items show the first 5 plus a count, `events`-keyed
/// dicts follow the same pattern, string values are truncated with an
/// explicit marker.
fn summarize_value(value: &Value, cap: usize) -> String {
    if let Value::String(s) = value {
        return truncate_with_marker(s, cap);
    }
    let rendered = match value {
        Value::Array(items) => summarize_list(items),
        Value::Object(map) => {
            if let Some(Value::Array(events)) = map.get("events") {
                summarize_list(events)
            } else {
                summarize_object(map)
            }
        }
        other => other.to_string(),
    };
    truncate_with_marker(&rendered, cap)
}

fn truncate_with_marker(s: &str, cap: usize) -> String {
    if s.chars().count() > cap {
        let truncated: String = s.chars().take(cap).collect();
        format!("{truncated}... [truncated]")
    } else {
        s.to_string()
    }
}

fn summarize_list(items: &[Value]) -> String {
    if items.len() > 5 {
        let head: Vec<String> = items[..5].iter().map(value_preview).collect();
        format!("[{}, ... +{} more]", head.join(", "), items.len() - 5)
    } else {
        let parts: Vec<String> = items.iter().map(value_preview).collect();
        format!("[{}]", parts.join(", "))
    }
}

fn summarize_object(map: &serde_json::Map<String, Value>) -> String {
    let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}={}", value_preview(v))).collect();
    format!("{{{}}}", parts.join(", "))
}

fn value_preview(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn last_tool_results(results: &[ToolResult], per_item_cap: usize) -> String {
    let body = results
        .iter()
        .map(|r| {
            let status = match r.status {
                ToolStatus::Ok => "ok",
                ToolStatus::Error => "fail",
                ToolStatus::Skipped => "skipped",
                ToolStatus::AwaitingConfirmation => "awaiting_confirmation",
            };
            let summary = match (&r.result, &r.error) {
                (Some(value), _) => summarize_value(value, per_item_cap),
                (None, Some(err)) => summarize_value(&Value::String(err.clone()), per_item_cap),
                (None, None) => String::new(),
            };
            format!("- {} ({status}): {summary}", r.tool_name)
        })
        .collect::<Vec<_>>()
        .join("\n");
    labelled("LAST_TOOL_RESULTS", &body)
}

pub(crate) fn reference_table(table: &BTreeMap<u32, EntityRef>) -> String {
    let body = table
        .iter()
        .map(|(n, entity)| {
            let desc = match entity {
                EntityRef::Event { title, .. } => format!("event \"{title}\""),
                EntityRef::Email { subject, .. } => format!("email \"{subject}\""),
                EntityRef::File { path } => format!("file {path}"),
            };
            format!("#{n}: {desc}")
        })
        .collect::<Vec<_>>()
        .join("\n");
    labelled("REFERENCE_TABLE", &body)
}

pub(crate) fn planner_decision(decision: Option<&Value>) -> String {
    labelled(
        "PLANNER_DECISION",
        &decision.map(std::string::ToString::to_string).unwrap_or_default(),
    )
}

pub(crate) fn session_context(now: chrono::DateTime<chrono::Utc>) -> String {
    labelled("SESSION_CONTEXT", &now.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
