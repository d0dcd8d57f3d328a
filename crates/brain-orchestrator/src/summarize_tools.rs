//! Tool-result summarization for the finalizer prompt (spec §4.11 step d),
//! grounded clause-for-clause on `hybrid_orchestrator.py`'s
//! `summarize_tool_results`: lists over 5 items get a `_preview` + count
//! envelope, calendar-shaped `{"events": [...]}` dicts get the same
//! 5-item preview, oversized strings/objects get a 500-char preview, and if
//! the whole thing still overflows `max_chars` it falls back to the first
//! three tools with a 200-char preview each.

use brain_core::types::ToolResult;
use serde_json::{json, Value};

const PER_ITEM_PREVIEW_CHARS: usize = 500;
const FALLBACK_PREVIEW_CHARS: usize = 200;
const PREVIEW_ITEM_COUNT: usize = 5;
const FALLBACK_TOOL_COUNT: usize = 3;

fn truncate_value(value: &Value, max_size: usize) -> (Value, bool) {
    match value {
        Value::Array(items) if items.len() > PREVIEW_ITEM_COUNT => {
            let total = items.len();
            let preview: Vec<Value> = items.iter().take(PREVIEW_ITEM_COUNT).cloned().collect();
            (
                json!({
                    "_preview": preview,
                    "_truncated": true,
                    "_total_count": total,
                    "_message": format!("Showing first {PREVIEW_ITEM_COUNT} of {total} items"),
                }),
                true,
            )
        }
        Value::Object(map) => {
            if let Some(Value::Array(events)) = map.get("events") {
                if events.len() > PREVIEW_ITEM_COUNT {
                    let total = events.len();
                    let mut out = serde_json::Map::new();
                    out.insert("events".to_string(), Value::Array(events.iter().take(PREVIEW_ITEM_COUNT).cloned().collect()));
                    out.insert("_preview".to_string(), Value::Bool(true));
                    out.insert("_total_events".to_string(), json!(total));
                    out.insert("_message".to_string(), json!(format!("Showing first {PREVIEW_ITEM_COUNT} of {total} events")));
                    for (k, v) in map {
                        if k != "events" {
                            out.insert(k.clone(), v.clone());
                        }
                    }
                    return (Value::Object(out), true);
                }
            }
            let rendered = serde_json::to_string(value).unwrap_or_default();
            if rendered.chars().count() > max_size {
                let preview: String = rendered.chars().take(max_size).collect();
                (Value::String(format!("{preview}… (truncated from {} chars)", rendered.chars().count())), true)
            } else {
                (value.clone(), false)
            }
        }
        Value::String(s) if s.chars().count() > max_size => {
            let preview: String = s.chars().take(max_size).collect();
            (Value::String(format!("{preview}… (truncated from {} chars)", s.chars().count())), true)
        }
        other => (other.clone(), false),
    }
}

/// Summarize `tool_results` into a JSON string capped at `max_chars`.
/// Returns `(summary, was_truncated)`.
#[must_use]
pub fn summarize_tool_results(tool_results: &[ToolResult], max_chars: usize) -> (String, bool) {
    if tool_results.is_empty() {
        return (String::new(), false);
    }

    let mut truncated_any = false;
    let rows: Vec<Value> = tool_results
        .iter()
        .map(|tr| {
            let mut row = json!({
                "tool_name": tr.tool_name,
                "status": format!("{:?}", tr.status).to_lowercase(),
            });
            if let Some(result) = &tr.result {
                let (truncated, was_truncated) = truncate_value(result, PER_ITEM_PREVIEW_CHARS);
                truncated_any = truncated_any || was_truncated;
                row["result"] = truncated;
            }
            if let Some(error) = &tr.error {
                row["error"] = json!(error);
            }
            row
        })
        .collect();

    let mut out = serde_json::to_string(&Value::Array(rows)).unwrap_or_default();

    if out.chars().count() > max_chars {
        truncated_any = true;
        let fallback: Vec<Value> = tool_results
            .iter()
            .take(FALLBACK_TOOL_COUNT)
            .map(|tr| {
                let mut row = json!({"tool_name": tr.tool_name, "status": format!("{:?}", tr.status).to_lowercase()});
                if let Some(result) = &tr.result {
                    let (truncated, _) = truncate_value(result, FALLBACK_PREVIEW_CHARS);
                    row["result"] = truncated;
                }
                row
            })
            .collect();
        out = serde_json::to_string(&Value::Array(fallback)).unwrap_or_default();
        if out.chars().count() > max_chars {
            let clipped: String = out.chars().take(max_chars).collect();
            out = format!("{clipped}… (truncated)");
        }
    }

    (out, truncated_any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::types::RiskLevel;

    #[test]
    fn empty_results_produce_empty_summary() {
        let (summary, truncated) = summarize_tool_results(&[], 2000);
        assert!(summary.is_empty());
        assert!(!truncated);
    }

    #[test]
    fn small_result_passes_through_untruncated() {
        let results = vec![ToolResult::ok("calendar.list_events", json!({"events": []}), 10, RiskLevel::Safe)];
        let (summary, truncated) = summarize_tool_results(&results, 2000);
        assert!(!truncated);
        assert!(summary.contains("calendar.list_events"));
    }

    #[test]
    fn long_event_list_is_previewed_to_five() {
        let events: Vec<Value> = (0..12).map(|i| json!({"id": i})).collect();
        let results = vec![ToolResult::ok("calendar.list_events", json!({"events": events}), 10, RiskLevel::Safe)];
        let (summary, truncated) = summarize_tool_results(&results, 2000);
        assert!(truncated);
        assert!(summary.contains("_total_events"));
    }

    #[test]
    fn oversized_payload_falls_back_to_first_three_tools() {
        let big = "x".repeat(5000);
        let results: Vec<ToolResult> = (0..6)
            .map(|i| ToolResult::ok(format!("tool_{i}"), json!({"blob": big.clone()}), 10, RiskLevel::Safe))
            .collect();
        let (summary, truncated) = summarize_tool_results(&results, 2000);
        assert!(truncated);
        assert!(summary.chars().count() <= 2000 + "… (truncated)".chars().count());
    }
}
