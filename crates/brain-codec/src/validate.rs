//! Strict validation of a repaired JSON object into an [`OrchestratorOutput`]
//! (spec §4.1 `validate`, `validate_and_repair`).

use std::collections::BTreeMap;

use brain_core::types::{CalendarIntent, OrchestratorOutput, Route};
use serde_json::Value;

use crate::error::{CodecError, CodecResult};
use crate::extract::extract_first_json_object;
use crate::repair::repair_json_structure;

/// Every field `validate` understands after repair (spec §4.1 "strict
/// schema"). Anything else in the object is rejected rather than silently
/// dropped, mirroring `RouterOutputSchema`'s `model_config =
/// ConfigDict(extra="forbid")`.
const KNOWN_FIELDS: &[&str] = &[
    "route",
    "calendar_intent",
    "slots",
    "confidence",
    "tool_plan",
    "assistant_reply",
    "ask_user",
    "question",
    "requires_confirmation",
    "confirmation_prompt",
    "memory_update",
    "reasoning_summary",
];

/// Validate an already-repaired JSON object into an [`OrchestratorOutput`].
///
/// Unlike the extract/repair steps, this is strict: it assumes
/// `repair_json_structure` has already normalized enums, types, and
/// defaults, and only rejects what repair cannot fix — namely a
/// `requires_confirmation: true` with no prompt, or an `ask_user: true` with
/// no question (spec §8 invariant 3).
///
/// # Errors
/// Returns [`CodecError::Validation`] if the object is missing `route`/
/// `calendar_intent` after repair (meaning repair was bypassed) or violates
/// the confirmation/question invariants above.
pub fn validate(value: &Value) -> CodecResult<OrchestratorOutput> {
    let obj = value
        .as_object()
        .ok_or_else(|| CodecError::Validation("top-level value is not a JSON object".to_string()))?;

    if let Some(extra) = obj.keys().find(|key| !KNOWN_FIELDS.contains(&key.as_str())) {
        return Err(CodecError::Validation(format!("unrecognized field: {extra}")));
    }

    let route_raw = obj
        .get("route")
        .and_then(Value::as_str)
        .ok_or_else(|| CodecError::Validation("missing route after repair".to_string()))?;
    let route = Route::from_keyword(route_raw)
        .ok_or_else(|| CodecError::Validation(format!("unrecognized route after repair: {route_raw}")))?;

    let intent_raw = obj
        .get("calendar_intent")
        .and_then(Value::as_str)
        .unwrap_or("none");
    let calendar_intent = CalendarIntent::from_keyword(intent_raw)
        .ok_or_else(|| CodecError::Validation(format!("unrecognized calendar_intent after repair: {intent_raw}")))?;

    let confidence = obj.get("confidence").and_then(Value::as_f64).unwrap_or(0.5).clamp(0.0, 1.0);

    let tool_plan = obj
        .get("tool_plan")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let slots = object_as_map(obj.get("slots"));
    let memory_update = object_as_map(obj.get("memory_update"));

    let assistant_reply = obj.get("assistant_reply").and_then(Value::as_str).unwrap_or_default().to_string();
    let ask_user = obj.get("ask_user").and_then(Value::as_bool).unwrap_or(false);
    let question = obj.get("question").and_then(Value::as_str).unwrap_or_default().to_string();
    let requires_confirmation = obj.get("requires_confirmation").and_then(Value::as_bool).unwrap_or(false);
    let confirmation_prompt = obj.get("confirmation_prompt").and_then(Value::as_str).unwrap_or_default().to_string();

    if ask_user && question.is_empty() {
        return Err(CodecError::Validation("ask_user is true but question is empty".to_string()));
    }
    if requires_confirmation && confirmation_prompt.is_empty() {
        return Err(CodecError::Validation(
            "requires_confirmation is true but confirmation_prompt is empty".to_string(),
        ));
    }

    let reasoning_summary = match obj.get("reasoning_summary") {
        Some(Value::String(joined)) => {
            joined.split('\n').map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect()
        }
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    };

    Ok(OrchestratorOutput {
        route,
        calendar_intent,
        slots,
        confidence,
        tool_plan,
        assistant_reply,
        ask_user,
        question,
        requires_confirmation,
        confirmation_prompt,
        memory_update,
        reasoning_summary,
        raw_output: obj.clone().into_iter().collect(),
    })
}

fn object_as_map(value: Option<&Value>) -> BTreeMap<String, Value> {
    value
        .and_then(Value::as_object)
        .map(|m| m.clone().into_iter().collect())
        .unwrap_or_default()
}

/// Full pipeline: extract the first JSON object from raw LLM text, repair
/// its structure, then strictly validate (ground truth:
/// `validate_and_repair_json`). This is the entry point callers should use;
/// [`validate`] and the individual repair functions are exposed for testing
/// and for the LLM-based repair fallback in [`crate::llm_repair`].
///
/// # Errors
/// Propagates whatever [`extract_first_json_object`] or [`validate`] fail
/// with; the structural repair step itself never errors.
pub fn validate_and_repair(raw: &str) -> CodecResult<OrchestratorOutput> {
    let extracted = extract_first_json_object(raw)?;
    let repaired = repair_json_structure(extracted);
    validate(&repaired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_validates_immediately() {
        let raw = serde_json::json!({
            "route": "calendar",
            "calendar_intent": "create",
            "confidence": 0.9,
            "tool_plan": ["calendar.create_event"],
            "assistant_reply": "Oluşturuyorum.",
            "slots": {},
        })
        .to_string();
        let output = validate_and_repair(&raw).unwrap();
        assert_eq!(output.route, Route::Calendar);
        assert_eq!(output.calendar_intent, CalendarIntent::Create);
    }

    #[test]
    fn wrong_enums_are_repaired_and_validated() {
        let raw = serde_json::json!({
            "route": "create_meeting",
            "calendar_intent": "schedule",
            "confidence": "yüksek",
            "tool_plan": "calendar.create_event",
            "assistant_reply": "Yarın toplantı oluşturuyorum.",
        })
        .to_string();
        let output = validate_and_repair(&raw).unwrap();
        assert_eq!(output.route, Route::Calendar);
        assert_eq!(output.calendar_intent, CalendarIntent::Create);
        assert_eq!(output.tool_plan, vec!["calendar.create_event".to_string()]);
    }

    #[test]
    fn missing_confirmation_prompt_is_rejected() {
        let raw = serde_json::json!({
            "route": "calendar",
            "calendar_intent": "cancel",
            "confidence": 0.9,
            "requires_confirmation": true,
        })
        .to_string();
        assert!(validate_and_repair(&raw).is_err());
    }

    #[test]
    fn unparseable_json_returns_error() {
        let raw = r#"{"route": "calendar", "calendar_in"#;
        assert!(validate_and_repair(raw).is_err());
    }

    #[test]
    fn extra_field_is_rejected() {
        let raw = serde_json::json!({
            "route": "calendar",
            "calendar_intent": "query",
            "confidence": 0.8,
            "invalid_field": "should fail",
        })
        .to_string();
        let err = validate_and_repair(&raw).unwrap_err().to_string();
        assert!(err.contains("invalid_field"));
    }

    #[test]
    fn reasoning_summary_string_is_coerced_to_list() {
        let raw = serde_json::json!({
            "route": "calendar",
            "calendar_intent": "query",
            "confidence": 0.85,
            "reasoning_summary": "User asked about events\nChecking calendar",
        })
        .to_string();
        let output = validate_and_repair(&raw).unwrap();
        assert_eq!(output.reasoning_summary, vec!["User asked about events", "Checking calendar"]);
    }
}
