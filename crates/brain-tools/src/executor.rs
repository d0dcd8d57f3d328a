//! `ToolExecutor::execute` (spec §4.7): the confirmation-gated dispatch path
//! every tool call goes through. Grounded on
//! `original_source/tests/test_confirmation_firewall.py`'s `Executor` —
//! `execute`/`confirm_action` and the safe-runs-immediately /
//! destructive-blocks-then-runs-after-confirm / skip_confirmation-flag /
//! per-params-confirmation behaviors are all asserted there.

use std::time::Instant;

use brain_approval::{get_confirmation_prompt, requires_confirmation, ToolRiskRegistry};
use brain_core::types::RiskLevel;
use serde_json::Value;

use crate::confirm::ConfirmationStore;
use crate::events::{NullEventSink, ToolEventSink};
use crate::summarize::{result_hash, result_summary};
use crate::types::{ExecutionResult, Step, ToolCallRecord};

/// Dispatches tool calls through the confirmation firewall and reports the
/// outcome as a `ToolCallRecord` for the caller to persist.
pub struct ToolExecutor {
    registry: ToolRiskRegistry,
    confirmations: ConfirmationStore,
}

impl ToolExecutor {
    /// Build an executor backed by `registry`.
    #[must_use]
    pub fn new(registry: ToolRiskRegistry) -> Self {
        Self { registry, confirmations: ConfirmationStore::new() }
    }

    /// Grant a one-shot confirmation for `step` (spec §4.7 `confirm_action`).
    pub fn confirm_action(&self, step: &Step) {
        self.confirmations.grant(&step.action, &step.params);
    }

    /// Dispatch `step` through `runner_fn` (spec §4.7 algorithm).
    ///
    /// `runner_fn` is the actual handler dispatcher: `(action, params) ->
    /// Result<data, user_safe_message>`. `llm_requested_confirmation` is the
    /// orchestrator's own `requires_confirmation` flag for this step, fed
    /// into the firewall alongside the tool's registered risk (spec §4.5).
    /// Set `skip_confirmation` to bypass the firewall entirely (tests,
    /// already-approved automation).
    pub fn execute(
        &self,
        step: &Step,
        runner_fn: impl FnOnce(&str, &std::collections::BTreeMap<String, Value>) -> Result<Value, String>,
        skip_confirmation: bool,
        llm_requested_confirmation: bool,
    ) -> ExecutionResult {
        self.execute_with_sink(step, runner_fn, skip_confirmation, llm_requested_confirmation, &NullEventSink)
    }

    /// Same as [`Self::execute`], but publishes `tool.executed`/`tool.failed`
    /// to `sink` (spec §4.7 step 4) instead of discarding the event.
    pub fn execute_with_sink(
        &self,
        step: &Step,
        runner_fn: impl FnOnce(&str, &std::collections::BTreeMap<String, Value>) -> Result<Value, String>,
        skip_confirmation: bool,
        llm_requested_confirmation: bool,
        sink: &dyn ToolEventSink,
    ) -> ExecutionResult {
        let risk = self.registry.get_tool_risk(&step.action);

        let mut confirmed = skip_confirmation;
        if !skip_confirmation && requires_confirmation(risk, llm_requested_confirmation) {
            let already_granted = self.confirmations.take(&step.action, &step.params);
            if !already_granted {
                let prompt = get_confirmation_prompt(&step.action, &step.params);
                return ExecutionResult::awaiting_confirmation(prompt, risk);
            }
            confirmed = true;
        }

        let started = Instant::now();
        let outcome = runner_fn(&step.action, &step.params);
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let params_json = Value::Object(step.params.clone().into_iter().collect());

        match outcome {
            Ok(data) => {
                let record = ToolCallRecord {
                    tool_name: step.action.clone(),
                    params: params_json,
                    ok: true,
                    result_hash: Some(result_hash(&data)),
                    result_summary: Some(result_summary(&data)),
                    error: None,
                    elapsed_ms,
                    confirmed,
                    risk_level: risk,
                };
                sink.on_tool_call("tool.executed", &record);
                if data.get("duplicate").and_then(Value::as_bool) == Some(true) {
                    tracing::info!(tool = %step.action, "idempotent duplicate surfaced by handler");
                }
                ExecutionResult::success(data, risk, record)
            }
            Err(error) => {
                let record = ToolCallRecord {
                    tool_name: step.action.clone(),
                    params: params_json,
                    ok: false,
                    result_hash: None,
                    result_summary: None,
                    error: Some(error.clone()),
                    elapsed_ms,
                    confirmed,
                    risk_level: risk,
                };
                sink.on_tool_call("tool.failed", &record);
                ExecutionResult::failure(error, risk, record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn step(action: &str, params: &[(&str, Value)]) -> Step {
        Step::new(action, params.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect::<BTreeMap<_, _>>())
    }

    #[test]
    fn safe_tool_executes_immediately() {
        let executor = ToolExecutor::new(ToolRiskRegistry::default());
        let result =
            executor.execute(&step("calendar_query", &[]), |_, _| Ok(serde_json::json!({"events": []})), false, false);
        assert!(result.ok);
        assert!(!result.awaiting_confirmation);
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn destructive_tool_blocks_then_executes_after_confirmation() {
        let executor = ToolExecutor::new(ToolRiskRegistry::default());
        let target = step("calendar_cancel", &[("event_id", Value::String("evt123".to_string()))]);

        let blocked = executor.execute(&target, |_, _| Ok(serde_json::json!({"deleted": "evt123"})), false, false);
        assert!(blocked.awaiting_confirmation);
        assert!(blocked.confirmation_prompt.is_some());
        assert_eq!(blocked.risk_level, RiskLevel::Destructive);

        executor.confirm_action(&target);
        let proceeded = executor.execute(&target, |_, _| Ok(serde_json::json!({"deleted": "evt123"})), false, false);
        assert!(proceeded.ok);
        assert!(!proceeded.awaiting_confirmation);
        assert_eq!(proceeded.data.unwrap()["deleted"], "evt123");
    }

    #[test]
    fn skip_confirmation_flag_bypasses_the_firewall() {
        let executor = ToolExecutor::new(ToolRiskRegistry::default());
        let target = step("calendar_cancel", &[("event_id", Value::String("evt123".to_string()))]);
        let result = executor.execute(&target, |_, _| Ok(serde_json::json!({"deleted": "evt123"})), true, false);
        assert!(result.ok);
        assert!(!result.awaiting_confirmation);
    }

    #[test]
    fn different_params_need_separate_confirmation() {
        let executor = ToolExecutor::new(ToolRiskRegistry::default());
        let step1 = step("calendar_cancel", &[("event_id", Value::String("evt1".to_string()))]);
        let step2 = step("calendar_cancel", &[("event_id", Value::String("evt2".to_string()))]);

        executor.confirm_action(&step1);
        let result1 = executor.execute(&step1, |_, _| Ok(serde_json::json!({"deleted": "evt1"})), false, false);
        assert!(result1.ok);

        let result2 = executor.execute(&step2, |_, _| Ok(serde_json::json!({"deleted": "evt2"})), false, false);
        assert!(result2.awaiting_confirmation);
    }

    #[test]
    fn handler_error_produces_failure_record() {
        let executor = ToolExecutor::new(ToolRiskRegistry::default());
        let target = step("calendar_query", &[]);
        let result = executor.execute(&target, |_, _| Err("calendar unreachable".to_string()), false, false);
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("calendar unreachable"));
        assert!(!result.record.unwrap().ok);
    }

    #[test]
    fn moderate_tool_blocks_only_when_llm_requests_confirmation() {
        let executor = ToolExecutor::new(ToolRiskRegistry::default());
        let target = step("calendar_modify", &[("event_id", Value::String("evt123".to_string()))]);

        let unasked = executor.execute(&target, |_, _| Ok(serde_json::json!({"modified": true})), false, false);
        assert!(unasked.ok);
        assert!(!unasked.awaiting_confirmation);
        assert_eq!(unasked.risk_level, RiskLevel::Moderate);

        let blocked = executor.execute(&target, |_, _| Ok(serde_json::json!({"modified": true})), false, true);
        assert!(blocked.awaiting_confirmation);
        assert_eq!(blocked.risk_level, RiskLevel::Moderate);

        executor.confirm_action(&target);
        let proceeded = executor.execute(&target, |_, _| Ok(serde_json::json!({"modified": true})), false, true);
        assert!(proceeded.ok);
    }
}
