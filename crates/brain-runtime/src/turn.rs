//! `process_turn` (spec §4.12, §6): the single entry point that ties every
//! other module together for one user turn. Grounded on
//! `astrid-runtime::runtime::execution`'s turn-processing shape — open a
//! tracked span, build context, call the model, dispatch tools, persist
//! memory, close the span — generalized from Astrid's streaming tool-call
//! loop to this workspace's plan-then-finalize two-phase orchestration.

use std::collections::BTreeMap;

use brain_approval::{classify_turkish_response, ConfirmationReply};
use brain_context::{ContextBuilder, ContextInputs, NullTracer};
use brain_core::types::{
    CalendarIntent, CompactSummary, OrchestratorOutput, OrchestratorState, PendingAction,
    Route, ToolResult, ToolStatus,
};
use brain_orchestrator::HybridOrchestrator;
use brain_tools::{ExecutionResult, Step, ToolExecutor};
use chrono::Utc;
use serde_json::Value;

use crate::event_sink::EventBusSink;
use crate::handlers::ToolHandlerRegistry;
use crate::RuntimeResult;

const EVENT_SOURCE: &str = "brain-runtime";

/// Everything one turn needs, bundled so `process_turn` stays a single call.
pub struct TurnDeps<'a> {
    pub hybrid: &'a HybridOrchestrator,
    pub tool_executor: &'a ToolExecutor,
    pub tool_handlers: &'a ToolHandlerRegistry,
    pub memory: &'a mut brain_memory::PersistentDialogSummaryManager,
    pub context_builder: &'a mut ContextBuilder,
    pub telemetry: &'a brain_telemetry::RunTracker,
    pub event_bus: &'a brain_telemetry::EventBus,
}

/// Run one turn of the assistant loop (spec §4.12's nine-step flow), mutating
/// and returning `state` alongside the turn's finalized output.
///
/// # Errors
/// Returns [`crate::error::RuntimeError`] only for failures the turn cannot
/// recover from by degrading gracefully (the router/finalizer transport
/// itself failing, or the SQLite-backed memory store failing to persist) —
/// tool failures and codec/guard problems are absorbed into the returned
/// `OrchestratorOutput` instead.
pub async fn process_turn(
    deps: &mut TurnDeps<'_>,
    user_input: &str,
    mut state: OrchestratorState,
) -> RuntimeResult<(OrchestratorOutput, OrchestratorState)> {
    let mut run = deps.telemetry.track_run(user_input, Some(state.session_id.as_str()));
    deps.event_bus.publish(
        "run.started",
        serde_json::json!({ "run_id": run.run_id().as_str() }),
        EVENT_SOURCE,
        None,
    );

    if !state.pending_confirmations.is_empty() {
        let outcome = handle_pending_confirmation(deps, user_input, &mut state, &mut run).await?;
        deps.event_bus.publish(
            "run.completed",
            serde_json::json!({ "run_id": run.run_id().as_str(), "route": format!("{:?}", outcome.route) }),
            EVENT_SOURCE,
            None,
        );
        return Ok((outcome, state));
    }

    let dialog_summary = deps.memory.to_prompt_block();
    let is_smalltalk = state.last_tool_results.is_empty() && state.reference_table.is_empty();
    let context_inputs = ContextInputs {
        user_input,
        conversation_history: &[],
        dialog_summary_block: Some(dialog_summary.as_str()),
        user_profile: None,
        long_term_memory: &[],
        personality: None,
        state: &state,
        is_smalltalk,
        planner_decision: None,
    };
    let context = deps.context_builder.build(&context_inputs, &NullTracer);

    let plan_output = deps.hybrid.plan(user_input, &context.enhanced_summary).await?;
    run.set_route(route_label(&plan_output));
    state.last_tool_results.clear();

    let tool_executor = deps.tool_executor;
    let tool_handlers = deps.tool_handlers;
    let event_bus = deps.event_bus;

    let mut awaiting: Option<OrchestratorOutput> = None;
    for tool_name in &plan_output.tool_plan {
        let step = Step::new(tool_name.clone(), slots_for_tool(&plan_output, tool_name));
        let mut tool_span = run.track_tool(tool_name.clone(), Value::Object(step.params.clone().into_iter().collect()));
        let sink = EventBusSink::new(event_bus, EVENT_SOURCE);
        let execution = tool_executor.execute_with_sink(
            &step,
            |name, params| tool_handlers.dispatch(name, params),
            false,
            plan_output.requires_confirmation,
            &sink,
        );

        match to_tool_result(tool_name, &execution) {
            ExecutedOutcome::Awaiting(prompt) => {
                tool_span.set_skipped("awaiting_confirmation");
                drop(tool_span);
                state.pending_confirmations.push(PendingAction {
                    tool: tool_name.clone(),
                    slots: slots_for_tool(&plan_output, tool_name),
                    prompt: prompt.clone(),
                    risk_level: execution.risk_level,
                    fingerprint: None,
                });
                let output = plan_output.with_reply(prompt);
                run.set_final_output(&output.assistant_reply);
                awaiting = Some(output);
                break;
            }
            ExecutedOutcome::Done(result) => {
                match &result.status {
                    ToolStatus::Ok => tool_span.set_result(result.result.clone().unwrap_or(Value::Null)),
                    ToolStatus::Error => tool_span.set_error(result.error.clone().unwrap_or_default()),
                    _ => {}
                }
                state.last_tool_results.push(result);
            }
        }
    }

    if let Some(output) = awaiting {
        persist_turn(deps, &mut state, user_input, &output, "onay bekleniyor")?;
        return Ok((output, state));
    }

    let final_output =
        deps.hybrid.finalize(&plan_output, user_input, &context.enhanced_summary, &state.last_tool_results).await;
    run.set_final_output(&final_output.assistant_reply);

    let action_taken = summarize_action(&final_output, &state);
    persist_turn(deps, &mut state, user_input, &final_output, &action_taken)?;

    deps.event_bus.publish(
        "run.completed",
        serde_json::json!({ "run_id": run.run_id().as_str(), "route": format!("{:?}", final_output.route) }),
        EVENT_SOURCE,
        None,
    );

    Ok((final_output, state))
}

enum ExecutedOutcome {
    Awaiting(String),
    Done(ToolResult),
}

fn to_tool_result(tool_name: &str, execution: &ExecutionResult) -> ExecutedOutcome {
    if execution.awaiting_confirmation {
        return ExecutedOutcome::Awaiting(
            execution.confirmation_prompt.clone().unwrap_or_else(|| format!("{tool_name} işlemini onaylıyor musunuz?")),
        );
    }
    let elapsed_ms = execution.record.as_ref().map_or(0, |r| r.elapsed_ms);
    let result = if execution.ok {
        let mut tr = ToolResult::ok(tool_name, execution.data.clone().unwrap_or(Value::Null), elapsed_ms, execution.risk_level);
        tr.confirmed = execution.record.as_ref().is_some_and(|r| r.confirmed);
        tr
    } else {
        ToolResult::error(tool_name, execution.error.clone().unwrap_or_default(), elapsed_ms, execution.risk_level)
    };
    ExecutedOutcome::Done(result)
}

fn slots_for_tool(plan_output: &OrchestratorOutput, _tool_name: &str) -> BTreeMap<String, Value> {
    plan_output.slots.clone()
}

fn route_label(output: &OrchestratorOutput) -> String {
    format!("{:?}", output.route).to_lowercase()
}

async fn handle_pending_confirmation(
    deps: &mut TurnDeps<'_>,
    user_input: &str,
    state: &mut OrchestratorState,
    run: &mut brain_telemetry::RunGuard<'_>,
) -> RuntimeResult<OrchestratorOutput> {
    let reply = classify_turkish_response(user_input);
    match reply {
        ConfirmationReply::Affirmative => {
            let pending = state.pending_confirmations.remove(0);
            state.confirmed_tool = Some(pending.tool.clone());
            let tool_executor = deps.tool_executor;
            let tool_handlers = deps.tool_handlers;
            tool_executor.confirm_action(&Step::new(pending.tool.clone(), pending.slots.clone()));

            let sink = EventBusSink::new(deps.event_bus, EVENT_SOURCE);
            let step = Step::new(pending.tool.clone(), pending.slots.clone());
            let execution = tool_executor.execute_with_sink(
                &step,
                |name, params| tool_handlers.dispatch(name, params),
                false,
                true,
                &sink,
            );
            let tool_result = match to_tool_result(&pending.tool, &execution) {
                ExecutedOutcome::Done(result) => result,
                ExecutedOutcome::Awaiting(_) => {
                    ToolResult::error(&pending.tool, "onay sonrası tekrar onay istendi", 0, pending.risk_level)
                }
            };
            state.last_tool_results.push(tool_result);
            state.confirmed_tool = None;

            let base = OrchestratorOutput::fallback_unknown(String::new());
            let reply_text = if execution.ok {
                "İşleminiz gerçekleştirildi.".to_string()
            } else {
                format!("İşlem başarısız oldu: {}", execution.error.unwrap_or_default())
            };
            let output = base.with_reply(reply_text);
            run.set_route("confirmation");
            run.set_final_output(&output.assistant_reply);
            Ok(output)
        }
        ConfirmationReply::Negative => {
            state.pending_confirmations.clear();
            let mut output = OrchestratorOutput::fallback_unknown("Tamam, işlemi iptal ettim.".to_string());
            output.route = Route::Cancelled;
            run.set_route("cancelled");
            run.set_final_output(&output.assistant_reply);
            Ok(output)
        }
        ConfirmationReply::Unclear => {
            let prompt = state
                .pending_confirmations
                .first()
                .map(|p| p.prompt.clone())
                .unwrap_or_else(|| "Onaylıyor musunuz?".to_string());
            let mut output = OrchestratorOutput::fallback_unknown(prompt);
            output.requires_confirmation = true;
            output.confirmation_prompt = output.assistant_reply.clone();
            run.set_route("reprompt");
            run.set_final_output(&output.assistant_reply);
            Ok(output)
        }
    }
}

fn summarize_action(output: &OrchestratorOutput, state: &OrchestratorState) -> String {
    let tool_count = state.last_tool_results.len();
    let intent = if output.calendar_intent == CalendarIntent::None {
        format!("{:?}", output.route).to_lowercase()
    } else {
        format!("{:?}/{:?}", output.route, output.calendar_intent).to_lowercase()
    };
    if tool_count == 0 {
        intent
    } else {
        format!("{intent} ({tool_count} araç çağrısı)")
    }
}

fn persist_turn(
    deps: &mut TurnDeps<'_>,
    state: &mut OrchestratorState,
    user_input: &str,
    output: &OrchestratorOutput,
    action_taken: &str,
) -> RuntimeResult<()> {
    let turn_number = u32::try_from(deps.memory.len() + 1).unwrap_or(u32::MAX);
    let pending_items = if output.ask_user { vec![output.question.clone()] } else { Vec::new() };
    let summary = CompactSummary {
        turn_number,
        user_intent: user_input.to_string(),
        action_taken: action_taken.to_string(),
        pending_items,
        timestamp: Utc::now(),
    };
    deps.memory.add_turn(summary)?;
    Ok(())
}
