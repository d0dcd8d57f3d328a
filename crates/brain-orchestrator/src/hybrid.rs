//! Hybrid orchestrator (C12, spec §4.11): two-phase `plan`/`finalize` API
//! combining the router (C11) with a quality finalizer, gated by C9 and
//! checked by C3's no-new-facts guard. Grounded on
//! `hybrid_orchestrator.py`'s `HybridOrchestrator` — the availability cache,
//! fallback-on-error, and retry-once-on-guard-violation behavior all mirror
//! `_check_finalizer`/`_do_finalize`/`_call_finalizer` there, generalized
//! from a single Gemini/vLLM choice to any `LlmProvider`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use brain_config::FinalizerConfig;
use brain_core::types::{OrchestratorOutput, ToolResult};
use brain_gating::{GatingDecision, GatingPolicy};
use brain_llm::{LlmProvider, Message};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::router;
use crate::summarize_tools::summarize_tool_results;

const FINALIZER_MAX_TOKENS: u32 = 512;
const TOOL_RESULTS_MAX_CHARS: usize = 2000;
const AVAILABILITY_PROBE_TIMEOUT_SECONDS: u64 = 2;
const AVAILABILITY_CACHE_TTL: Duration = Duration::from_secs(30);

const NO_NEW_FACTS_SYSTEM: &str = "Sadece verilen TOOL RESULTS bilgisine dayanarak cevap ver. \
Eğer tool sonuçlarında olmayan yeni bilgiler üretirsen cevabın reddedilecek. \
Bilinmeyen detayları uydurmak yerine 'bilmiyorum' de.";

struct AvailabilityCache {
    value: Mutex<Option<(Instant, bool)>>,
}

impl AvailabilityCache {
    fn new() -> Self {
        Self { value: Mutex::new(None) }
    }

    async fn get(&self, finalizer: &dyn LlmProvider) -> bool {
        {
            let cached = self.value.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some((checked_at, available)) = *cached {
                if checked_at.elapsed() < AVAILABILITY_CACHE_TTL {
                    return available;
                }
            }
        }
        let available = finalizer.is_available(AVAILABILITY_PROBE_TIMEOUT_SECONDS).await;
        *self.value.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some((Instant::now(), available));
        available
    }
}

/// Combines the router and an optional finalizer behind the two-phase
/// `plan`/`finalize` API (spec §4.11).
pub struct HybridOrchestrator {
    router: Box<dyn LlmProvider>,
    finalizer: Option<Box<dyn LlmProvider>>,
    gating: std::sync::Arc<GatingPolicy>,
    config: FinalizerConfig,
    availability: AvailabilityCache,
}

impl HybridOrchestrator {
    /// Build an orchestrator. `finalizer` is `None` when no quality tier is
    /// configured at all (spec §4.11 "unavailable" is then trivially true).
    #[must_use]
    pub fn new(
        router: Box<dyn LlmProvider>,
        finalizer: Option<Box<dyn LlmProvider>>,
        gating: std::sync::Arc<GatingPolicy>,
        config: FinalizerConfig,
    ) -> Self {
        Self { router, finalizer, gating, config, availability: AvailabilityCache::new() }
    }

    /// Phase 1: delegate to the router (spec §4.11 `plan`).
    pub async fn plan(&self, user_input: &str, dialog_summary: &str) -> OrchestratorResult<OrchestratorOutput> {
        router::route(self.router.as_ref(), user_input, dialog_summary).await
    }

    /// Whether a finalizer is configured and its last availability probe
    /// (cached up to [`AVAILABILITY_CACHE_TTL`]) succeeded.
    pub async fn finalizer_available(&self) -> bool {
        match &self.finalizer {
            Some(finalizer) => self.availability.get(finalizer.as_ref()).await,
            None => false,
        }
    }

    /// Phase 3: produce the natural-language reply (spec §4.11 `finalize`).
    pub async fn finalize(
        &self,
        plan_output: &OrchestratorOutput,
        user_input: &str,
        dialog_summary: &str,
        tool_results: &[ToolResult],
    ) -> OrchestratorOutput {
        let Some(finalizer) = &self.finalizer else {
            return self.router_fallback(plan_output, "no_finalizer_configured");
        };

        if !self.finalizer_available().await {
            tracing::warn!("finalizer unavailable, falling back to router reply");
            return self.router_fallback(plan_output, "3b_fallback");
        }

        let decision = self
            .gating
            .evaluate(user_input, &plan_output.tool_plan, plan_output.requires_confirmation, true)
            .decision;
        if decision != GatingDecision::UseQuality {
            return self.router_fallback(plan_output, "3b_fallback");
        }

        match self.call_finalizer(finalizer.as_ref(), plan_output, user_input, dialog_summary, tool_results).await {
            Ok(text) => plan_output.with_reply(text),
            Err(err) => {
                tracing::error!(error = %err, "finalizer call failed");
                if self.config.fallback_to_router {
                    self.router_fallback(plan_output, "3b_fallback")
                } else {
                    plan_output.with_reply(plan_output.assistant_reply.clone())
                }
            }
        }
    }

    /// Plan + finalize in one call (spec §4.11 convenience API).
    pub async fn orchestrate(
        &self,
        user_input: &str,
        dialog_summary: &str,
        tool_results: &[ToolResult],
    ) -> OrchestratorResult<OrchestratorOutput> {
        let plan_output = self.plan(user_input, dialog_summary).await?;
        Ok(self.finalize(&plan_output, user_input, dialog_summary, tool_results).await)
    }

    fn router_fallback(&self, plan_output: &OrchestratorOutput, finalizer_type: &str) -> OrchestratorOutput {
        let mut out = plan_output.with_reply(plan_output.assistant_reply.clone());
        out.raw_output.insert("finalizer_type".to_string(), serde_json::json!(finalizer_type));
        out
    }

    async fn call_finalizer(
        &self,
        finalizer: &dyn LlmProvider,
        plan_output: &OrchestratorOutput,
        user_input: &str,
        dialog_summary: &str,
        tool_results: &[ToolResult],
    ) -> OrchestratorResult<String> {
        let (tool_summary, _) = summarize_tool_results(tool_results, TOOL_RESULTS_MAX_CHARS);
        let has_tool_results = !tool_results.is_empty();
        let apply_guard = self.config.no_new_facts_guard && has_tool_results;

        let system_prompt = build_system_prompt(has_tool_results, apply_guard);
        let user_prompt = build_user_prompt(plan_output, user_input, dialog_summary, &tool_summary);

        let messages = [Message::system(system_prompt), Message::user(user_prompt.clone())];
        let response = finalizer
            .chat_detailed(&messages, self.config.temperature, FINALIZER_MAX_TOKENS)
            .await
            .map_err(OrchestratorError::Finalizer)?;
        let mut text = response.content.trim().to_string();

        if apply_guard && !tool_summary.is_empty() && !text.is_empty() {
            let tool_result_json: Vec<serde_json::Value> =
                tool_results.iter().filter_map(|tr| tr.result.clone()).collect();
            let guard_result = brain_guard::validate(user_input, None, Some(dialog_summary), &tool_result_json, &text);
            if !guard_result.passed {
                tracing::warn!(violations = guard_result.violations.len(), "no-new-facts guard triggered, retrying with strict prompt");
                let strict_messages = [Message::system(NO_NEW_FACTS_SYSTEM), Message::user(user_prompt)];
                let retry_temperature = (self.config.temperature - 0.2).max(0.1);
                let retry = finalizer
                    .chat_detailed(&strict_messages, retry_temperature, FINALIZER_MAX_TOKENS)
                    .await
                    .map_err(OrchestratorError::Finalizer)?;
                text = retry.content.trim().to_string();
            }
        }

        Ok(text)
    }
}

fn build_system_prompt(has_tool_results: bool, no_new_facts: bool) -> String {
    let mut prompt = String::from(
        "Sen BANTZ'sın — Jarvis tarzı Türkçe asistan.\n\n\
         Kurallar:\n\
         - \"Efendim\" hitabı kullan\n\
         - Nazik, profesyonel ama samimi\n\
         - Kısa ve öz cevaplar (1-2 cümle ideal)\n\
         - Türkçe doğal konuş\n",
    );
    if has_tool_results {
        prompt.push_str("\nTakvim/araç sonuçlarını kullanıcıya kısa ve öz aktar.\n");
    }
    if no_new_facts {
        prompt.push_str(
            "\nÖNEMLİ: Sadece TOOL RESULTS bilgisine dayanarak cevap ver. Yeni bilgi UYDURMAK YASAK.\n",
        );
    }
    prompt
}

fn build_user_prompt(plan_output: &OrchestratorOutput, user_input: &str, dialog_summary: &str, tool_summary: &str) -> String {
    let mut parts = Vec::new();
    if !dialog_summary.trim().is_empty() {
        parts.push(format!("Dialog Context:\n{dialog_summary}"));
    }
    parts.push(format!("User: {user_input}"));
    if plan_output.route == brain_core::types::Route::Calendar {
        parts.push(format!("Intent: {:?}", plan_output.calendar_intent).to_lowercase());
        if !plan_output.slots.is_empty() {
            parts.push(format!("Slots: {}", serde_json::to_string(&plan_output.slots).unwrap_or_default()));
        }
    }
    if !tool_summary.is_empty() {
        parts.push(format!("Tool Results:\n{tool_summary}"));
    }
    parts.push("Yanıtını Türkçe ver:".to_string());
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_config::{CloudMode, FinalizerType};
    use brain_core::types::{CalendarIntent, Route};
    use brain_gating::GatingPolicy;
    use brain_llm::FakeProvider;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn finalizer_config() -> FinalizerConfig {
        FinalizerConfig {
            finalizer_type: FinalizerType::Quality,
            model: None,
            enabled: true,
            cloud_mode: CloudMode::Cloud,
            temperature: 0.4,
            router_temperature: 0.0,
            fallback_to_router: true,
            no_new_facts_guard: true,
        }
    }

    fn always_quality_gating() -> Arc<GatingPolicy> {
        let config = brain_config::GatingConfig {
            quality_threshold: 2.5,
            fast_max_threshold: 1.5,
            min_complexity_for_quality: 4,
            min_writing_for_quality: 4,
            quality_rate_limit: 100,
            rate_window_seconds: 60.0,
            finalizer_mode: brain_config::FinalizerMode::Always,
            bypass_patterns: Vec::new(),
            force_quality_patterns: Vec::new(),
        };
        Arc::new(GatingPolicy::new(config))
    }

    fn sample_plan() -> OrchestratorOutput {
        OrchestratorOutput {
            route: Route::Calendar,
            calendar_intent: CalendarIntent::Query,
            slots: BTreeMap::new(),
            confidence: 0.9,
            tool_plan: vec!["calendar.list_events".to_string()],
            assistant_reply: "router reply".to_string(),
            ask_user: false,
            question: String::new(),
            requires_confirmation: false,
            confirmation_prompt: String::new(),
            memory_update: BTreeMap::new(),
            reasoning_summary: Vec::new(),
            raw_output: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn finalize_falls_back_when_no_finalizer_configured() {
        let router = Box::new(FakeProvider::new("router", "router-model", "{}"));
        let orchestrator = HybridOrchestrator::new(router, None, always_quality_gating(), finalizer_config());
        let output = orchestrator.finalize(&sample_plan(), "input", "", &[]).await;
        assert_eq!(output.assistant_reply, "router reply");
    }

    #[tokio::test]
    async fn finalize_falls_back_when_finalizer_unavailable() {
        let router = Box::new(FakeProvider::new("router", "router-model", "{}"));
        let finalizer = Box::new(FakeProvider::new("finalizer", "finalizer-model", "ignored").unavailable());
        let orchestrator =
            HybridOrchestrator::new(router, Some(finalizer), always_quality_gating(), finalizer_config());
        let output = orchestrator.finalize(&sample_plan(), "input", "", &[]).await;
        assert_eq!(output.assistant_reply, "router reply");
    }

    #[tokio::test]
    async fn finalize_uses_finalizer_reply_when_available_and_quality_gated() {
        let router = Box::new(FakeProvider::new("router", "router-model", "{}"));
        let finalizer = Box::new(FakeProvider::new("finalizer", "finalizer-model", "Tamamdır efendim."));
        let orchestrator =
            HybridOrchestrator::new(router, Some(finalizer), always_quality_gating(), finalizer_config());
        let output = orchestrator.finalize(&sample_plan(), "input", "", &[]).await;
        assert_eq!(output.assistant_reply, "Tamamdır efendim.");
    }

    #[tokio::test]
    async fn plan_delegates_to_router() {
        let router = Box::new(FakeProvider::new(
            "router",
            "router-model",
            serde_json::json!({"route": "smalltalk", "confidence": 0.4, "assistant_reply": "Selam"}).to_string(),
        ));
        let orchestrator = HybridOrchestrator::new(router, None, always_quality_gating(), finalizer_config());
        let output = orchestrator.plan("merhaba", "").await.unwrap();
        assert_eq!(output.route, Route::Smalltalk);
    }
}
