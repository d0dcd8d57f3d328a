//! Router orchestrator (C11, spec §4.10): a single stage-1 LLM call that
//! produces a validated [`OrchestratorOutput`]. Grounded on
//! `hybrid_orchestrator.py`'s `HybridOrchestrator.plan`, which simply
//! delegates to `JarvisLLMOrchestrator.route` — the system/user prompt
//! shape here follows that router call's fixed Turkish identity preamble
//! plus the JSON-schema instruction, since the router module itself isn't in
//! the retrieval pack.

use brain_core::types::OrchestratorOutput;
use brain_llm::{LlmProvider, Message};

use crate::error::OrchestratorResult;

const ROUTER_TEMPERATURE: f64 = 0.0;
const ROUTER_MAX_TOKENS: u32 = 512;

const ROUTER_SYSTEM_PROMPT: &str = r#"Sen BANTZ'sın — Jarvis tarzı Türkçe asistanın yönlendirme (routing) katmanısın.

Görevin: kullanıcının isteğini analiz edip SADECE aşağıdaki JSON şemasına uygun bir nesne üretmek. Metin, açıklama ya da markdown kod bloğu EKLEME — yalnızca ham JSON döndür.

Şema alanları:
- route: "calendar" | "gmail" | "smalltalk" | "system" | "unknown"
- calendar_intent: "create" | "modify" | "cancel" | "query" | "none"
- slots: object (route'a özgü çıkarılan alanlar)
- confidence: 0 ile 1 arasında sayı
- tool_plan: sırayla çağrılacak araç adlarının listesi (boş olabilir)
- assistant_reply: kullanıcıya gösterilecek kısa yanıt
- ask_user: boolean
- question: ask_user true ise dolu, değilse boş string
- requires_confirmation: boolean
- confirmation_prompt: requires_confirmation true ise dolu, değilse boş string
- memory_update: object (boş olabilir)
- reasoning_summary: kısa gerekçe adımlarının listesi"#;

fn localized_apology() -> String {
    "Üzgünüm efendim, isteğinizi şu an işleyemedim.".to_string()
}

fn build_user_prompt(user_input: &str, dialog_summary: &str) -> String {
    if dialog_summary.trim().is_empty() {
        format!("Kullanıcı: {user_input}")
    } else {
        format!("{dialog_summary}\n\nKullanıcı: {user_input}")
    }
}

/// Stage-1 routing call: prompts `router`, then pipes its text through the
/// structured-output codec. Never invokes tools.
///
/// # Errors
/// Returns [`crate::error::OrchestratorError::Router`] only when the LLM
/// call itself fails (transport, timeout, non-2xx) — a codec parse/repair
/// failure is not an error here, it yields a `route=unknown` fallback
/// output instead (spec §4.10).
pub async fn route(
    router: &dyn LlmProvider,
    user_input: &str,
    dialog_summary: &str,
) -> OrchestratorResult<OrchestratorOutput> {
    let messages =
        [Message::system(ROUTER_SYSTEM_PROMPT), Message::user(build_user_prompt(user_input, dialog_summary))];

    let response = router.chat_detailed(&messages, ROUTER_TEMPERATURE, ROUTER_MAX_TOKENS).await?;

    match brain_codec::validate_and_repair(&response.content) {
        Ok(output) => Ok(output),
        Err(err) => {
            tracing::warn!(error = %err, reason = err.reason(), "router output failed structured validation");
            Ok(OrchestratorOutput::fallback_unknown(localized_apology()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_llm::FakeProvider;

    #[tokio::test]
    async fn valid_json_response_routes_successfully() {
        let provider = FakeProvider::new(
            "fake-router",
            "fake-model",
            serde_json::json!({
                "route": "calendar",
                "calendar_intent": "query",
                "confidence": 0.8,
                "tool_plan": ["calendar.list_events"],
                "assistant_reply": "Bakıyorum.",
                "slots": {},
            })
            .to_string(),
        );

        let output = route(&provider, "bugün toplantılarım neler?", "").await.unwrap();
        assert_eq!(output.route, brain_core::types::Route::Calendar);
        assert_eq!(output.tool_plan, vec!["calendar.list_events".to_string()]);
    }

    #[tokio::test]
    async fn malformed_response_falls_back_to_unknown() {
        let provider = FakeProvider::new("fake-router", "fake-model", "not json at all, sorry");
        let output = route(&provider, "???", "").await.unwrap();
        assert_eq!(output.route, brain_core::types::Route::Unknown);
        assert!((output.confidence - 0.0).abs() < f64::EPSILON);
        assert!(!output.assistant_reply.is_empty());
    }

    #[tokio::test]
    async fn dialog_summary_is_prepended_to_user_prompt() {
        let provider = FakeProvider::new(
            "fake-router",
            "fake-model",
            serde_json::json!({
                "route": "smalltalk",
                "confidence": 0.5,
                "assistant_reply": "Selam!",
            })
            .to_string(),
        );
        let output = route(&provider, "merhaba", "DIALOG_SUMMARY: önceki konuşma yok").await.unwrap();
        assert_eq!(output.route, brain_core::types::Route::Smalltalk);
    }
}
