//! LLM-based last-resort repair: when structural repair still can't produce
//! a validatable object (e.g. the candidate never parsed as JSON at all),
//! ask a small/cheap model to rewrite the broken output as JSON (ground
//! truth: `brain/json_repair.py::repair_to_json_object`).

use async_trait::async_trait;
use serde_json::Value;

use crate::extract::extract_first_json_object;

/// Minimal seam for whatever LLM provider performs the repair completion.
/// Deliberately narrower than `brain_llm::LlmProvider` — repair only ever
/// needs a single blocking text completion, never streaming or tool calls.
#[async_trait]
pub trait RepairLlm: Send + Sync {
    /// Complete `prompt` and return the raw text response.
    async fn complete_text(&self, prompt: &str) -> Result<String, String>;
}

/// Outcome of an LLM-based repair attempt.
#[derive(Debug, Clone)]
pub struct RepairResult {
    /// Whether a validatable JSON object was ultimately produced.
    pub ok: bool,
    /// The parsed object, if `ok`.
    pub value: Option<Value>,
    /// How many completions were issued before success or giving up.
    pub attempts: u32,
}

/// Build the prompt handed to the repair LLM, including the original broken
/// text and a short description of why it failed.
#[must_use]
pub fn build_repair_prompt(raw_text: &str, error_summary: &str, validation_error: Option<&str>) -> String {
    let mut prompt = format!(
        "Aşağıdaki metin geçerli bir JSON nesnesi olmalıydı ama değil.\n\
         Hata: {error_summary}\n\
         Ham metin:\n{raw_text}\n\n\
         Lütfen yalnızca geçerli, düz bir JSON nesnesi döndür, başka açıklama ekleme."
    );
    if let Some(validation_error) = validation_error {
        prompt.push_str(&format!("\nDoğrulama hatası: {validation_error}"));
    }
    prompt
}

/// Retry the repair LLM up to `max_attempts` times, accepting the first
/// response that extracts as a JSON object.
pub async fn repair_to_json_object(llm: &dyn RepairLlm, raw_text: &str, max_attempts: u32) -> RepairResult {
    let mut last_error = "unbalanced_json".to_string();
    for attempt in 1..=max_attempts {
        let prompt = build_repair_prompt(raw_text, &last_error, None);
        let response = match llm.complete_text(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                last_error = err;
                continue;
            }
        };
        match extract_first_json_object(&response) {
            Ok(value) => {
                return RepairResult { ok: true, value: Some(value), attempts: attempt };
            }
            Err(err) => last_error = err.reason().to_string(),
        }
    }
    RepairResult { ok: false, value: None, attempts: max_attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakeRepairLlm {
        responses: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RepairLlm for FakeRepairLlm {
        async fn complete_text(&self, _prompt: &str) -> Result<String, String> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Ok(r#"{"type": "FAIL", "message": "mock exhausted"}"#.to_string());
            }
            Ok(responses.remove(0))
        }
    }

    #[tokio::test]
    async fn succeeds_after_one_attempt() {
        let llm = FakeRepairLlm {
            responses: Mutex::new(vec![r#"{"type": "SAY", "message": "Merhaba efendim!"}"#.to_string()]),
        };
        let result = repair_to_json_object(&llm, "bu geçersiz çıktı", 2).await;
        assert!(result.ok);
        assert_eq!(result.attempts, 1);
        assert_eq!(result.value.unwrap()["type"], "SAY");
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let llm = FakeRepairLlm { responses: Mutex::new(vec!["hala bozuk".to_string(), "hala bozuk".to_string()]) };
        let result = repair_to_json_object(&llm, "geçersiz çıktı", 2).await;
        assert!(!result.ok);
        assert_eq!(result.attempts, 2);
    }

    #[test]
    fn prompt_includes_raw_text_and_error() {
        let prompt = build_repair_prompt(r#"{"route": "calendar""#, "unbalanced_json", None);
        assert!(prompt.contains("calendar"));
        assert!(prompt.to_lowercase().contains("unbalanced") || prompt.to_lowercase().contains("hata"));
    }
}
