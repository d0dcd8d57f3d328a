//! Confirmation firewall (spec §4.5): gates destructive tools on explicit
//! user confirmation independent of what the LLM itself claims, and
//! classifies the user's free-text reply to a pending confirmation prompt.

use std::collections::BTreeMap;

use brain_core::types::RiskLevel;
use brain_core::text::{ascii_fold_turkish, normalize_turkish};
use serde_json::Value;

/// Whether `risk` forces confirmation regardless of what the LLM requested
/// (spec §4.5 `requires_confirmation`).
#[must_use]
pub fn requires_confirmation(risk: RiskLevel, llm_requested_confirmation: bool) -> bool {
    match risk {
        RiskLevel::Destructive => true,
        RiskLevel::Moderate | RiskLevel::Safe => llm_requested_confirmation,
    }
}

/// Build a localized confirmation prompt for `name`, interpolating whatever
/// of `params` is relevant to that tool (event title, file path, ...).
/// Falls back to a generic template for unrecognized tool names.
#[must_use]
pub fn get_confirmation_prompt(name: &str, params: &BTreeMap<String, Value>) -> String {
    let text = |key: &str| params.get(key).and_then(Value::as_str).unwrap_or("");
    match name {
        "calendar_create" => format!("\"{}\" etkinliğini oluşturayım mı?", text("title")),
        "calendar_modify" => format!("\"{}\" etkinliğini güncelleyeyim mi?", text("title")),
        "calendar_cancel" => format!("\"{}\" etkinliğini iptal edeyim mi?", text("title")),
        "gmail_send" => format!("\"{}\" konulu e-postayı gönderiyim mi?", text("subject")),
        "gmail_delete" => format!("\"{}\" konulu e-postayı silmeyi onaylıyor musunuz?", text("subject")),
        _ => format!("{name} işlemini gerçekleştirmeyi onaylıyor musunuz?"),
    }
}

/// The user's free-text reply to a pending confirmation, classified against
/// a fixed Turkish lexicon (DESIGN.md Open Question #1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReply {
    /// Recognized as an affirmative reply.
    Affirmative,
    /// Recognized as a negative reply.
    Negative,
    /// Neither recognized — the pending action stays pending.
    Unclear,
}

const AFFIRMATIVE_WORDS: &[&str] = &["evet", "tamam", "ok", "olur", "ekle", "e", "kabul", "yap"];
const NEGATIVE_WORDS: &[&str] = &["hayir", "iptal", "vazgec", "yok", "reddet", "istemiyorum"];

/// Classify a free-text reply to a confirmation prompt (spec §4.5 firewall
/// interaction). Matches against both the diacritic-preserving normalized
/// form and the ASCII-folded form, so `hayır`/`hayir` both resolve.
#[must_use]
pub fn classify_turkish_response(text: &str) -> ConfirmationReply {
    let normalized = normalize_turkish(text);
    let folded = ascii_fold_turkish(&normalized);
    let word = folded.trim();

    if AFFIRMATIVE_WORDS.contains(&word) {
        ConfirmationReply::Affirmative
    } else if NEGATIVE_WORDS.contains(&word) {
        ConfirmationReply::Negative
    } else {
        ConfirmationReply::Unclear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destructive_always_requires_confirmation() {
        assert!(requires_confirmation(RiskLevel::Destructive, false));
        assert!(requires_confirmation(RiskLevel::Destructive, true));
    }

    #[test]
    fn moderate_follows_llm_flag() {
        assert!(requires_confirmation(RiskLevel::Moderate, true));
        assert!(!requires_confirmation(RiskLevel::Moderate, false));
    }

    #[test]
    fn safe_follows_llm_flag() {
        assert!(!requires_confirmation(RiskLevel::Safe, false));
        assert!(requires_confirmation(RiskLevel::Safe, true));
    }

    #[test]
    fn prompt_interpolates_event_title() {
        let mut params = BTreeMap::new();
        params.insert("title".to_string(), Value::String("Diş randevusu".to_string()));
        let prompt = get_confirmation_prompt("calendar_create", &params);
        assert!(prompt.contains("Diş randevusu"));
    }

    #[test]
    fn unknown_tool_falls_back_to_generic_template() {
        let params = BTreeMap::new();
        let prompt = get_confirmation_prompt("some_custom_tool", &params);
        assert!(prompt.contains("some_custom_tool"));
    }

    #[test]
    fn classifies_affirmative_with_and_without_diacritics() {
        assert_eq!(classify_turkish_response("Evet"), ConfirmationReply::Affirmative);
        assert_eq!(classify_turkish_response("tamam"), ConfirmationReply::Affirmative);
        assert_eq!(classify_turkish_response("  Olur  "), ConfirmationReply::Affirmative);
    }

    #[test]
    fn classifies_negative_with_and_without_diacritics() {
        assert_eq!(classify_turkish_response("Hayır"), ConfirmationReply::Negative);
        assert_eq!(classify_turkish_response("hayir"), ConfirmationReply::Negative);
        assert_eq!(classify_turkish_response("vazgeç"), ConfirmationReply::Negative);
    }

    #[test]
    fn unrelated_input_is_unclear() {
        assert_eq!(classify_turkish_response("yarın toplantım var"), ConfirmationReply::Unclear);
    }
}
