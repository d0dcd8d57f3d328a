//! Balanced-braces JSON object scanner (spec §4.1 `extract_first_json_object`).
//!
//! LLMs wrap their structured output in all sorts of noise: markdown code
//! fences, apologetic prose before or after, even a second JSON object later
//! in the same response. Rather than regex-stripping fences (handled
//! separately by [`crate::repair::extract_json_from_text`] for the
//! lower-effort extraction path), this scans for the first `{`, tracks brace
//! depth while respecting string literals and escapes, and returns the first
//! balanced object it finds.

use serde_json::Value;

use crate::error::{CodecError, CodecResult};

/// Extract and parse the first balanced top-level JSON object in `raw`.
///
/// # Errors
/// Returns [`CodecError::EmptyOutput`] for blank input, [`CodecError::NoJsonObject`]
/// if no `{` appears at all, [`CodecError::UnbalancedJson`] if braces never
/// close before the input ends, and [`CodecError::JsonDecodeError`] if the
/// balanced candidate slice itself fails to parse.
pub fn extract_first_json_object(raw: &str) -> CodecResult<Value> {
    if raw.trim().is_empty() {
        return Err(CodecError::EmptyOutput);
    }

    let bytes = raw.as_bytes();
    let Some(start) = bytes.iter().position(|&b| b == b'{') else {
        return Err(CodecError::NoJsonObject);
    };

    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    let Some(end) = end else {
        return Err(CodecError::UnbalancedJson);
    };

    let candidate = &raw[start..end];
    serde_json::from_str(candidate).map_err(CodecError::JsonDecodeError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_is_rejected() {
        assert!(matches!(extract_first_json_object(""), Err(CodecError::EmptyOutput)));
    }

    #[test]
    fn prose_only_has_no_json_object() {
        assert!(matches!(
            extract_first_json_object("Üzgünüm, şu an yardımcı olamıyorum."),
            Err(CodecError::NoJsonObject)
        ));
    }

    #[test]
    fn truncated_mid_value_is_unbalanced() {
        let raw = r#"{"route": "calendar", "assistant_reply": "Tama"#;
        assert!(matches!(extract_first_json_object(raw), Err(CodecError::UnbalancedJson)));
    }

    #[test]
    fn trailing_comma_is_balanced_but_fails_decode() {
        let raw = r#"{"route": "calendar",}"#;
        assert!(matches!(extract_first_json_object(raw), Err(CodecError::JsonDecodeError(_))));
    }

    #[test]
    fn markdown_fenced_extracts_cleanly() {
        let raw = "```json\n{\"route\": \"calendar\", \"confidence\": 0.9}\n```";
        let obj = extract_first_json_object(raw).unwrap();
        assert_eq!(obj["route"], "calendar");
        assert_eq!(obj["confidence"], 0.9);
    }

    #[test]
    fn trailing_turkish_text_is_ignored() {
        let raw = r#"{"route": "calendar"} Umarım yardımcı olabilmişimdir!"#;
        let obj = extract_first_json_object(raw).unwrap();
        assert_eq!(obj["route"], "calendar");
    }

    #[test]
    fn double_json_takes_the_first() {
        let raw = r#"{"route": "calendar"} {"route": "gmail"}"#;
        let obj = extract_first_json_object(raw).unwrap();
        assert_eq!(obj["route"], "calendar");
    }

    #[test]
    fn nested_braces_inside_strings_do_not_confuse_depth() {
        let raw = r#"{"route": "calendar", "assistant_reply": "deneme { } metni"}"#;
        let obj = extract_first_json_object(raw).unwrap();
        assert_eq!(obj["assistant_reply"], "deneme { } metni");
    }

    #[test]
    fn turkish_unicode_round_trips() {
        let raw = r#"{"slots": {"title": "Şükrü ile toplantı"}, "assistant_reply": "İlçe belediyesiyle görüşme ayarlandı."}"#;
        let obj = extract_first_json_object(raw).unwrap();
        assert_eq!(obj["slots"]["title"], "Şükrü ile toplantı");
        assert!(obj["assistant_reply"].as_str().unwrap().starts_with("İlçe"));
    }
}
