//! C1: Token budget estimation, Turkish text normalization, and the
//! complexity/writing/risk feature scores that feed the quality gate (spec
//! §2 C1, §4.8).

use std::collections::HashMap;
use std::sync::LazyLock;

/// Rough token estimate: ~4 characters per token, matching
/// `ContextConfig.estimate_tokens` in the original Python implementation and
/// the default `LlmProvider::count_tokens` approximation used by the teacher.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Turkish number words mapped to their digit equivalents, ground truth taken
/// from `turkish_time.py::TURKISH_NUMBERS`. Used by the grounding guard (C3)
/// to treat number words on the candidate side as pass-throughs of their
/// digit equivalents, and available generally as a normalization utility.
pub static TURKISH_NUMBER_WORDS: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    HashMap::from([
        ("bir", 1),
        ("iki", 2),
        ("üç", 3),
        ("dört", 4),
        ("beş", 5),
        ("altı", 6),
        ("yedi", 7),
        ("sekiz", 8),
        ("dokuz", 9),
        ("on", 10),
        ("onbir", 11),
        ("oniki", 12),
        ("yarım", 0),
        ("buçuk", 0),
    ])
});

/// Normalize Turkish text for matching purposes: casefold using Turkish-aware
/// rules (dotted/dotless I), collapse internal whitespace, and trim.
#[must_use]
pub fn normalize_turkish(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            'İ' => 'i',
            'I' => 'ı',
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ASCII-fold Turkish diacritics, used when matching user replies that may
/// have been typed without proper Turkish keyboard input (spec §9 open
/// question on the affirmative/negative lexicon).
#[must_use]
pub fn ascii_fold_turkish(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ç' | 'Ç' => 'c',
            'ğ' | 'Ğ' => 'g',
            'ı' => 'i',
            'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ş' | 'Ş' => 's',
            'ü' | 'Ü' => 'u',
            other => other,
        })
        .collect()
}

/// Keywords suggesting the input needs multi-step planning (spec §4.8
/// `complexity` factor).
const COMPLEXITY_KEYWORDS: &[&str] = &[
    "sonra", "önce", "ardından", "ayrıca", "hem", "hem de", "ilk", "adım",
    "sırasıyla", "daha sonra", "bir de", "sonrasında",
];

/// Keywords suggesting the reply needs formal/polished writing (spec §4.8
/// `writing` factor).
const WRITING_KEYWORDS: &[&str] = &[
    "resmi", "dilekçe", "mektup", "rapor", "özgeçmiş", "kompozisyon",
    "makale", "sayın", "saygılarımla", "dilekçe formatında", "resmi bir",
];

/// Keywords suggesting a destructive action, independent of the tool plan
/// (spec §4.8 `risk` factor).
const RISK_KEYWORDS: &[&str] = &[
    "sil", "iptal et", "kaldır", "vazgeç", "geri al", "temizle", "boşalt",
];

/// Score 0-5: how much multi-step planning this input implies.
#[must_use]
pub fn score_complexity(text: &str) -> u8 {
    let normalized = normalize_turkish(text);
    let hits = COMPLEXITY_KEYWORDS
        .iter()
        .filter(|kw| normalized.contains(*kw))
        .count();
    let length_bonus = usize::from(normalized.split_whitespace().count() > 25);
    clamp_score(hits + length_bonus)
}

/// Score 0-5: how much the reply needs careful, formal writing.
#[must_use]
pub fn score_writing_need(text: &str) -> u8 {
    let normalized = normalize_turkish(text);
    let hits = WRITING_KEYWORDS
        .iter()
        .filter(|kw| normalized.contains(*kw))
        .count();
    clamp_score(hits * 2)
}

/// Score 0-5: how destructive this turn looks, combining keyword hits,
/// planned destructive tools, and whether confirmation was already requested.
#[must_use]
pub fn score_risk(text: &str, tool_names: &[String], requires_confirmation: bool) -> u8 {
    let normalized = normalize_turkish(text);
    let keyword_hits = RISK_KEYWORDS
        .iter()
        .filter(|kw| normalized.contains(*kw))
        .count();
    let destructive_tool_hits = tool_names
        .iter()
        .filter(|name| name.contains("delete") || name.contains("cancel") || name.contains("remove"))
        .count();
    let confirmation_bonus = usize::from(requires_confirmation);
    clamp_score(keyword_hits + destructive_tool_hits * 2 + confirmation_bonus)
}

fn clamp_score(raw: usize) -> u8 {
    raw.min(5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimates_roughly_four_chars_per_token() {
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn normalizes_turkish_dotted_i() {
        assert_eq!(normalize_turkish("İstanbul  Toplantı"), "istanbul toplantı");
    }

    #[test]
    fn scores_writing_need_for_formal_request() {
        let score = score_writing_need("Hocaya resmi bir e-posta yaz, dilekçe formatında");
        assert!(score >= 4, "expected high writing score, got {score}");
    }

    #[test]
    fn scores_risk_for_destructive_tool() {
        let score = score_risk("toplantıyı sil", &["calendar.delete_event".to_string()], false);
        assert!(score >= 3);
    }

    #[test]
    fn turkish_number_words_cover_basic_range() {
        assert_eq!(TURKISH_NUMBER_WORDS.get("bir"), Some(&1));
        assert_eq!(TURKISH_NUMBER_WORDS.get("on"), Some(&10));
    }
}
