//! Masks common PII patterns before a turn summary is persisted (spec §4.3
//! `save_turn(..., pii_filter=true)`).

use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap());
/// 10+ digit runs (possibly grouped by spaces/dashes/dots), covering phone
/// numbers and Turkish 11-digit identity numbers alike.
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:\d[ .\-]?){10,}\d").unwrap());

/// Replace emails and long digit runs (phone numbers, identity numbers)
/// with fixed placeholder tokens.
#[must_use]
pub fn filter(text: &str) -> String {
    let masked = EMAIL.replace_all(text, "[EMAIL]");
    DIGIT_RUN.replace_all(&masked, "[NUMBER]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_email_addresses() {
        assert_eq!(filter("Bana ahmet@example.com adresine yaz"), "Bana [EMAIL] adresine yaz");
    }

    #[test]
    fn masks_phone_like_digit_runs() {
        assert_eq!(filter("Beni 0532 123 45 67 numaradan ara"), "Beni [NUMBER] numaradan ara");
    }

    #[test]
    fn leaves_short_numbers_alone() {
        assert_eq!(filter("Saat 14:30'da 5 kişi gelecek"), "Saat 14:30'da 5 kişi gelecek");
    }
}
