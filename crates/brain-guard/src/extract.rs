//! Numeric/temporal/currency/percentage token extractors shared by the
//! grounding guard's source and candidate scans (spec §4.2).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use brain_core::text::normalize_turkish;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").unwrap());
static ISO_OR_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b|\b\d{1,2}[/.]\d{1,2}[/.]\d{2,4}\b").unwrap());
static COLON_TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)(?::[0-5]\d)?\b").unwrap());
static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").unwrap());
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap());
static SLASH_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b").unwrap());
static DOT_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{2,4})\b").unwrap());
static DOT_TIME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([01]?\d|2[0-3])\.([0-5]\d)\b").unwrap());
static AMPM_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*(am|pm)\b").unwrap());
static DOLLAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\s*(\d+(?:[.,]\d+)?)").unwrap());
static EURO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"€\s*(\d+(?:[.,]\d+)?)").unwrap());
static LIRA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:tl|₺|lira)\b").unwrap());
static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*%").unwrap());
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:[.,]\d+)?)\s*(dakika|saat|gün|hafta|ay|yıl)\b").unwrap()
});

/// Normalize a raw numeric token: comma decimal -> dot, strip leading zeros
/// on the integer part.
#[must_use]
pub fn normalize_number(raw: &str) -> String {
    let replaced = raw.replace(',', ".");
    if let Some(dot_pos) = replaced.find('.') {
        let (int_part, frac_part) = replaced.split_at(dot_pos);
        let trimmed = int_part.trim_start_matches('0');
        let int_final = if trimmed.is_empty() { "0" } else { trimmed };
        format!("{int_final}{frac_part}")
    } else {
        let trimmed = replaced.trim_start_matches('0');
        if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
    }
}

/// Normalize a raw `HH:MM` / `HH.MM` token to zero-padded `HH:MM`.
#[must_use]
pub fn normalize_time(raw: &str) -> String {
    let sep = if raw.contains(':') { ':' } else { '.' };
    let mut parts = raw.splitn(2, sep);
    let hh = parts.next().unwrap_or("0");
    let mm = parts.next().unwrap_or("00");
    format!("{hh:0>2}:{mm:0>2}")
}

/// Extract plain numeric tokens, excluding date- and time-embedded digits
/// and ordered-list markers (spec §4.2).
#[must_use]
pub fn extract_numbers(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }
    let mut working = LIST_MARKER.replace_all(text, " ").to_string();
    working = ISO_OR_SLASH_DATE.replace_all(&working, " ").to_string();
    working = COLON_TIME.replace_all(&working, " ").to_string();
    BARE_NUMBER
        .find_iter(&working)
        .map(|m| normalize_number(m.as_str()))
        .collect()
}

/// Extract `HH:MM`-normalized time tokens (colon, dot, and simple am/pm forms).
#[must_use]
pub fn extract_times(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }
    let mut out = HashSet::new();
    for caps in COLON_TIME.captures_iter(text) {
        out.insert(format!("{:0>2}:{}", &caps[1], &caps[2]));
    }
    for caps in DOT_TIME.captures_iter(text) {
        out.insert(format!("{:0>2}:{}", &caps[1], &caps[2]));
    }
    for caps in AMPM_TIME.captures_iter(text) {
        let hour: u32 = caps[1].parse().unwrap_or(0);
        let is_pm = caps[2].eq_ignore_ascii_case("pm");
        let hour24 = match (hour % 12, is_pm) {
            (0, true) => 12,
            (h, true) => h + 12,
            (0, false) => 0,
            (h, false) => h,
        };
        out.insert(format!("{hour24:0>2}:00"));
    }
    out
}

/// Extract date tokens, ISO preserved as-is, slash/dot re-emitted in slash
/// form for comparison (spec §4.2 normalization rules).
#[must_use]
pub fn extract_dates(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }
    let mut out = HashSet::new();
    for m in ISO_DATE.find_iter(text) {
        out.insert(m.as_str().to_string());
    }
    for m in SLASH_DATE.find_iter(text) {
        out.insert(m.as_str().to_string());
    }
    for caps in DOT_DATE.captures_iter(text) {
        out.insert(format!("{}/{}/{}", &caps[1], &caps[2], &caps[3]));
    }
    out
}

/// Extract bare currency amounts (TL/lira/$/€ markers stripped).
#[must_use]
pub fn extract_currencies(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }
    let mut out = HashSet::new();
    for caps in DOLLAR.captures_iter(text) {
        out.insert(normalize_number(&caps[1]));
    }
    for caps in EURO.captures_iter(text) {
        out.insert(normalize_number(&caps[1]));
    }
    for caps in LIRA.captures_iter(text) {
        out.insert(normalize_number(&caps[1]));
    }
    out
}

/// Extract percentage amounts (the `%` marker stripped).
#[must_use]
pub fn extract_percentages(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }
    PERCENT.captures_iter(text).map(|caps| normalize_number(&caps[1])).collect()
}

/// Extract `<number> <unit>` duration phrases, e.g. `"30 dakika"`.
#[must_use]
pub fn extract_durations(text: &str) -> HashSet<String> {
    if text.trim().is_empty() {
        return HashSet::new();
    }
    DURATION
        .captures_iter(text)
        .map(|caps| format!("{} {}", normalize_number(&caps[1]), caps[2].to_lowercase()))
        .collect()
}

/// Map Turkish number words appearing in `text` to their digit-string
/// equivalents (ground truth: `extract_turkish_numbers`), with `buçuk`/
/// `yarım` understood as the fractional `0.5` rather than a bare zero.
#[must_use]
pub fn extract_turkish_numbers(text: &str) -> HashSet<String> {
    const WORDS: &[(&str, &str)] = &[
        ("bir", "1"),
        ("iki", "2"),
        ("üç", "3"),
        ("dört", "4"),
        ("beş", "5"),
        ("altı", "6"),
        ("yedi", "7"),
        ("sekiz", "8"),
        ("dokuz", "9"),
        ("on", "10"),
        ("onbir", "11"),
        ("oniki", "12"),
        ("yarım", "0.5"),
        ("buçuk", "0.5"),
    ];
    let normalized = normalize_turkish(text);
    let mut out = HashSet::new();
    for word in normalized.split_whitespace() {
        let cleaned = word.trim_matches(|c: char| !c.is_alphanumeric());
        if let Some((_, digits)) = WORDS.iter().find(|(w, _)| *w == cleaned) {
            out.insert((*digits).to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_exclude_dates_times_and_list_markers() {
        assert!(!extract_numbers("Date is 2025-01-15").contains("2025"));
        let times = extract_numbers("Meeting at 14:30");
        assert!(!times.contains("14") || !times.contains("30"));
        let list = extract_numbers("1. First item\n2. Second item\n3. Third item");
        assert!(!list.contains("1") && !list.contains("2") && !list.contains("3"));
        assert!(extract_numbers("Meeting at room 42").contains("42"));
    }

    #[test]
    fn numbers_normalize_comma_decimals() {
        assert!(extract_numbers("Price is 19,99 TL").contains("19.99"));
    }

    #[test]
    fn times_cover_colon_dot_and_seconds() {
        assert!(extract_times("Meeting at 14:30").contains("14:30"));
        assert!(extract_times("Meeting at 9.00").contains("09:00"));
        assert!(extract_times("Timestamp 10:30:45").contains("10:30"));
        let phone = extract_times("Call 555-1234");
        assert!(!phone.iter().any(|t| t.contains("55")));
    }

    #[test]
    fn dates_normalize_dot_to_slash_and_preserve_iso() {
        assert!(extract_dates("Date: 2025-01-15").contains("2025-01-15"));
        assert!(extract_dates("Date: 15/01/2025").contains("15/01/2025"));
        assert!(extract_dates("Date: 15.01.2025").contains("15/01/2025"));
        assert!(extract_dates("Date: 15/01/25").contains("15/01/25"));
    }

    #[test]
    fn currencies_strip_markers() {
        assert!(extract_currencies("Price: 150 TL").contains("150"));
        assert!(extract_currencies("Price: $99.99").contains("99.99"));
        assert!(extract_currencies("Cost: €50").contains("50"));
        assert!(extract_currencies("Fiyat 200 lira").contains("200"));
    }

    #[test]
    fn percentages_strip_percent_sign() {
        assert!(extract_percentages("Discount: 20%").contains("20"));
        assert!(extract_percentages("Rate: 5.5%").contains("5.5"));
    }

    #[test]
    fn turkish_numbers_map_to_digits() {
        assert!(extract_turkish_numbers("bir saat sonra").contains("1"));
        assert!(extract_turkish_numbers("iki kişi").contains("2"));
        assert!(extract_turkish_numbers("on dakika").contains("10"));
        let buçuk = extract_turkish_numbers("bir buçuk saat");
        assert!(buçuk.contains("1") && buçuk.contains("0.5"));
    }

    #[test]
    fn normalize_helpers_match_spec_examples() {
        assert_eq!(normalize_number("19,99"), "19.99");
        assert_eq!(normalize_number("007"), "7");
        assert_eq!(normalize_time("9.30"), "09:30");
        assert_eq!(normalize_time("14:00"), "14:00");
    }
}
