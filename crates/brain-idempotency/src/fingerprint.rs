//! Fingerprint generation (spec §4.6): a stable key over normalized creation
//! parameters so retried calls with the same effective input collapse to one
//! underlying side effect.

use sha2::{Digest, Sha256};

/// Normalize a title for fingerprinting: lowercase, collapse internal
/// whitespace, trim. A true Unicode NFKC pass isn't available without
/// pulling in a dedicated normalization crate nothing else in this workspace
/// needs; lowercasing plus whitespace collapsing covers the titles this
/// system actually sees (Turkish calendar/event text, no combining marks).
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a datetime string to UTC ISO-8601, falling back to the
/// whitespace-trimmed input when it doesn't parse (spec §4.6).
#[must_use]
pub fn normalize_datetime(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    chrono::DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&chrono::Utc).to_rfc3339())
        .unwrap_or_else(|_| trimmed.to_string())
}

/// Build the spec §4.6 fingerprint:
/// `SHA-256(normalize_title(title) || '|' || normalize_dt(start) || '|' ||
/// normalize_dt(end) || '|' || lowercase(calendar_id))`, truncated to the
/// first 32 hex chars.
#[must_use]
pub fn fingerprint(title: &str, start: &str, end: &str, calendar_id: &str) -> String {
    let canonical = format!(
        "{}|{}|{}|{}",
        normalize_title(title),
        normalize_datetime(start),
        normalize_datetime(end),
        calendar_id.trim().to_lowercase(),
    );
    let digest = Sha256::digest(canonical.as_bytes());
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_normalization_collapses_case_and_whitespace() {
        assert_eq!(normalize_title("  Diş   Randevusu  "), "diş randevusu");
    }

    #[test]
    fn datetime_normalization_converts_to_utc() {
        let normalized = normalize_datetime("2026-02-01T15:00:00+03:00");
        assert_eq!(normalized, "2026-02-01T12:00:00+00:00");
    }

    #[test]
    fn datetime_normalization_falls_back_on_parse_failure() {
        assert_eq!(normalize_datetime("  not-a-date  "), "not-a-date");
    }

    #[test]
    fn fingerprint_is_stable_across_equivalent_inputs() {
        let a = fingerprint("Toplantı", "2026-02-01T15:00:00+03:00", "2026-02-01T16:00:00+03:00", "primary");
        let b = fingerprint("  toplantı  ", "2026-02-01T12:00:00+00:00", "2026-02-01T13:00:00+00:00", "Primary");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn fingerprint_differs_for_different_titles() {
        let a = fingerprint("Toplantı", "2026-02-01T15:00:00+03:00", "2026-02-01T16:00:00+03:00", "primary");
        let b = fingerprint("Diğer toplantı", "2026-02-01T15:00:00+03:00", "2026-02-01T16:00:00+03:00", "primary");
        assert_ne!(a, b);
    }
}
