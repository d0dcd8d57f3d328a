//! C7: idempotency store — prevents duplicate side effects on retry (spec
//! §4.6), grounded on
//! `original_source/src/bantz/tools/calendar_idempotency.py`.

pub mod error;
pub mod fingerprint;
pub mod record;
pub mod store;

pub use error::{IdempotencyError, IdempotencyResult};
pub use fingerprint::{fingerprint, normalize_datetime, normalize_title};
pub use record::IdempotencyRecord;
pub use store::{IdempotencyStore, DEFAULT_TTL_SECONDS};

use serde_json::Value;

/// Outcome of [`create_with_idempotency`].
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// Whether the call (new or replayed) succeeded.
    pub ok: bool,
    /// Whether this was a replay of a previous creation rather than a fresh
    /// `create_fn` call.
    pub duplicate: bool,
    /// The event payload — either freshly created or the recorded one.
    pub event: Option<Value>,
    /// A user-facing message, set on replay (spec: "informative success
    /// message").
    pub message: Option<String>,
}

/// Create an event idempotently (spec §4.6 contract).
///
/// If an unexpired record for `(title, start, end, calendar_id)` exists,
/// returns it without calling `create_fn`. Otherwise calls `create_fn`, and
/// on success records the new fingerprint -> event-id binding.
///
/// `create_fn` must return `(event_id, event_payload)` on success.
///
/// # Errors
/// Returns [`IdempotencyError`] if the store can't be read or written, or if
/// `create_fn` itself fails.
pub fn create_with_idempotency(
    store: &IdempotencyStore,
    title: &str,
    start: &str,
    end: &str,
    calendar_id: &str,
    create_fn: impl FnOnce() -> IdempotencyResult<(String, Value)>,
) -> IdempotencyResult<CreateOutcome> {
    let key = fingerprint(title, start, end, calendar_id);

    if let Some(existing) = store.get(&key)? {
        tracing::info!(fingerprint = %key, event_id = %existing.event_id, "idempotent duplicate");
        return Ok(CreateOutcome {
            ok: true,
            duplicate: true,
            event: Some(existing.event.clone()),
            message: Some(format!("'{title}' etkinliği zaten ekli.")),
        });
    }

    let (event_id, event) = create_fn()?;
    store.put(&key, &event_id, event.clone())?;

    Ok(CreateOutcome { ok: true, duplicate: false, event: Some(event), message: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_invokes_create_fn() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idem.json"), DEFAULT_TTL_SECONDS);
        let mut calls = 0;
        let outcome = create_with_idempotency(
            &store,
            "Diş randevusu",
            "2026-02-01T15:00:00+03:00",
            "2026-02-01T16:00:00+03:00",
            "primary",
            || {
                calls += 1;
                Ok(("evt-1".to_string(), serde_json::json!({"id": "evt-1"})))
            },
        )
        .unwrap();
        assert!(!outcome.duplicate);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retry_with_same_params_returns_recorded_event_without_calling_create_fn() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idem.json"), DEFAULT_TTL_SECONDS);
        let params = ("Diş randevusu", "2026-02-01T15:00:00+03:00", "2026-02-01T16:00:00+03:00", "primary");

        create_with_idempotency(&store, params.0, params.1, params.2, params.3, || {
            Ok(("evt-1".to_string(), serde_json::json!({"id": "evt-1"})))
        })
        .unwrap();

        let mut second_call_count = 0;
        let outcome = create_with_idempotency(&store, params.0, params.1, params.2, params.3, || {
            second_call_count += 1;
            Ok(("evt-2".to_string(), serde_json::json!({"id": "evt-2"})))
        })
        .unwrap();

        assert!(outcome.duplicate);
        assert_eq!(second_call_count, 0);
        assert_eq!(outcome.event.unwrap()["id"], "evt-1");
    }

    #[test]
    fn different_params_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idem.json"), DEFAULT_TTL_SECONDS);

        create_with_idempotency(
            &store,
            "Toplantı A",
            "2026-02-01T15:00:00+03:00",
            "2026-02-01T16:00:00+03:00",
            "primary",
            || Ok(("evt-a".to_string(), serde_json::json!({"id": "evt-a"}))),
        )
        .unwrap();

        let outcome = create_with_idempotency(
            &store,
            "Toplantı B",
            "2026-02-01T15:00:00+03:00",
            "2026-02-01T16:00:00+03:00",
            "primary",
            || Ok(("evt-b".to_string(), serde_json::json!({"id": "evt-b"}))),
        )
        .unwrap();

        assert!(!outcome.duplicate);
    }
}
