//! A single idempotency record: the fingerprint's bound event plus its
//! expiry (spec §4.6 "Schema").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded creation, keyed externally by its fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// The created resource's own identifier (e.g. a calendar event id).
    pub event_id: String,
    /// The handler's full success payload, returned verbatim on a replay hit.
    pub event: Value,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// How long this record stays valid after `created_at`.
    pub ttl_seconds: i64,
}

impl IdempotencyRecord {
    /// Build a new record, stamped `created_at = now`.
    #[must_use]
    pub fn new(event_id: impl Into<String>, event: Value, ttl_seconds: i64) -> Self {
        Self { event_id: event_id.into(), event, created_at: Utc::now(), ttl_seconds }
    }

    /// Whether `now > created_at + ttl_seconds` (spec §4.6).
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.created_at + chrono::Duration::seconds(self.ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_is_not_expired() {
        let record = IdempotencyRecord::new("evt-1", Value::Null, 3600);
        assert!(!record.is_expired(Utc::now()));
    }

    #[test]
    fn record_expires_after_ttl() {
        let record = IdempotencyRecord::new("evt-1", Value::Null, 1);
        let later = Utc::now() + chrono::Duration::seconds(10);
        assert!(record.is_expired(later));
    }
}
