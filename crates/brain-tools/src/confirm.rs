//! Single-use approval tokens keyed by `(tool_name, params_fingerprint)`
//! (spec §4.7 `confirm_action`).

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use serde_json::Value;
use sha2::{Digest, Sha256};

fn token_key(tool_name: &str, params: &BTreeMap<String, Value>) -> String {
    let canonical = serde_json::to_string(params).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{tool_name}:{digest:x}")
}

/// Tracks confirmations granted for a single subsequent execution each.
#[derive(Default)]
pub struct ConfirmationStore {
    granted: Mutex<HashSet<String>>,
}

impl ConfirmationStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an approval for `(tool_name, params)`, valid for one
    /// subsequent `take`.
    pub fn grant(&self, tool_name: &str, params: &BTreeMap<String, Value>) {
        let mut granted = self.granted.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        granted.insert(token_key(tool_name, params));
    }

    /// Consume a previously granted approval for `(tool_name, params)`, if
    /// any. Returns whether one was present.
    pub fn take(&self, tool_name: &str, params: &BTreeMap<String, Value>) -> bool {
        let mut granted = self.granted.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        granted.remove(&token_key(tool_name, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_then_take_consumes_the_token() {
        let store = ConfirmationStore::new();
        let params = BTreeMap::from([("event_id".to_string(), Value::String("evt1".to_string()))]);
        store.grant("calendar_cancel", &params);
        assert!(store.take("calendar_cancel", &params));
        assert!(!store.take("calendar_cancel", &params));
    }

    #[test]
    fn different_params_need_separate_confirmation() {
        let store = ConfirmationStore::new();
        let params1 = BTreeMap::from([("event_id".to_string(), Value::String("evt1".to_string()))]);
        let params2 = BTreeMap::from([("event_id".to_string(), Value::String("evt2".to_string()))]);
        store.grant("calendar_cancel", &params1);
        assert!(!store.take("calendar_cancel", &params2));
        assert!(store.take("calendar_cancel", &params1));
    }
}
