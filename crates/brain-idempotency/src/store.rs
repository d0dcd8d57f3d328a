//! `IdempotencyStore`: the single JSON file (spec §4.6 "Schema" / "Sweeping")
//! backing `create_with_idempotency`, grounded on
//! `original_source/src/bantz/tools/calendar_idempotency.py`'s
//! `IdempotencyStore`.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IdempotencyError, IdempotencyResult};
use crate::record::IdempotencyRecord;

/// Default TTL: 24 hours (spec §4.6).
pub const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: BTreeMap<String, IdempotencyRecord>,
}

struct Loaded {
    records: BTreeMap<String, IdempotencyRecord>,
    last_mtime: Option<SystemTime>,
}

/// A file-backed idempotency store. Safe to share across threads via the
/// internal mutex; cross-process coordination is mtime-based — whenever the
/// file's mtime has advanced past what this instance last saw, it reloads
/// before serving a read.
pub struct IdempotencyStore {
    path: PathBuf,
    ttl_seconds: i64,
    state: Mutex<Loaded>,
}

impl IdempotencyStore {
    /// Open (without requiring the file to exist yet) the store at `path`.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, ttl_seconds: i64) -> Self {
        Self {
            path: path.into(),
            ttl_seconds,
            state: Mutex::new(Loaded { records: BTreeMap::new(), last_mtime: None }),
        }
    }

    fn reload_if_stale(&self, loaded: &mut Loaded) -> IdempotencyResult<()> {
        let Ok(metadata) = fs::metadata(&self.path) else {
            return Ok(());
        };
        let mtime = metadata.modified().ok();
        if mtime.is_some() && mtime == loaded.last_mtime {
            return Ok(());
        }
        let raw = fs::read_to_string(&self.path)?;
        let file: StoreFile = serde_json::from_str(&raw).map_err(IdempotencyError::Malformed)?;
        let now = chrono::Utc::now();
        loaded.records = file.records.into_iter().filter(|(_, record)| !record.is_expired(now)).collect();
        loaded.last_mtime = mtime;
        Ok(())
    }

    fn save(&self, loaded: &Loaded) -> IdempotencyResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = StoreFile { version: 1, records: loaded.records.clone() };
        let serialized = serde_json::to_vec_pretty(&file).map_err(IdempotencyError::Malformed)?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&serialized)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Look up an unexpired record by fingerprint.
    ///
    /// # Errors
    /// Returns [`IdempotencyError`] if the backing file exists but can't be
    /// read or parsed.
    pub fn get(&self, fingerprint: &str) -> IdempotencyResult<Option<IdempotencyRecord>> {
        let mut loaded = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.reload_if_stale(&mut loaded)?;
        Ok(loaded.records.get(fingerprint).cloned())
    }

    /// Record a new fingerprint -> event binding and persist it.
    ///
    /// # Errors
    /// Returns [`IdempotencyError`] on read/write failure.
    pub fn put(&self, fingerprint: &str, event_id: &str, event: Value) -> IdempotencyResult<IdempotencyRecord> {
        let mut loaded = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.reload_if_stale(&mut loaded)?;
        let record = IdempotencyRecord::new(event_id, event, self.ttl_seconds);
        loaded.records.insert(fingerprint.to_string(), record.clone());
        self.save(&loaded)?;
        Ok(record)
    }

    /// Drop expired records from both memory and disk.
    ///
    /// # Errors
    /// Returns [`IdempotencyError`] on read/write failure.
    pub fn cleanup_expired(&self) -> IdempotencyResult<usize> {
        let mut loaded = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.reload_if_stale(&mut loaded)?;
        let now = chrono::Utc::now();
        let before = loaded.records.len();
        loaded.records.retain(|_, record| !record.is_expired(now));
        let removed = before - loaded.records.len();
        if removed > 0 {
            self.save(&loaded)?;
        }
        Ok(removed)
    }

    /// Number of currently active (unexpired) records.
    ///
    /// # Errors
    /// Returns [`IdempotencyError`] if the backing file can't be read.
    pub fn count(&self) -> IdempotencyResult<usize> {
        let mut loaded = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.reload_if_stale(&mut loaded)?;
        Ok(loaded.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idem.json"), DEFAULT_TTL_SECONDS);
        store.put("fp-1", "evt-1", serde_json::json!({"id": "evt-1"})).unwrap();
        let found = store.get("fp-1").unwrap().expect("record present");
        assert_eq!(found.event_id, "evt-1");
    }

    #[test]
    fn get_missing_fingerprint_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idem.json"), DEFAULT_TTL_SECONDS);
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn expired_record_is_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idem.json"), -1);
        store.put("fp-1", "evt-1", serde_json::json!({})).unwrap();
        assert!(store.get("fp-1").unwrap().is_none());
    }

    #[test]
    fn cleanup_expired_removes_stale_records_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idem.json");
        let store = IdempotencyStore::open(&path, -1);
        store.put("fp-1", "evt-1", serde_json::json!({})).unwrap();
        let removed = store.cleanup_expired().unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().unwrap(), 0);

        let reopened = IdempotencyStore::open(&path, DEFAULT_TTL_SECONDS);
        assert_eq!(reopened.count().unwrap(), 0);
    }

    #[test]
    fn second_store_instance_picks_up_writes_via_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idem.json");
        let writer = IdempotencyStore::open(&path, DEFAULT_TTL_SECONDS);
        writer.put("fp-1", "evt-1", serde_json::json!({"id": "evt-1"})).unwrap();

        let reader = IdempotencyStore::open(&path, DEFAULT_TTL_SECONDS);
        let found = reader.get("fp-1").unwrap().expect("record present");
        assert_eq!(found.event_id, "evt-1");
    }
}
