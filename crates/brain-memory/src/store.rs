//! SQLite-backed persistent memory store (spec §4.3).

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde_json::Value;

use brain_core::ids::SessionId;
use brain_core::types::CompactSummary;

use crate::error::{MemoryError, MemoryResult};
use crate::pii;
use crate::schema::SCHEMA_SQL;

/// A session id paired with its loaded turns, most-recent-session-first.
pub type SessionTurns = (SessionId, Vec<CompactSummary>);

/// Thread-safe SQLite-backed store for dialog turn summaries.
///
/// Mirrors `SQLiteMemoryStore`: WAL journal mode for concurrent readers,
/// a single connection serialized behind a mutex for writers (SQLite itself
/// only ever allows one writer at a time regardless).
pub struct SqliteMemoryStore {
    conn: Mutex<Connection>,
}

impl SqliteMemoryStore {
    /// Open (creating if absent) the SQLite database at `db_path`, creating
    /// parent directories and the schema as needed.
    ///
    /// # Errors
    /// Returns [`MemoryError::Io`] if the parent directory can't be created,
    /// or [`MemoryError::Sqlite`] if the connection or schema setup fails.
    pub fn open(db_path: &Path) -> MemoryResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA_SQL)?;
        tracing::info!(db_path = %db_path.display(), "opened dialog memory store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory store, useful for tests.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if schema setup fails.
    pub fn open_in_memory() -> MemoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Create a new session row and return its id.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if the insert fails.
    pub fn create_session(&self) -> MemoryResult<SessionId> {
        let session_id = SessionId::new();
        let now = Utc::now().to_rfc3339();
        self.lock().execute(
            "INSERT INTO sessions (session_id, started_at) VALUES (?1, ?2)",
            params![session_id.as_str(), now],
        )?;
        tracing::info!(session_id = %session_id, "created dialog session");
        Ok(session_id)
    }

    /// Mark a session as ended.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if the update fails.
    pub fn end_session(&self, session_id: &SessionId) -> MemoryResult<()> {
        let now = Utc::now().to_rfc3339();
        self.lock().execute(
            "UPDATE sessions SET ended_at = ?1 WHERE session_id = ?2",
            params![now, session_id.as_str()],
        )?;
        Ok(())
    }

    /// Persist one turn summary, optionally PII-filtering free-text fields
    /// first.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if either write fails.
    pub fn save_turn(&self, session_id: &SessionId, summary: &CompactSummary, pii_filter: bool) -> MemoryResult<()> {
        let (user_intent, action_taken, pending_items) = if pii_filter {
            (
                pii::filter(&summary.user_intent),
                pii::filter(&summary.action_taken),
                summary.pending_items.iter().map(|p| pii::filter(p)).collect::<Vec<_>>(),
            )
        } else {
            (summary.user_intent.clone(), summary.action_taken.clone(), summary.pending_items.clone())
        };
        let pending_json = serde_json::to_string(&pending_items).unwrap_or_else(|_| "[]".to_string());

        let conn = self.lock();
        conn.execute(
            "INSERT INTO turns (session_id, turn_number, user_intent, action_taken, pending_items, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id.as_str(),
                summary.turn_number,
                user_intent,
                action_taken,
                pending_json,
                summary.timestamp.to_rfc3339(),
            ],
        )?;
        conn.execute(
            "UPDATE sessions SET turn_count = turn_count + 1 WHERE session_id = ?1",
            params![session_id.as_str()],
        )?;
        Ok(())
    }

    /// Load every turn for one session, oldest first.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if the query fails.
    pub fn load_session_turns(&self, session_id: &SessionId) -> MemoryResult<Vec<CompactSummary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT turn_number, user_intent, action_taken, pending_items, timestamp
             FROM turns WHERE session_id = ?1 ORDER BY turn_number ASC",
        )?;
        let rows = stmt.query_map(params![session_id.as_str()], row_to_summary)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(MemoryError::from)
    }

    /// Load the `max_sessions` most recently started sessions (each capped
    /// at `max_turns_per_session` turns), most-recent-session-first.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if either query fails.
    pub fn load_recent(&self, max_sessions: u32, max_turns_per_session: u32) -> MemoryResult<Vec<SessionTurns>> {
        let conn = self.lock();
        let mut session_stmt =
            conn.prepare("SELECT session_id FROM sessions ORDER BY started_at DESC LIMIT ?1")?;
        let session_ids: Vec<String> = session_stmt
            .query_map(params![max_sessions], |row| row.get::<_, String>(0))?
            .collect::<Result<_, _>>()?;

        let mut result = Vec::new();
        for sid in session_ids {
            let mut turn_stmt = conn.prepare(
                "SELECT turn_number, user_intent, action_taken, pending_items, timestamp
                 FROM turns WHERE session_id = ?1 ORDER BY turn_number ASC LIMIT ?2",
            )?;
            let turns: Vec<CompactSummary> =
                turn_stmt.query_map(params![sid, max_turns_per_session], row_to_summary)?.collect::<Result<_, _>>()?;
            if !turns.is_empty() {
                result.push((SessionId::from_string(sid), turns));
            }
        }
        Ok(result)
    }

    /// Flatten [`Self::load_recent`] into one chronologically ascending list
    /// (oldest session first), used to bootstrap the in-memory ring buffer.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if the underlying query fails.
    pub fn load_all_turns_flat(&self, max_sessions: u32, max_turns_per_session: u32) -> MemoryResult<Vec<CompactSummary>> {
        let mut sessions = self.load_recent(max_sessions, max_turns_per_session)?;
        sessions.reverse();
        Ok(sessions.into_iter().flat_map(|(_, turns)| turns).collect())
    }

    /// Delete every session beyond the `keep_sessions` most recent, and
    /// their turns. Returns the number of sessions deleted.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if any query fails.
    pub fn prune_old_sessions(&self, keep_sessions: u32) -> MemoryResult<usize> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT session_id FROM sessions ORDER BY started_at DESC LIMIT -1 OFFSET ?1")?;
        let old_ids: Vec<String> = stmt.query_map(params![keep_sessions], |row| row.get(0))?.collect::<Result<_, _>>()?;
        if old_ids.is_empty() {
            return Ok(0);
        }
        let placeholders = old_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let delete_turns = format!("DELETE FROM turns WHERE session_id IN ({placeholders})");
        let delete_sessions = format!("DELETE FROM sessions WHERE session_id IN ({placeholders})");
        let refs: Vec<&dyn rusqlite::ToSql> = old_ids.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        conn.execute(&delete_turns, refs.as_slice())?;
        conn.execute(&delete_sessions, refs.as_slice())?;
        tracing::info!(pruned = old_ids.len(), "pruned old dialog sessions");
        Ok(old_ids.len())
    }

    /// Count all sessions in the store.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if the query fails.
    pub fn session_count(&self) -> MemoryResult<u64> {
        self.lock().query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0)).map_err(MemoryError::from)
    }

    /// Count turns, optionally scoped to one session.
    ///
    /// # Errors
    /// Returns [`MemoryError::Sqlite`] if the query fails.
    pub fn turn_count(&self, session_id: Option<&SessionId>) -> MemoryResult<u64> {
        let conn = self.lock();
        match session_id {
            Some(sid) => {
                conn.query_row("SELECT COUNT(*) FROM turns WHERE session_id = ?1", params![sid.as_str()], |row| row.get(0))
            }
            None => conn.query_row("SELECT COUNT(*) FROM turns", [], |row| row.get(0)),
        }
        .map_err(MemoryError::from)
    }

    /// Export every turn, joined with its session's `started_at`, as JSONL.
    ///
    /// # Errors
    /// Returns [`MemoryError::Io`] if the file can't be written or
    /// [`MemoryError::Sqlite`] if the query fails.
    pub fn export_jsonl(&self, path: &Path) -> MemoryResult<usize> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT t.session_id, t.turn_number, t.user_intent, t.action_taken,
                    t.pending_items, t.timestamp, s.started_at
             FROM turns t JOIN sessions s ON t.session_id = s.session_id
             ORDER BY s.started_at ASC, t.turn_number ASC",
        )?;
        let mut file = std::fs::File::create(path)?;
        let mut count = 0usize;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;
        for row in rows {
            let (session_id, turn_number, user_intent, action_taken, pending_items, timestamp, started_at) = row?;
            let pending: Value = serde_json::from_str(&pending_items).unwrap_or(Value::Array(vec![]));
            let record = serde_json::json!({
                "session_id": session_id,
                "turn_number": turn_number,
                "user_intent": user_intent,
                "action_taken": action_taken,
                "pending_items": pending,
                "timestamp": timestamp,
                "session_started_at": started_at,
            });
            writeln!(file, "{record}")?;
            count += 1;
        }
        tracing::info!(count, path = %path.display(), "exported dialog memory to JSONL");
        Ok(count)
    }

    /// Import turns from a JSONL backup, creating any missing session rows.
    ///
    /// # Errors
    /// Returns [`MemoryError::Io`] if the file is missing or unreadable,
    /// [`MemoryError::Malformed`] if a line isn't a valid record, or
    /// [`MemoryError::Sqlite`] if a write fails.
    pub fn import_jsonl(&self, path: &Path) -> MemoryResult<usize> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let conn = self.lock();
        let mut seen_sessions = std::collections::HashSet::new();
        let mut count = 0usize;
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Value = serde_json::from_str(line).map_err(|e| MemoryError::Malformed(e.to_string()))?;
            let session_id = record["session_id"]
                .as_str()
                .ok_or_else(|| MemoryError::Malformed("missing session_id".to_string()))?
                .to_string();

            if seen_sessions.insert(session_id.clone()) {
                let exists: Option<i64> = conn
                    .query_row("SELECT 1 FROM sessions WHERE session_id = ?1", params![session_id], |row| row.get(0))
                    .ok();
                if exists.is_none() {
                    let started_at = record["session_started_at"].as_str().map_or_else(|| Utc::now().to_rfc3339(), str::to_string);
                    conn.execute(
                        "INSERT INTO sessions (session_id, started_at) VALUES (?1, ?2)",
                        params![session_id, started_at],
                    )?;
                }
            }

            let pending_items = record.get("pending_items").cloned().unwrap_or(Value::Array(vec![]));
            conn.execute(
                "INSERT INTO turns (session_id, turn_number, user_intent, action_taken, pending_items, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session_id,
                    record["turn_number"].as_i64().unwrap_or(0),
                    record["user_intent"].as_str().unwrap_or_default(),
                    record["action_taken"].as_str().unwrap_or_default(),
                    serde_json::to_string(&pending_items).unwrap_or_else(|_| "[]".to_string()),
                    record["timestamp"].as_str().unwrap_or_default(),
                ],
            )?;
            count += 1;
        }
        tracing::info!(count, path = %path.display(), "imported dialog memory from JSONL");
        Ok(count)
    }
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<CompactSummary> {
    let turn_number: i64 = row.get(0)?;
    let user_intent: String = row.get(1)?;
    let action_taken: String = row.get(2)?;
    let pending_json: String = row.get(3)?;
    let timestamp_raw: String = row.get(4)?;
    let pending_items: Vec<String> = serde_json::from_str(&pending_json).unwrap_or_default();
    let timestamp: DateTime<Utc> = timestamp_raw.parse().unwrap_or_else(|_| Utc::now());
    Ok(CompactSummary {
        turn_number: turn_number as u32,
        user_intent,
        action_taken,
        pending_items,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::types::CompactSummary;

    fn sample_summary(turn_number: u32) -> CompactSummary {
        CompactSummary {
            turn_number,
            user_intent: "toplantı ayarla".to_string(),
            action_taken: "calendar.create_event çağrıldı".to_string(),
            pending_items: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn round_trips_a_turn() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        let session_id = store.create_session().unwrap();
        store.save_turn(&session_id, &sample_summary(1), true).unwrap();
        let turns = store.load_session_turns(&session_id).unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].turn_number, 1);
    }

    #[test]
    fn load_recent_orders_most_recent_session_first() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        let first = store.create_session().unwrap();
        store.save_turn(&first, &sample_summary(1), true).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create_session().unwrap();
        store.save_turn(&second, &sample_summary(1), true).unwrap();

        let recent = store.load_recent(5, 20).unwrap();
        assert_eq!(recent[0].0, second);
    }

    #[test]
    fn prune_keeps_only_requested_session_count() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        for _ in 0..3 {
            let sid = store.create_session().unwrap();
            store.save_turn(&sid, &sample_summary(1), true).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        let pruned = store.prune_old_sessions(1).unwrap();
        assert_eq!(pruned, 2);
        assert_eq!(store.session_count().unwrap(), 1);
    }

    #[test]
    fn export_then_import_round_trips() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        let session_id = store.create_session().unwrap();
        store.save_turn(&session_id, &sample_summary(1), true).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.jsonl");
        let exported = store.export_jsonl(&path).unwrap();
        assert_eq!(exported, 1);

        let fresh = SqliteMemoryStore::open_in_memory().unwrap();
        let imported = fresh.import_jsonl(&path).unwrap();
        assert_eq!(imported, 1);
        assert_eq!(fresh.session_count().unwrap(), 1);
    }
}
