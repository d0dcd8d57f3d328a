//! SQLite-backed run tracker (spec §4.9 "RunTracker"), grounded on
//! `RunTracker`'s `track_run`/`track_tool` context-manager API and on
//! `SqliteMemoryStore`'s connection/schema idiom for the sync SQLite layer.
//!
//! The source language's `async with ... as run` scope becomes an RAII guard
//! here, in the manner of `astralis-telemetry`'s `RequestGuard`: entering a
//! run/tool-call span returns a guard, mutating it records progress, and
//! dropping it captures elapsed time and flushes the row. `std::thread::panicking`
//! stands in for "an exception propagated out of the block".

use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use brain_core::ids::{ArtifactId, RunId, ToolCallId};

use crate::error::{TelemetryError, TelemetryResult};
use crate::schema::SCHEMA_SQL;
use crate::summarize;
use crate::types::{
    Artifact, ErrorBreakdownEntry, Run, RunStats, RunStatus, ToolCall, ToolCallStatus, ToolStat,
};

/// Thread-safe SQLite-backed store for runs, tool calls, and artifacts.
pub struct RunTracker {
    conn: Mutex<Connection>,
}

impl RunTracker {
    /// Open (creating if absent) the SQLite database at `db_path`.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Io`] if the parent directory can't be
    /// created, or [`TelemetryError::Sqlite`] if the connection or schema
    /// setup fails.
    pub fn open(db_path: &Path) -> TelemetryResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA_SQL)?;
        tracing::info!(db_path = %db_path.display(), "opened run tracker store");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory store, useful for tests.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if schema setup fails.
    pub fn open_in_memory() -> TelemetryResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Begin tracking one turn. The returned guard persists its row when
    /// dropped (or when the caller explicitly calls nothing further).
    #[must_use]
    pub fn track_run(&self, user_input: impl Into<String>, session_id: Option<&str>) -> RunGuard<'_> {
        let run = Run::new(RunId::new(), session_id.map(str::to_string), user_input.into());
        tracing::debug!(run_id = %run.run_id, "run started");
        RunGuard {
            tracker: self,
            run,
            start: Instant::now(),
            explicit_error: None,
            had_tool_error: Cell::new(false),
            finished: false,
        }
    }

    fn persist_run(&self, run: &Run) -> TelemetryResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO runs
                (run_id, session_id, user_input, started_at, ended_at, status,
                 route, final_output, model, total_tokens, latency_ms, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                run.run_id.as_str(),
                run.session_id,
                run.user_input,
                run.started_at.to_rfc3339(),
                run.ended_at.map(|t| t.to_rfc3339()),
                run.status.as_str(),
                run.route,
                run.final_output,
                run.model,
                run.total_tokens as i64,
                run.latency_ms.map(|v| v as i64),
                run.error,
            ],
        )?;
        Ok(())
    }

    fn persist_tool_call(&self, tc: &ToolCall) -> TelemetryResult<()> {
        let params_json = serde_json::to_string(&tc.params).unwrap_or_else(|_| "{}".to_string());
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO tool_calls
                (call_id, run_id, tool_name, params, status, result_hash,
                 result_summary, error, elapsed_ms, retry_count, confirmation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                tc.call_id.as_str(),
                tc.run_id.as_str(),
                tc.tool_name,
                params_json,
                tc.status.as_str(),
                tc.result_hash,
                tc.result_summary,
                tc.error,
                tc.elapsed_ms as i64,
                tc.retry_count,
                tc.confirmation,
            ],
        )?;
        Ok(())
    }

    /// Look up one run by id.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn get_run(&self, run_id: &RunId) -> TelemetryResult<Option<Run>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT run_id, session_id, user_input, started_at, ended_at, status,
                    route, final_output, model, total_tokens, latency_ms, error
             FROM runs WHERE run_id = ?1",
            params![run_id.as_str()],
            row_to_run,
        )
        .optional()
        .map_err(TelemetryError::from)
    }

    /// Every tool call recorded under `run_id`, in insertion order.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn get_tool_calls(&self, run_id: &RunId) -> TelemetryResult<Vec<ToolCall>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT call_id, run_id, tool_name, params, status, result_hash,
                    result_summary, error, elapsed_ms, retry_count, confirmation
             FROM tool_calls WHERE run_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id.as_str()], row_to_tool_call)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }

    /// Tool calls matching `tool_name`, most recent first.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn list_tool_calls_by_name(&self, tool_name: &str) -> TelemetryResult<Vec<ToolCall>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT call_id, run_id, tool_name, params, status, result_hash,
                    result_summary, error, elapsed_ms, retry_count, confirmation
             FROM tool_calls WHERE tool_name = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt.query_map(params![tool_name], row_to_tool_call)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }

    /// Store a content blob, optionally tied to a run.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the insert fails.
    pub fn save_artifact(
        &self,
        run_id: Option<&RunId>,
        artifact_type: &str,
        content: &str,
        title: Option<&str>,
        mime_type: Option<&str>,
    ) -> TelemetryResult<Artifact> {
        let artifact = Artifact {
            artifact_id: ArtifactId::new(),
            run_id: run_id.cloned(),
            artifact_type: artifact_type.to_string(),
            title: title.map(str::to_string),
            content: content.to_string(),
            mime_type: mime_type.unwrap_or("text/plain").to_string(),
            size_bytes: content.len() as u64,
            created_at: Utc::now(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO artifacts
                (artifact_id, run_id, type, title, content, mime_type, size_bytes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                artifact.artifact_id.as_str(),
                artifact.run_id.as_ref().map(RunId::as_str),
                artifact.artifact_type,
                artifact.title,
                artifact.content,
                artifact.mime_type,
                artifact.size_bytes as i64,
                artifact.created_at.to_rfc3339(),
            ],
        )?;
        Ok(artifact)
    }

    /// Artifacts stored under `run_id`, in insertion order.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn get_artifacts(&self, run_id: &RunId) -> TelemetryResult<Vec<Artifact>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT artifact_id, run_id, type, title, content, mime_type, size_bytes, created_at
             FROM artifacts WHERE run_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![run_id.as_str()], row_to_artifact)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }

    /// Aggregate run counts/tokens, optionally scoped to runs started at or
    /// after `since`.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn run_stats(&self, since: Option<DateTime<Utc>>) -> TelemetryResult<RunStats> {
        let conn = self.lock();
        let since_str = since.map(|t| t.to_rfc3339());
        let (total, errors, total_tokens): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END),
                    COALESCE(SUM(total_tokens), 0)
             FROM runs WHERE ?1 IS NULL OR started_at >= ?1",
            params![since_str],
            |row| Ok((row.get(0)?, row.get::<_, Option<i64>>(1)?.unwrap_or(0), row.get(2)?)),
        )?;
        let total = total as u64;
        let errors = errors as u64;
        let success = total.saturating_sub(errors);
        Ok(RunStats {
            total,
            success,
            errors,
            success_rate: if total == 0 { 0.0 } else { (success as f64 / total as f64 * 1000.0).round() / 10.0 },
            total_tokens: total_tokens as u64,
        })
    }

    /// Per-tool call/error counts and average latency.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn tool_stats(&self) -> TelemetryResult<Vec<ToolStat>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT tool_name, COUNT(*),
                    SUM(CASE WHEN status = 'error' THEN 1 ELSE 0 END),
                    AVG(elapsed_ms)
             FROM tool_calls GROUP BY tool_name ORDER BY tool_name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let calls: i64 = row.get(1)?;
            let errors: i64 = row.get::<_, Option<i64>>(2)?.unwrap_or(0);
            let avg_latency: f64 = row.get::<_, Option<f64>>(3)?.unwrap_or(0.0);
            Ok(ToolStat {
                tool_name: row.get(0)?,
                calls: calls as u64,
                errors: errors as u64,
                error_rate: if calls == 0 { 0.0 } else { (errors as f64 / calls as f64 * 1000.0).round() / 10.0 },
                avg_latency_ms: avg_latency,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }

    /// Tool calls whose `elapsed_ms` is at or above `threshold_ms`.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn slow_tools(&self, threshold_ms: u64) -> TelemetryResult<Vec<ToolCall>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT call_id, run_id, tool_name, params, status, result_hash,
                    result_summary, error, elapsed_ms, retry_count, confirmation
             FROM tool_calls WHERE elapsed_ms >= ?1 ORDER BY elapsed_ms DESC",
        )?;
        let rows = stmt.query_map(params![threshold_ms as i64], row_to_tool_call)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }

    /// Errored tool calls, optionally scoped to one tool.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn error_breakdown(&self, tool_name: Option<&str>) -> TelemetryResult<Vec<ErrorBreakdownEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT tool_name, error, call_id FROM tool_calls
             WHERE status = 'error' AND (?1 IS NULL OR tool_name = ?1)
             ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![tool_name], |row| {
            Ok(ErrorBreakdownEntry {
                tool_name: row.get(0)?,
                error: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                call_id: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }

    /// Artifact counts grouped by type.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn artifact_stats(&self) -> TelemetryResult<BTreeMap<String, u64>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM artifacts GROUP BY type")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64)))?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (artifact_type, count) = row?;
            out.insert(artifact_type, count);
        }
        Ok(out)
    }

    /// Paginated run listing, most recently started first.
    ///
    /// # Errors
    /// Returns [`TelemetryError::Sqlite`] if the query fails.
    pub fn list_runs(
        &self,
        session_id: Option<&str>,
        status: Option<RunStatus>,
        limit: u32,
        offset: u32,
    ) -> TelemetryResult<Vec<Run>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT run_id, session_id, user_input, started_at, ended_at, status,
                    route, final_output, model, total_tokens, latency_ms, error
             FROM runs
             WHERE (?1 IS NULL OR session_id = ?1) AND (?2 IS NULL OR status = ?2)
             ORDER BY started_at DESC LIMIT ?3 OFFSET ?4",
        )?;
        let status_str = status.map(RunStatus::as_str);
        let rows = stmt.query_map(params![session_id, status_str, limit, offset], row_to_run)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(TelemetryError::from)
    }
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<Run> {
    let started_at: String = row.get(3)?;
    let ended_at: Option<String> = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(Run {
        run_id: RunId::from_string(row.get::<_, String>(0)?),
        session_id: row.get(1)?,
        user_input: row.get(2)?,
        started_at: started_at.parse().unwrap_or_else(|_| Utc::now()),
        ended_at: ended_at.and_then(|s| s.parse().ok()),
        status: RunStatus::parse(&status),
        route: row.get(6)?,
        final_output: row.get(7)?,
        model: row.get(8)?,
        total_tokens: row.get::<_, i64>(9)? as u64,
        latency_ms: row.get::<_, Option<i64>>(10)?.map(|v| v as u64),
        error: row.get(11)?,
    })
}

fn row_to_tool_call(row: &rusqlite::Row<'_>) -> rusqlite::Result<ToolCall> {
    let params_json: String = row.get(3)?;
    let status: String = row.get(4)?;
    Ok(ToolCall {
        call_id: ToolCallId::from_string(row.get::<_, String>(0)?),
        run_id: RunId::from_string(row.get::<_, String>(1)?),
        tool_name: row.get(2)?,
        params: serde_json::from_str(&params_json).unwrap_or(Value::Null),
        status: ToolCallStatus::parse(&status),
        result_hash: row.get(5)?,
        result_summary: row.get(6)?,
        error: row.get(7)?,
        elapsed_ms: row.get::<_, i64>(8)? as u64,
        retry_count: row.get::<_, i64>(9)? as u32,
        confirmation: row.get(10)?,
    })
}

fn row_to_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Artifact> {
    let created_at: String = row.get(7)?;
    Ok(Artifact {
        artifact_id: ArtifactId::from_string(row.get::<_, String>(0)?),
        run_id: row.get::<_, Option<String>>(1)?.map(RunId::from_string),
        artifact_type: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        mime_type: row.get(5)?,
        size_bytes: row.get::<_, i64>(6)? as u64,
        created_at: created_at.parse().unwrap_or_else(|_| Utc::now()),
    })
}

/// RAII span covering one turn. Mutating methods record progress; dropping
/// the guard captures elapsed time, settles `status`, and flushes the row.
pub struct RunGuard<'a> {
    tracker: &'a RunTracker,
    run: Run,
    start: Instant,
    explicit_error: Option<String>,
    had_tool_error: Cell<bool>,
    finished: bool,
}

impl RunGuard<'_> {
    /// The id assigned to this run.
    #[must_use]
    pub fn run_id(&self) -> &RunId {
        &self.run.run_id
    }

    /// Record which route the orchestrator chose.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.run.route = Some(route.into());
    }

    /// Record the finalized assistant reply.
    pub fn set_final_output(&mut self, output: impl Into<String>) {
        self.run.final_output = Some(output.into());
    }

    /// Record which model served this run.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.run.model = Some(model.into());
    }

    /// Add to the run's running token total.
    pub fn add_tokens(&mut self, tokens: u64) {
        self.run.total_tokens += tokens;
    }

    /// Mark the run as having failed with `error` (stands in for an
    /// exception escaping the tracked block).
    pub fn fail(&mut self, error: impl Into<String>) {
        self.explicit_error = Some(error.into());
    }

    /// Begin tracking one tool call nested under this run.
    #[must_use]
    pub fn track_tool(&self, tool_name: impl Into<String>, params: Value) -> ToolCallGuard<'_> {
        let tool_call = ToolCall::new(ToolCallId::new(), self.run.run_id.clone(), tool_name.into(), params);
        ToolCallGuard {
            tracker: self.tracker,
            tool_call,
            start: Instant::now(),
            parent_error_flag: &self.had_tool_error,
            finished: false,
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.run.ended_at = Some(Utc::now());
        self.run.latency_ms = Some(self.start.elapsed().as_millis() as u64);
        if std::thread::panicking() && self.explicit_error.is_none() {
            self.explicit_error = Some("panicked".to_string());
        }
        self.run.status = if let Some(err) = self.explicit_error.take() {
            self.run.error = Some(err);
            RunStatus::Error
        } else if self.had_tool_error.get() {
            RunStatus::Partial
        } else {
            RunStatus::Success
        };
        if let Err(err) = self.tracker.persist_run(&self.run) {
            tracing::error!(run_id = %self.run.run_id, %err, "failed to persist run");
        }
        self.finished = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// RAII span covering one tool call, nested inside a [`RunGuard`].
pub struct ToolCallGuard<'a> {
    tracker: &'a RunTracker,
    tool_call: ToolCall,
    start: Instant,
    parent_error_flag: &'a Cell<bool>,
    finished: bool,
}

impl ToolCallGuard<'_> {
    /// Record a successful result, computing its hash and truncated summary.
    pub fn set_result(&mut self, result: Value) {
        self.tool_call.status = ToolCallStatus::Success;
        self.tool_call.result_hash = Some(summarize::result_hash(&result));
        self.tool_call.result_summary = Some(summarize::result_summary(&result));
        self.tool_call.error = None;
    }

    /// Record a failure (stands in for an exception escaping the block).
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.tool_call.status = ToolCallStatus::Error;
        self.tool_call.error = Some(error.into());
    }

    /// Record that the tool was never invoked.
    pub fn set_skipped(&mut self, reason: impl Into<String>) {
        self.tool_call.status = ToolCallStatus::Skipped;
        self.tool_call.error = Some(reason.into());
    }

    /// Record how the confirmation firewall was resolved.
    pub fn set_confirmation(&mut self, confirmation: impl Into<String>) {
        self.tool_call.confirmation = Some(confirmation.into());
    }

    /// Bump the retry counter by one.
    pub fn increment_retry(&mut self) {
        self.tool_call.retry_count += 1;
    }
}

impl Drop for ToolCallGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.tool_call.elapsed_ms = self.start.elapsed().as_millis() as u64;
        if std::thread::panicking() && self.tool_call.status == ToolCallStatus::Success && self.tool_call.error.is_none() {
            self.tool_call.status = ToolCallStatus::Error;
            self.tool_call.error = Some("panicked".to_string());
        }
        if self.tool_call.status == ToolCallStatus::Error {
            self.parent_error_flag.set(true);
        }
        if let Err(err) = self.tracker.persist_tool_call(&self.tool_call) {
            tracing::error!(call_id = %self.tool_call.call_id, %err, "failed to persist tool call");
        }
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_run_tracking_round_trips() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let mut run = tracker.track_run("merhaba", None);
            run.set_route("greeting");
            run.set_final_output("Merhaba!");
            run.set_model("qwen2.5-3b");
            run_id = run.run_id().clone();
        }

        let saved = tracker.get_run(&run_id).unwrap().unwrap();
        assert_eq!(saved.user_input, "merhaba");
        assert_eq!(saved.route.as_deref(), Some("greeting"));
        assert_eq!(saved.final_output.as_deref(), Some("Merhaba!"));
        assert_eq!(saved.status, RunStatus::Success);
        assert!(saved.latency_ms.unwrap_or(0) < 5000);
    }

    #[test]
    fn explicit_fail_marks_run_as_error() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let mut run = tracker.track_run("fail", None);
            run.fail("boom");
            run_id = run.run_id().clone();
        }
        let saved = tracker.get_run(&run_id).unwrap().unwrap();
        assert_eq!(saved.status, RunStatus::Error);
        assert_eq!(saved.error.as_deref(), Some("boom"));
    }

    #[test]
    fn run_with_session_id_is_recorded() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("hi", Some("sess-1"));
            run_id = run.run_id().clone();
        }
        let saved = tracker.get_run(&run_id).unwrap().unwrap();
        assert_eq!(saved.session_id.as_deref(), Some("sess-1"));
    }

    #[test]
    fn basic_tool_call_round_trips() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("search email", None);
            {
                let mut tc = run.track_tool("gmail.search", serde_json::json!({"query": "test"}));
                tc.set_result(serde_json::json!({"messages": [{"id": "m1"}]}));
            }
            run_id = run.run_id().clone();
        }

        let calls = tracker.get_tool_calls(&run_id).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tool_name, "gmail.search");
        assert_eq!(calls[0].status, ToolCallStatus::Success);
        assert!(calls[0].result_hash.is_some());
    }

    #[test]
    fn tool_call_error_marks_run_partial() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("test", None);
            {
                let mut tc = run.track_tool("web.fetch", Value::Null);
                tc.set_error("timeout");
            }
            run_id = run.run_id().clone();
        }
        let saved = tracker.get_run(&run_id).unwrap().unwrap();
        assert_eq!(saved.status, RunStatus::Partial);
    }

    #[test]
    fn skipped_tool_call_records_reason_as_error_field() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("test", None);
            {
                let mut tc = run.track_tool("gmail.send", Value::Null);
                tc.set_skipped("user denied");
            }
            run_id = run.run_id().clone();
        }
        let calls = tracker.get_tool_calls(&run_id).unwrap();
        assert_eq!(calls[0].status, ToolCallStatus::Skipped);
        assert_eq!(calls[0].error.as_deref(), Some("user denied"));
    }

    #[test]
    fn retry_count_accumulates() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("test", None);
            {
                let mut tc = run.track_tool("web.fetch", Value::Null);
                tc.increment_retry();
                tc.increment_retry();
                tc.set_result(Value::String("ok".to_string()));
            }
            run_id = run.run_id().clone();
        }
        let calls = tracker.get_tool_calls(&run_id).unwrap();
        assert_eq!(calls[0].retry_count, 2);
    }

    #[test]
    fn large_result_summary_is_truncated() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("test", None);
            {
                let mut tc = run.track_tool("web.fetch", Value::Null);
                tc.set_result(Value::String("x".repeat(2000)));
            }
            run_id = run.run_id().clone();
        }
        let calls = tracker.get_tool_calls(&run_id).unwrap();
        assert!(calls[0].result_summary.as_ref().unwrap().len() <= 520);
    }

    #[test]
    fn save_and_get_artifact() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run_id;
        {
            let run = tracker.track_run("summarize", None);
            run_id = run.run_id().clone();
        }
        let art = tracker.save_artifact(Some(&run_id), "summary", "Bu bir özet.", Some("Haftalık Rapor"), Some("text/plain")).unwrap();
        assert_eq!(art.size_bytes, "Bu bir özet.".len() as u64);

        let artifacts = tracker.get_artifacts(&run_id).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].title.as_deref(), Some("Haftalık Rapor"));
    }

    #[test]
    fn artifact_without_run_has_no_run_id() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let art = tracker.save_artifact(None, "report", "Standalone report", None, None).unwrap();
        assert!(art.run_id.is_none());
    }

    #[test]
    fn run_stats_computes_success_rate_and_tokens() {
        let tracker = RunTracker::open_in_memory().unwrap();
        for i in 0..5 {
            let mut run = tracker.track_run(format!("query {i}"), None);
            run.add_tokens(100);
        }
        let stats = tracker.run_stats(None).unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.success, 5);
        assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(stats.total_tokens, 500);
    }

    #[test]
    fn run_stats_counts_errors_separately() {
        let tracker = RunTracker::open_in_memory().unwrap();
        drop(tracker.track_run("good", None));
        {
            let mut run = tracker.track_run("bad", None);
            run.fail("fail");
        }
        let stats = tracker.run_stats(None).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.errors, 1);
        assert!((stats.success_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tool_stats_groups_by_tool_name() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run = tracker.track_run("test", None);
        run.track_tool("gmail.search", Value::Null).set_result(Value::String("ok".to_string()));
        run.track_tool("gmail.search", Value::Null).set_result(Value::String("ok2".to_string()));
        run.track_tool("calendar.list", Value::Null).set_result(Value::String("ok3".to_string()));
        drop(run);

        let stats = tracker.tool_stats().unwrap();
        assert_eq!(stats.len(), 2);
        let gmail = stats.iter().find(|s| s.tool_name == "gmail.search").unwrap();
        assert_eq!(gmail.calls, 2);
    }

    #[test]
    fn error_breakdown_filters_by_tool() {
        let tracker = RunTracker::open_in_memory().unwrap();
        let run = tracker.track_run("test", None);
        run.track_tool("gmail.send", Value::Null).set_error("err1");
        run.track_tool("web.fetch", Value::Null).set_error("err2");
        drop(run);

        let errors = tracker.error_breakdown(Some("gmail.send")).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].tool_name, "gmail.send");
    }

    #[test]
    fn artifact_stats_counts_by_type() {
        let tracker = RunTracker::open_in_memory().unwrap();
        tracker.save_artifact(None, "summary", "a", None, None).unwrap();
        tracker.save_artifact(None, "summary", "b", None, None).unwrap();
        tracker.save_artifact(None, "transcript", "c", None, None).unwrap();

        let stats = tracker.artifact_stats().unwrap();
        assert_eq!(stats.get("summary"), Some(&2));
        assert_eq!(stats.get("transcript"), Some(&1));
    }

    #[test]
    fn list_runs_pagination_and_filters() {
        let tracker = RunTracker::open_in_memory().unwrap();
        for i in 0..3 {
            drop(tracker.track_run(format!("q{i}"), Some("s1")));
        }
        drop(tracker.track_run("other", Some("s2")));

        assert_eq!(tracker.list_runs(None, None, 10, 0).unwrap().len(), 4);
        assert_eq!(tracker.list_runs(Some("s1"), None, 10, 0).unwrap().len(), 3);

        let page1 = tracker.list_runs(None, None, 2, 0).unwrap();
        let page2 = tracker.list_runs(None, None, 2, 2).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_ne!(page1[0].run_id, page2[0].run_id);
    }
}
