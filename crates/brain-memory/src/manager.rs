//! In-memory ring buffer over the SQLite store, the lifecycle wrapper other
//! crates actually talk to (spec §4.3 "Lifecycle wrapper").

use std::collections::VecDeque;

use brain_config::MemoryConfig;
use brain_core::ids::SessionId;
use brain_core::types::CompactSummary;

use crate::error::MemoryResult;
use crate::store::SqliteMemoryStore;

/// Wraps [`SqliteMemoryStore`] with an in-memory ring buffer of the most
/// recent turns, for fast prompt-section rendering without hitting SQLite
/// on every turn.
pub struct PersistentDialogSummaryManager {
    store: SqliteMemoryStore,
    session_id: SessionId,
    pii_filter_enabled: bool,
    max_turns: usize,
    ring: VecDeque<CompactSummary>,
}

impl PersistentDialogSummaryManager {
    /// Open the store at `config.db_path`, start a new session, and preload
    /// up to `config.max_sessions` past sessions (each capped at
    /// `config.max_turns`) into the ring buffer.
    ///
    /// # Errors
    /// Returns [`crate::error::MemoryError`] if the store can't be opened or
    /// the boot reload query fails.
    pub fn create(config: &MemoryConfig) -> MemoryResult<Self> {
        let store = SqliteMemoryStore::open(&config.db_path)?;
        Self::from_store(store, config)
    }

    /// As [`Self::create`], but reusing an already-open store (used by
    /// tests and by callers sharing one in-memory database).
    ///
    /// # Errors
    /// Returns [`crate::error::MemoryError`] if the session can't be created
    /// or the boot reload query fails.
    pub fn from_store(store: SqliteMemoryStore, config: &MemoryConfig) -> MemoryResult<Self> {
        let session_id = store.create_session()?;
        let max_turns = config.max_turns as usize;
        let past_turns = store.load_all_turns_flat(config.max_sessions, config.max_turns)?;
        let mut ring = VecDeque::with_capacity(max_turns);
        for turn in past_turns {
            if ring.len() == max_turns {
                ring.pop_front();
            }
            ring.push_back(turn);
        }
        tracing::info!(
            session_id = %session_id,
            preloaded_turns = ring.len(),
            "dialog session started"
        );
        Ok(Self { store, session_id, pii_filter_enabled: config.pii_filter_enabled, max_turns, ring })
    }

    /// The session id assigned on construction.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Append a turn to both the ring buffer and the SQLite store.
    ///
    /// # Errors
    /// Returns [`crate::error::MemoryError`] if the SQLite write fails.
    pub fn add_turn(&mut self, summary: CompactSummary) -> MemoryResult<()> {
        self.store.save_turn(&self.session_id, &summary, self.pii_filter_enabled)?;
        if self.ring.len() == self.max_turns {
            self.ring.pop_front();
        }
        self.ring.push_back(summary);
        Ok(())
    }

    /// Render the ring buffer as the `DIALOG_SUMMARY:` prompt section (spec
    /// §4.4). Returns an empty string when there are no turns yet.
    #[must_use]
    pub fn to_prompt_block(&self) -> String {
        if self.ring.is_empty() {
            return String::new();
        }
        let mut lines = vec!["DIALOG_SUMMARY:".to_string()];
        for turn in &self.ring {
            lines.push(format!("- [{}] {} -> {}", turn.turn_number, turn.user_intent, turn.action_taken));
        }
        lines.join("\n")
    }

    /// Number of turns currently held in the ring buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the ring buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Mark the current session ended. Does not close the underlying store.
    ///
    /// # Errors
    /// Returns [`crate::error::MemoryError`] if the SQLite write fails.
    pub fn end_session(&self) -> MemoryResult<()> {
        self.store.end_session(&self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config() -> MemoryConfig {
        MemoryConfig {
            db_path: std::path::PathBuf::from(":memory:"),
            max_sessions: 5,
            max_turns: 3,
            pii_filter_enabled: true,
        }
    }

    fn sample(turn_number: u32) -> CompactSummary {
        CompactSummary {
            turn_number,
            user_intent: "test".to_string(),
            action_taken: "did a thing".to_string(),
            pending_items: vec![],
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn ring_buffer_caps_at_max_turns() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        let mut manager = PersistentDialogSummaryManager::from_store(store, &test_config()).unwrap();
        for i in 1..=5 {
            manager.add_turn(sample(i)).unwrap();
        }
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn prompt_block_lists_every_ring_turn() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        let mut manager = PersistentDialogSummaryManager::from_store(store, &test_config()).unwrap();
        manager.add_turn(sample(1)).unwrap();
        let block = manager.to_prompt_block();
        assert!(block.starts_with("DIALOG_SUMMARY:"));
        assert!(block.contains("test"));
    }

    #[test]
    fn empty_manager_renders_empty_block() {
        let store = SqliteMemoryStore::open_in_memory().unwrap();
        let manager = PersistentDialogSummaryManager::from_store(store, &test_config()).unwrap();
        assert_eq!(manager.to_prompt_block(), "");
    }
}
