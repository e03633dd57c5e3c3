//! Leaderboard registry — owns the per-board tables and their locks
//!
//! Each (service, board) pair maps to one `RankTable` behind its own
//! `RwLock`, so operations on different leaderboards never contend.
//! The outer map lock is only held long enough to look up or insert a
//! table handle, never across a table operation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::table::RankTable;
use crate::types::BoardKey;

pub struct LeaderboardEngine {
    boards: RwLock<HashMap<BoardKey, Arc<RwLock<RankTable>>>>,
    admin_token: String,
}

impl LeaderboardEngine {
    pub fn new(admin_token: impl Into<String>) -> Self {
        Self {
            boards: RwLock::new(HashMap::new()),
            admin_token: admin_token.into(),
        }
    }

    /// Handle to an existing board's table, None if it was never
    /// written to (or has been deleted).
    pub fn table(&self, key: &BoardKey) -> Option<Arc<RwLock<RankTable>>> {
        self.boards.read().unwrap().get(key).cloned()
    }

    /// Handle to the board's table, creating it on first use
    pub fn table_or_create(&self, key: &BoardKey) -> Arc<RwLock<RankTable>> {
        if let Some(table) = self.table(key) {
            return table;
        }
        let mut boards = self.boards.write().unwrap();
        boards
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(service = %key.service_id, board = %key.board_id, "Creating leaderboard");
                Arc::new(RwLock::new(RankTable::new()))
            })
            .clone()
    }

    /// Count of live entries; a board that was never written to is
    /// simply empty.
    pub fn cardinality(&self, key: &BoardKey) -> u64 {
        match self.table(key) {
            Some(table) => table.read().unwrap().cardinality(),
            None => 0,
        }
    }

    /// Delete one member's entry. Idempotent; returns whether an entry
    /// was removed.
    pub fn remove_member(&self, key: &BoardKey, member_id: &str) -> bool {
        match self.table(key) {
            Some(table) => table.write().unwrap().remove(member_id),
            None => false,
        }
    }

    /// Privileged whole-board deletion. A credential mismatch fails
    /// with AccessDenied and leaves all state untouched; a match
    /// discards the table and every entry it held, unrecoverably.
    pub fn delete_leaderboard(&self, key: &BoardKey, credential: &str) -> EngineResult<()> {
        // An unset secret disables the operation outright rather than
        // letting an empty header match an empty token.
        if self.admin_token.is_empty() || !credential_matches(credential, &self.admin_token) {
            return Err(EngineError::AccessDenied);
        }
        let removed = self.boards.write().unwrap().remove(key);
        info!(
            service = %key.service_id,
            board = %key.board_id,
            existed = removed.is_some(),
            "Leaderboard deleted"
        );
        Ok(())
    }
}

/// Compare a supplied credential against the configured secret.
/// Both sides go through SHA-256 first, so the byte comparison runs on
/// fixed-length digests unrelated to any prefix the caller controls.
fn credential_matches(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    supplied == expected
}
