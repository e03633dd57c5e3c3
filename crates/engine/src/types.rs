//! Types for the leaderboard engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound used to invert timestamps for tie-breaking.
/// 06/11/2128 @ 8:53am (UTC) — safely beyond the service lifetime.
pub const MAX_TIMESTAMP: i64 = 5_000_000_000;

/// Tie-break token for an update happening at `now`.
///
/// Equal scores sort by this token ascending. The token decreases as
/// wall-clock time advances, so among equal scores the most recent
/// update ranks first. Both `TopRange` and `Window` read the same
/// ordering, keeping the direction consistent everywhere.
pub fn tiebreak_token(now: DateTime<Utc>) -> i64 {
    MAX_TIMESTAMP - now.timestamp()
}

/// Identifies one leaderboard: (service, board) pairs are independent
/// units of locking and lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardKey {
    pub service_id: String,
    pub board_id: String,
}

impl BoardKey {
    pub fn new(service_id: impl Into<String>, board_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            board_id: board_id.into(),
        }
    }
}

/// How non-positive scores are treated on submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorePolicy {
    /// Reject non-positive scores with InvalidArgument
    Strict,
    /// Silently no-op on non-positive scores
    Lenient,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self::Strict
    }
}

/// Outcome of a score submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// True iff the new score replaced the stored entry
    pub accepted: bool,
    /// Stored score before the call, None if the member was absent.
    /// Returned regardless of acceptance so callers can detect no-ops.
    #[serde(rename = "prevScore")]
    pub previous_score: Option<u64>,
}

/// One row of a ranked query result. Ranks are absolute and 1-based
/// (1 = highest score).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    #[serde(rename = "userId")]
    pub member_id: String,
    pub rank: u64,
    pub score: u64,
    /// Overlay decoration, present only when requested and stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

impl RankedEntry {
    pub fn new(member_id: impl Into<String>, rank: u64, score: u64) -> Self {
        Self {
            member_id: member_id.into(),
            rank,
            score,
            properties: None,
        }
    }
}
