//! UpdatePolicy — validated score submission on top of the registry

use chrono::Utc;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::registry::LeaderboardEngine;
use crate::types::{tiebreak_token, BoardKey, ScorePolicy, SubmitOutcome};

/// Wraps `RankTable::submit` with the configured score policy.
///
/// Strict rejects non-positive scores with InvalidArgument; lenient
/// answers them with a no-op outcome. Both run the same submission
/// path for positive scores.
pub struct UpdatePolicy<'a> {
    engine: &'a LeaderboardEngine,
    policy: ScorePolicy,
}

impl<'a> UpdatePolicy<'a> {
    pub fn new(engine: &'a LeaderboardEngine, policy: ScorePolicy) -> Self {
        Self { engine, policy }
    }

    pub fn submit(&self, key: &BoardKey, member_id: &str, score: i64) -> EngineResult<SubmitOutcome> {
        if score <= 0 {
            return match self.policy {
                ScorePolicy::Strict => Err(EngineError::invalid(
                    "score parameter must be a positive value",
                )),
                ScorePolicy::Lenient => {
                    let previous_score = self
                        .engine
                        .table(key)
                        .and_then(|table| table.read().unwrap().rank_of(member_id).map(|(_, s)| s));
                    Ok(SubmitOutcome {
                        accepted: false,
                        previous_score,
                    })
                }
            };
        }

        let token = tiebreak_token(Utc::now());
        let table = self.engine.table_or_create(key);
        // Write lock held across the compare-and-write: concurrent
        // readers see the entry before or after, never in between.
        let outcome = table.write().unwrap().submit(member_id, score as u64, token);

        debug!(
            service = %key.service_id,
            board = %key.board_id,
            member = %member_id,
            score,
            accepted = outcome.accepted,
            "Score submitted"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> BoardKey {
        BoardKey::new("svc", "weekly")
    }

    #[test]
    fn test_strict_rejects_non_positive_scores() {
        let engine = LeaderboardEngine::new("sekrit");
        let policy = UpdatePolicy::new(&engine, ScorePolicy::Strict);
        for score in [0, -1, -100] {
            let err = policy.submit(&key(), "alice", score).unwrap_err();
            assert!(matches!(err, EngineError::InvalidArgument(_)));
        }
        assert_eq!(engine.cardinality(&key()), 0);
    }

    #[test]
    fn test_lenient_noops_non_positive_scores() {
        let engine = LeaderboardEngine::new("sekrit");
        let policy = UpdatePolicy::new(&engine, ScorePolicy::Lenient);

        let outcome = policy.submit(&key(), "alice", 0).unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.previous_score, None);

        policy.submit(&key(), "alice", 70).unwrap();
        let outcome = policy.submit(&key(), "alice", -5).unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.previous_score, Some(70));
        assert_eq!(engine.cardinality(&key()), 1);
    }

    #[test]
    fn test_submit_returns_previous_score_on_noop() {
        let engine = LeaderboardEngine::new("sekrit");
        let policy = UpdatePolicy::new(&engine, ScorePolicy::Strict);

        policy.submit(&key(), "alice", 100).unwrap();
        let outcome = policy.submit(&key(), "alice", 50).unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.previous_score, Some(100));

        // Stored state unchanged
        let table = engine.table(&key()).unwrap();
        assert_eq!(table.read().unwrap().rank_of("alice"), Some((1, 100)));
    }

    #[test]
    fn test_submit_higher_score_accepted() {
        let engine = LeaderboardEngine::new("sekrit");
        let policy = UpdatePolicy::new(&engine, ScorePolicy::Strict);

        let first = policy.submit(&key(), "alice", 100).unwrap();
        assert!(first.accepted);
        assert_eq!(first.previous_score, None);

        let second = policy.submit(&key(), "alice", 150).unwrap();
        assert!(second.accepted);
        assert_eq!(second.previous_score, Some(100));
    }
}
