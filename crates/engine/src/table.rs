//! RankTable — ordered storage and retrieval for one leaderboard
//!
//! Keeps two views of the same entries: a sorted set keyed by
//! (score desc, tiebreak asc) and a reverse index from member id to the
//! stored (score, tiebreak) pair. Mutations go through `submit` /
//! `remove`, which keep both views in step; callers serialize access
//! per table (see `registry`).

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::types::{RankedEntry, SubmitOutcome};

/// Default page size for top-K queries
pub const DEFAULT_LIMIT: u64 = 100;
/// Hard cap on a single top-K page
pub const MAX_LIMIT: u64 = 1000;
/// Default neighbor-window radius
pub const DEFAULT_RADIUS: u64 = 1;
/// Hard cap on the neighbor-window radius
pub const MAX_RADIUS: u64 = 10;

/// Sort key of one entry. Higher scores first; among equal scores the
/// smaller tiebreak token first (tokens shrink as time advances, so
/// ties rank more-recent-first). Member id last, purely to keep the
/// key total.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderKey {
    score: u64,
    tiebreak: i64,
    member_id: String,
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.tiebreak.cmp(&other.tiebreak))
            .then_with(|| self.member_id.cmp(&other.member_id))
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered score table for a single leaderboard
#[derive(Debug, Default)]
pub struct RankTable {
    ordering: BTreeSet<OrderKey>,
    members: HashMap<String, (u64, i64)>,
}

impl RankTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conditionally store `new_score` for `member`.
    ///
    /// Accepted iff the member has no entry yet or `new_score` beats
    /// the stored score. On acceptance the old entry is removed from
    /// both views and replaced whole, never merged. The caller must
    /// hold the table's write lock for the full call, which makes the
    /// read-compare-write indivisible.
    pub fn submit(&mut self, member_id: &str, new_score: u64, tiebreak: i64) -> SubmitOutcome {
        let previous_score = self.members.get(member_id).map(|&(score, _)| score);

        if let Some(prev) = previous_score {
            if new_score <= prev {
                return SubmitOutcome {
                    accepted: false,
                    previous_score,
                };
            }
        }

        if let Some((score, old_tiebreak)) = self.members.remove(member_id) {
            self.ordering.remove(&OrderKey {
                score,
                tiebreak: old_tiebreak,
                member_id: member_id.to_string(),
            });
        }

        self.ordering.insert(OrderKey {
            score: new_score,
            tiebreak,
            member_id: member_id.to_string(),
        });
        self.members
            .insert(member_id.to_string(), (new_score, tiebreak));

        SubmitOutcome {
            accepted: true,
            previous_score,
        }
    }

    /// Delete the member's entry if present. Returns whether an entry
    /// was removed; absent members are a no-op.
    pub fn remove(&mut self, member_id: &str) -> bool {
        match self.members.remove(member_id) {
            Some((score, tiebreak)) => {
                self.ordering.remove(&OrderKey {
                    score,
                    tiebreak,
                    member_id: member_id.to_string(),
                });
                true
            }
            None => false,
        }
    }

    /// 1-based rank and stored score of the member, None if absent.
    /// Rank is 1 + the count of entries sorting strictly before it.
    pub fn rank_of(&self, member_id: &str) -> Option<(u64, u64)> {
        let &(score, tiebreak) = self.members.get(member_id)?;
        let key = OrderKey {
            score,
            tiebreak,
            member_id: member_id.to_string(),
        };
        let before = self.ordering.range(..&key).count() as u64;
        Some((before + 1, score))
    }

    /// Number of live entries
    pub fn cardinality(&self) -> u64 {
        self.members.len() as u64
    }

    /// Page of the ordering starting at `offset` (0-based), at most
    /// `limit` rows. Ranks in the result are absolute, not relative to
    /// the offset. Empty when `offset` is at or past the end.
    pub fn top_range(&self, offset: u64, limit: u64) -> Vec<RankedEntry> {
        self.ordering
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .enumerate()
            .map(|(i, key)| RankedEntry::new(key.member_id.clone(), offset + i as u64 + 1, key.score))
            .collect()
    }

    /// Contiguous ranks `[max(1, r - radius), r + radius]` around the
    /// member's rank `r`, clipped at the table ends, in ranked order.
    /// None if the member is absent.
    pub fn window(&self, member_id: &str, radius: u64) -> Option<Vec<RankedEntry>> {
        let (rank, _) = self.rank_of(member_id)?;
        let start = if rank > radius { rank - radius } else { 1 };
        let count = rank + radius - start + 1;
        Some(self.top_range(start - 1, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_of(entries: &[(&str, u64, i64)]) -> RankTable {
        let mut table = RankTable::new();
        for &(member, score, tiebreak) in entries {
            table.submit(member, score, tiebreak);
        }
        table
    }

    #[test]
    fn test_first_submit_accepted() {
        let mut table = RankTable::new();
        let outcome = table.submit("alice", 100, 500);
        assert!(outcome.accepted);
        assert_eq!(outcome.previous_score, None);
        assert_eq!(table.rank_of("alice"), Some((1, 100)));
    }

    #[test]
    fn test_lower_submit_is_a_noop() {
        let mut table = RankTable::new();
        table.submit("alice", 100, 500);
        let outcome = table.submit("alice", 50, 499);
        assert!(!outcome.accepted);
        assert_eq!(outcome.previous_score, Some(100));
        assert_eq!(table.rank_of("alice"), Some((1, 100)));
        assert_eq!(table.cardinality(), 1);
    }

    #[test]
    fn test_equal_submit_is_a_noop() {
        let mut table = RankTable::new();
        table.submit("alice", 100, 500);
        let outcome = table.submit("alice", 100, 499);
        assert!(!outcome.accepted);
        assert_eq!(outcome.previous_score, Some(100));
    }

    #[test]
    fn test_higher_submit_replaces_entry() {
        let mut table = RankTable::new();
        table.submit("alice", 100, 500);
        let outcome = table.submit("alice", 250, 499);
        assert!(outcome.accepted);
        assert_eq!(outcome.previous_score, Some(100));
        assert_eq!(table.rank_of("alice"), Some((1, 250)));
        // Old entry must be gone from the ordering too
        assert_eq!(table.cardinality(), 1);
        assert_eq!(table.top_range(0, 10).len(), 1);
    }

    #[test]
    fn test_score_is_max_of_all_submissions() {
        let mut table = RankTable::new();
        let mut tiebreak = 1000;
        for score in [40, 10, 90, 90, 30] {
            table.submit("alice", score, tiebreak);
            tiebreak -= 1;
        }
        assert_eq!(table.rank_of("alice"), Some((1, 90)));
    }

    #[test]
    fn test_equal_scores_rank_more_recent_first() {
        // bob submitted first (larger token), alice after (smaller)
        let table = table_of(&[("bob", 300, 500), ("alice", 300, 499)]);
        let top = table.top_range(0, 2);
        assert_eq!(top[0].member_id, "alice");
        assert_eq!(top[1].member_id, "bob");
        assert_eq!(table.rank_of("alice"), Some((1, 300)));
        assert_eq!(table.rank_of("bob"), Some((2, 300)));
    }

    #[test]
    fn test_rank_counts_strict_predecessors() {
        let table = table_of(&[
            ("a", 500, 900),
            ("b", 400, 900),
            ("c", 300, 900),
            ("d", 200, 900),
            ("e", 100, 900),
        ]);
        for (i, member) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            let (rank, _) = table.rank_of(member).unwrap();
            assert_eq!(rank, i as u64 + 1);
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut table = table_of(&[("alice", 100, 500), ("bob", 200, 500)]);
        assert!(table.remove("alice"));
        assert!(!table.remove("alice"));
        assert_eq!(table.cardinality(), 1);
        assert_eq!(table.rank_of("alice"), None);
        assert_eq!(table.rank_of("bob"), Some((1, 200)));
    }

    #[test]
    fn test_top_range_absolute_ranks() {
        let table = table_of(&[("a", 300, 900), ("b", 200, 900), ("c", 100, 900)]);
        let page = table.top_range(1, 2);
        assert_eq!(page.len(), 2);
        assert_eq!((page[0].rank, page[0].member_id.as_str()), (2, "b"));
        assert_eq!((page[1].rank, page[1].member_id.as_str()), (3, "c"));
    }

    #[test]
    fn test_top_range_offset_past_end_is_empty() {
        let table = table_of(&[("a", 300, 900)]);
        assert!(table.top_range(1, 10).is_empty());
        assert!(table.top_range(50, 10).is_empty());
    }

    #[test]
    fn test_pagination_concatenation() {
        let mut entries = Vec::new();
        for i in 0..20u64 {
            entries.push((format!("m{i}"), 1000 - i, 900i64));
        }
        let mut table = RankTable::new();
        for (member, score, tiebreak) in &entries {
            table.submit(member, *score, *tiebreak);
        }

        let mut paged = table.top_range(0, 7);
        paged.extend(table.top_range(7, 13));
        let whole = table.top_range(0, 20);
        assert_eq!(paged, whole);

        let ranks: Vec<u64> = whole.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (1..=20).collect::<Vec<u64>>());
    }

    #[test]
    fn test_window_around_middle_rank() {
        let table = table_of(&[
            ("a", 500, 900),
            ("b", 400, 900),
            ("x", 300, 900),
            ("d", 200, 900),
            ("e", 100, 900),
        ]);
        let window = table.window("x", 1).unwrap();
        let ranks: Vec<u64> = window.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![2, 3, 4]);
        assert!(window.iter().any(|e| e.member_id == "x"));
    }

    #[test]
    fn test_window_clips_at_top() {
        let table = table_of(&[("a", 500, 900), ("b", 400, 900), ("c", 300, 900)]);
        let window = table.window("a", 2).unwrap();
        let ranks: Vec<u64> = window.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_window_clips_at_bottom() {
        let table = table_of(&[("a", 500, 900), ("b", 400, 900), ("c", 300, 900)]);
        let window = table.window("c", 5).unwrap();
        let ranks: Vec<u64> = window.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_window_completeness() {
        let mut table = RankTable::new();
        for i in 0..9u64 {
            table.submit(&format!("m{i}"), 900 - i, 900);
        }
        // Interior member: full 2r+1 rows
        let window = table.window("m4", 2).unwrap();
        assert_eq!(window.len(), 5);
        assert!(window.iter().any(|e| e.member_id == "m4"));
        // Radius covering the whole table: capped at cardinality
        let window = table.window("m4", 10).unwrap();
        assert_eq!(window.len(), 9);
    }

    #[test]
    fn test_window_unknown_member() {
        let table = table_of(&[("a", 500, 900)]);
        assert!(table.window("nobody", 1).is_none());
    }
}
