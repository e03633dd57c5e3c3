//! WindowQuery — rank, neighbor-window, and top-K retrieval
//!
//! Thin orchestration over the registry: argument validation and
//! clamping, NotFound propagation, and opt-in overlay decoration.

use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::overlay::PropertyOverlay;
use crate::registry::LeaderboardEngine;
use crate::table::{DEFAULT_LIMIT, DEFAULT_RADIUS, MAX_LIMIT, MAX_RADIUS};
use crate::types::{BoardKey, RankedEntry};

pub struct WindowQuery<'a> {
    engine: &'a LeaderboardEngine,
}

impl<'a> WindowQuery<'a> {
    pub fn new(engine: &'a LeaderboardEngine) -> Self {
        Self { engine }
    }

    /// Rank and score of one member; NotFound if it holds no entry.
    pub fn rank(&self, key: &BoardKey, member_id: &str) -> EngineResult<RankedEntry> {
        let table = self.engine.table(key).ok_or(EngineError::NotFound)?;
        let (rank, score) = table
            .read()
            .unwrap()
            .rank_of(member_id)
            .ok_or(EngineError::NotFound)?;
        Ok(RankedEntry::new(member_id, rank, score))
    }

    /// Paginated top-K. `limit` defaults to 100 and is capped at 1000;
    /// an explicit non-positive limit or a negative offset is
    /// InvalidArgument. Unknown boards are empty, not errors.
    pub fn top_range(
        &self,
        key: &BoardKey,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> EngineResult<Vec<RankedEntry>> {
        let limit = clamp_limit(limit, DEFAULT_LIMIT, MAX_LIMIT, "limit")?;
        let offset = match offset {
            Some(o) if o < 0 => {
                return Err(EngineError::invalid("offset parameter must not be negative"))
            }
            Some(o) => o as u64,
            None => 0,
        };

        match self.engine.table(key) {
            Some(table) => Ok(table.read().unwrap().top_range(offset, limit)),
            None => Ok(Vec::new()),
        }
    }

    /// Contiguous ranks around one member. `radius` defaults to 1 and
    /// is capped at 10; non-positive is InvalidArgument. NotFound if
    /// the member holds no entry.
    pub fn window(
        &self,
        key: &BoardKey,
        member_id: &str,
        radius: Option<i64>,
    ) -> EngineResult<Vec<RankedEntry>> {
        let radius = clamp_limit(radius, DEFAULT_RADIUS, MAX_RADIUS, "limit")?;
        let table = self.engine.table(key).ok_or(EngineError::NotFound)?;
        let window = table
            .read()
            .unwrap()
            .window(member_id, radius)
            .ok_or(EngineError::NotFound);
        window
    }
}

/// Fill `properties` on each entry from the overlay, positionally.
/// Entries the overlay has nothing for stay undecorated; so do blobs
/// that fail to parse (logged, never fatal to the read).
pub async fn decorate_entries(
    overlay: &dyn PropertyOverlay,
    service_id: &str,
    entries: &mut [RankedEntry],
) -> EngineResult<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let member_ids: Vec<String> = entries.iter().map(|e| e.member_id.clone()).collect();
    let blobs = overlay.batch_get(service_id, &member_ids).await?;

    for (entry, blob) in entries.iter_mut().zip(blobs) {
        let Some(raw) = blob else { continue };
        match serde_json::from_str(&raw) {
            Ok(value) => entry.properties = Some(value),
            Err(e) => warn!(
                service = %service_id,
                member = %entry.member_id,
                error = %e,
                "Skipping unparseable property blob"
            ),
        }
    }
    Ok(())
}

fn clamp_limit(value: Option<i64>, default: u64, max: u64, name: &str) -> EngineResult<u64> {
    match value {
        None => Ok(default),
        Some(v) if v <= 0 => Err(EngineError::invalid(format!(
            "{name} parameter must be a positive value"
        ))),
        Some(v) => Ok((v as u64).min(max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::UpdatePolicy;
    use crate::types::ScorePolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;

    fn key() -> BoardKey {
        BoardKey::new("svc", "weekly")
    }

    fn seeded_engine(count: u64) -> LeaderboardEngine {
        let engine = LeaderboardEngine::new("sekrit");
        {
            let policy = UpdatePolicy::new(&engine, ScorePolicy::Strict);
            for i in 0..count {
                // m0 highest, descending from there
                policy
                    .submit(&key(), &format!("m{i}"), 1000 - i as i64)
                    .unwrap();
            }
        }
        engine
    }

    #[test]
    fn test_rank_not_found() {
        let engine = seeded_engine(3);
        let query = WindowQuery::new(&engine);
        assert!(matches!(
            query.rank(&key(), "nobody"),
            Err(EngineError::NotFound)
        ));
        assert!(matches!(
            query.rank(&BoardKey::new("svc", "other"), "m0"),
            Err(EngineError::NotFound)
        ));
    }

    #[test]
    fn test_top_range_rejects_non_positive_limit() {
        let engine = seeded_engine(3);
        let query = WindowQuery::new(&engine);
        for limit in [0, -1] {
            assert!(matches!(
                query.top_range(&key(), None, Some(limit)),
                Err(EngineError::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            query.top_range(&key(), Some(-1), None),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_top_range_defaults_and_caps() {
        let engine = seeded_engine(5);
        let query = WindowQuery::new(&engine);
        // Default limit is large enough for the whole table here
        assert_eq!(query.top_range(&key(), None, None).unwrap().len(), 5);
        // Oversized limit is clamped, not rejected
        assert_eq!(
            query.top_range(&key(), None, Some(1_000_000)).unwrap().len(),
            5
        );
        // Unknown board reads as empty
        let other = BoardKey::new("svc", "other");
        assert!(query.top_range(&other, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_window_defaults_and_validation() {
        let engine = seeded_engine(5);
        let query = WindowQuery::new(&engine);

        let window = query.window(&key(), "m2", None).unwrap();
        let ranks: Vec<u64> = window.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![2, 3, 4]);

        assert!(matches!(
            query.window(&key(), "m2", Some(0)),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            query.window(&key(), "nobody", None),
            Err(EngineError::NotFound)
        ));
    }

    struct MapOverlay(HashMap<String, String>);

    #[async_trait]
    impl PropertyOverlay for MapOverlay {
        async fn get(&self, _service_id: &str, member_id: &str) -> EngineResult<Option<String>> {
            Ok(self.0.get(member_id).cloned())
        }

        async fn batch_get(
            &self,
            _service_id: &str,
            member_ids: &[String],
        ) -> EngineResult<Vec<Option<String>>> {
            Ok(member_ids.iter().map(|id| self.0.get(id).cloned()).collect())
        }

        async fn set(&self, _service_id: &str, _member_id: &str, _blob: &str) -> EngineResult<()> {
            unimplemented!("read-only test overlay")
        }
    }

    #[tokio::test]
    async fn test_decorate_entries_positional_merge() {
        let mut overlay = HashMap::new();
        overlay.insert("m0".to_string(), r#"{"nickname":"ace"}"#.to_string());
        overlay.insert("m2".to_string(), "not json".to_string());
        let overlay = MapOverlay(overlay);

        let mut entries = vec![
            RankedEntry::new("m0", 1, 1000),
            RankedEntry::new("m1", 2, 999),
            RankedEntry::new("m2", 3, 998),
        ];
        decorate_entries(&overlay, "svc", &mut entries).await.unwrap();

        assert_eq!(entries[0].properties.as_ref().unwrap()["nickname"], "ace");
        assert!(entries[1].properties.is_none());
        // Unparseable blob leaves the entry undecorated
        assert!(entries[2].properties.is_none());
    }
}
