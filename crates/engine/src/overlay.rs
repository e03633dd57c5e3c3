//! PropertyOverlay — collaborator contract for per-member metadata
//!
//! The overlay lives outside any leaderboard: blobs are keyed by
//! (service, member) and survive entry removal. Read paths consult it
//! only when the caller opts in; `set` is a full overwrite, never a
//! merge.

use async_trait::async_trait;

use persistence::repository::properties::PropertyRepository;
use persistence::SqlitePool;

use crate::error::EngineResult;

#[async_trait]
pub trait PropertyOverlay: Send + Sync {
    /// Stored blob for one member, None if nothing was ever set
    async fn get(&self, service_id: &str, member_id: &str) -> EngineResult<Option<String>>;

    /// Blobs for many members, positionally aligned with the input,
    /// None for members without a stored blob.
    async fn batch_get(
        &self,
        service_id: &str,
        member_ids: &[String],
    ) -> EngineResult<Vec<Option<String>>>;

    /// Full overwrite of the member's blob
    async fn set(&self, service_id: &str, member_id: &str, blob: &str) -> EngineResult<()>;
}

/// SQLite-backed overlay over the persistence crate's property store
pub struct SqliteOverlay {
    pool: SqlitePool,
}

impl SqliteOverlay {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PropertyOverlay for SqliteOverlay {
    async fn get(&self, service_id: &str, member_id: &str) -> EngineResult<Option<String>> {
        let repo = PropertyRepository::new(&self.pool);
        Ok(repo.get(service_id, member_id).await?)
    }

    async fn batch_get(
        &self,
        service_id: &str,
        member_ids: &[String],
    ) -> EngineResult<Vec<Option<String>>> {
        let repo = PropertyRepository::new(&self.pool);
        Ok(repo.batch_get(service_id, member_ids).await?)
    }

    async fn set(&self, service_id: &str, member_id: &str, blob: &str) -> EngineResult<()> {
        let repo = PropertyRepository::new(&self.pool);
        Ok(repo.set(service_id, member_id, blob).await?)
    }
}
