//! Property repository — persistence for per-member metadata blobs
//!
//! Blobs are opaque to this layer; the engine decides what is inside
//! them. Keyed by (service_id, member_id), overwritten whole on every
//! set.

use crate::DbResult;
use sqlx::SqlitePool;

/// Repository for per-member property blobs
pub struct PropertyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PropertyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored blob for one member, None if never set
    pub async fn get(&self, service_id: &str, member_id: &str) -> DbResult<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT properties FROM user_properties WHERE service_id = ?1 AND member_id = ?2",
        )
        .bind(service_id)
        .bind(member_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(blob,)| blob))
    }

    /// Blobs for many members, positionally aligned with `member_ids`.
    /// Members without a stored blob come back as None.
    pub async fn batch_get(
        &self,
        service_id: &str,
        member_ids: &[String],
    ) -> DbResult<Vec<Option<String>>> {
        let mut blobs = Vec::with_capacity(member_ids.len());
        for member_id in member_ids {
            blobs.push(self.get(service_id, member_id).await?);
        }
        Ok(blobs)
    }

    /// Insert or replace the member's blob (upsert by primary key)
    pub async fn set(&self, service_id: &str, member_id: &str, properties: &str) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO user_properties (service_id, member_id, properties, updated_at)
               VALUES (?1, ?2, ?3, strftime('%s', 'now'))
               ON CONFLICT(service_id, member_id) DO UPDATE SET
                 properties = excluded.properties,
                 updated_at = strftime('%s', 'now')
            "#,
        )
        .bind(service_id)
        .bind(member_id)
        .bind(properties)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
