use sqlx::Row;

use sirbot_core::domain::archive::ChannelRecord;

use super::{decode_err, parse_time, ChannelRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChannelRepository {
    pool: DbPool,
}

impl SqlChannelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChannelRepository for SqlChannelRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ChannelRecord>, RepositoryError> {
        let row = sqlx::query("SELECT id, raw, updated_at FROM slack_channels WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("raw").map_err(decode_err)?;
        let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;
        Ok(Some(ChannelRecord {
            id: row.try_get("id").map_err(decode_err)?,
            raw: serde_json::from_str(&raw).map_err(decode_err)?,
            updated_at: parse_time("updated_at", &updated_at)?,
        }))
    }

    async fn upsert(&self, channel: &ChannelRecord) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(&channel.raw).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO slack_channels (id, raw, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 raw = excluded.raw,
                 updated_at = excluded.updated_at",
        )
        .bind(&channel.id)
        .bind(raw)
        .bind(channel.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
