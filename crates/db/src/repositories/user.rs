use sqlx::Row;

use sirbot_core::domain::archive::UserRecord;

use super::{decode_err, parse_time, RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query("SELECT id, raw, join_date FROM slack_users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("raw").map_err(decode_err)?;
        let join_date: String = row.try_get("join_date").map_err(decode_err)?;
        Ok(Some(UserRecord {
            id: row.try_get("id").map_err(decode_err)?,
            raw: serde_json::from_str(&raw).map_err(decode_err)?,
            join_date: parse_time("join_date", &join_date)?,
        }))
    }

    async fn upsert(&self, user: &UserRecord) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(&user.raw).map_err(decode_err)?;

        // join_date is first-seen and never moves forward.
        sqlx::query(
            "INSERT INTO slack_users (id, raw, join_date)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET raw = excluded.raw",
        )
        .bind(&user.id)
        .bind(raw)
        .bind(user.join_date.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
