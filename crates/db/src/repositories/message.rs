use sqlx::Row;

use sirbot_core::domain::archive::ArchivedMessage;

use super::{decode_err, parse_time, MessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMessageRepository {
    pool: DbPool,
}

impl SqlMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<ArchivedMessage, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let text: Option<String> = row.try_get("text").map_err(decode_err)?;
    let user: Option<String> = row.try_get("user").map_err(decode_err)?;
    let channel: String = row.try_get("channel").map_err(decode_err)?;
    let raw: String = row.try_get("raw").map_err(decode_err)?;
    let time: String = row.try_get("time").map_err(decode_err)?;

    Ok(ArchivedMessage {
        id,
        text,
        user,
        channel,
        raw: serde_json::from_str(&raw).map_err(decode_err)?,
        time: parse_time("time", &time)?,
    })
}

#[async_trait::async_trait]
impl MessageRepository for SqlMessageRepository {
    async fn insert(&self, message: &ArchivedMessage) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(&message.raw).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO slack_messages (id, text, user, channel, raw, time)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(&message.text)
        .bind(&message.user)
        .bind(&message.channel)
        .bind(raw)
        .bind(message.time.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::UniqueViolation(message.id.clone())
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArchivedMessage>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, text, user, channel, raw, time FROM slack_messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_message).transpose()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use sirbot_core::domain::archive::{time_from_ts, ArchivedMessage};

    use super::SqlMessageRepository;
    use crate::repositories::{MessageRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> SqlMessageRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlMessageRepository::new(pool)
    }

    fn archived(id: &str) -> ArchivedMessage {
        ArchivedMessage {
            id: id.to_owned(),
            text: Some("hello there".to_owned()),
            user: Some("U1".to_owned()),
            channel: "C1".to_owned(),
            raw: json!({"channel": "C1", "user": "U1", "text": "hello there", "ts": id}),
            time: time_from_ts(id).expect("valid ts"),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let repo = setup().await;
        let message = archived("1730000000.000100");

        repo.insert(&message).await.expect("insert");
        let found = repo.find_by_id(&message.id).await.expect("find");

        assert_eq!(found, Some(message));
    }

    #[tokio::test]
    async fn second_insert_of_same_id_is_a_unique_violation() {
        let repo = setup().await;
        let message = archived("1730000000.000200");

        repo.insert(&message).await.expect("first insert");
        let error = repo.insert(&message).await.expect_err("duplicate insert");

        assert!(matches!(error, RepositoryError::UniqueViolation(ref id) if id == &message.id));
        assert!(repo.find_by_id(&message.id).await.expect("find").is_some());
    }

    #[tokio::test]
    async fn message_without_text_or_user_is_stored() {
        let repo = setup().await;
        let mut message = archived("1730000000.000300");
        message.text = None;
        message.user = None;

        repo.insert(&message).await.expect("insert");
        let found = repo.find_by_id(&message.id).await.expect("find").expect("row");
        assert_eq!(found.text, None);
        assert_eq!(found.user, None);
    }

    #[tokio::test]
    async fn missing_id_returns_none() {
        let repo = setup().await;
        assert_eq!(repo.find_by_id("0.0").await.expect("find"), None);
    }
}
