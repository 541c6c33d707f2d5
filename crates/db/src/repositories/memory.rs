use std::collections::HashMap;

use tokio::sync::RwLock;

use sirbot_core::domain::archive::{ArchivedMessage, ChannelRecord, UserRecord};

use super::{ChannelRepository, MessageRepository, RepositoryError, UserRepository};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<HashMap<String, ArchivedMessage>>,
}

impl InMemoryMessageRepository {
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &ArchivedMessage) -> Result<(), RepositoryError> {
        let mut messages = self.messages.write().await;
        if messages.contains_key(&message.id) {
            return Err(RepositoryError::UniqueViolation(message.id.clone()));
        }
        messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ArchivedMessage>, RepositoryError> {
        let messages = self.messages.read().await;
        Ok(messages.get(id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryChannelRepository {
    channels: RwLock<HashMap<String, ChannelRecord>>,
}

#[async_trait::async_trait]
impl ChannelRepository for InMemoryChannelRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ChannelRecord>, RepositoryError> {
        let channels = self.channels.read().await;
        Ok(channels.get(id).cloned())
    }

    async fn upsert(&self, channel: &ChannelRecord) -> Result<(), RepositoryError> {
        let mut channels = self.channels.write().await;
        channels.insert(channel.id.clone(), channel.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, UserRecord>>,
}

#[async_trait::async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn upsert(&self, user: &UserRecord) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        users
            .entry(user.id.clone())
            .and_modify(|existing| existing.raw = user.raw.clone())
            .or_insert_with(|| user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use sirbot_core::domain::archive::{ArchivedMessage, ChannelRecord};

    use crate::repositories::{
        ChannelRepository, InMemoryChannelRepository, InMemoryMessageRepository,
        MessageRepository, RepositoryError,
    };

    #[tokio::test]
    async fn in_memory_messages_reject_duplicates_like_sql() {
        let repo = InMemoryMessageRepository::default();
        let message = ArchivedMessage {
            id: "1.1".to_owned(),
            text: None,
            user: None,
            channel: "C1".to_owned(),
            raw: json!({}),
            time: Utc::now(),
        };

        repo.insert(&message).await.expect("first insert");
        let error = repo.insert(&message).await.expect_err("duplicate");

        assert!(matches!(error, RepositoryError::UniqueViolation(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn in_memory_channel_round_trip() {
        let repo = InMemoryChannelRepository::default();
        let record = ChannelRecord::new("C1", json!({"topic": {"value": "rust"}}));

        repo.upsert(&record).await.expect("save");
        let found = repo.find_by_id("C1").await.expect("find");

        assert_eq!(found, Some(record));
    }
}
