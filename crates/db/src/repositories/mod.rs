use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use sirbot_core::domain::archive::{ArchivedMessage, ChannelRecord, UserRecord};
use sirbot_core::errors::CollaboratorError;

pub mod channel;
pub mod memory;
pub mod message;
pub mod user;

pub use channel::SqlChannelRepository;
pub use memory::{InMemoryChannelRepository, InMemoryMessageRepository, InMemoryUserRepository};
pub use message::SqlMessageRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("row `{0}` already exists")]
    UniqueViolation(String),
}

impl From<RepositoryError> for CollaboratorError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::UniqueViolation(id) => Self::UniquenessViolation(id),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Append-only archive of chat messages keyed by their Slack `ts`.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Fails with [`RepositoryError::UniqueViolation`] when the id was archived before.
    async fn insert(&self, message: &ArchivedMessage) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ArchivedMessage>, RepositoryError>;
}

#[async_trait]
pub trait ChannelRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<ChannelRecord>, RepositoryError>;
    async fn upsert(&self, channel: &ChannelRecord) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, RepositoryError>;
    async fn upsert(&self, user: &UserRecord) -> Result<(), RepositoryError>;
}

pub(crate) fn decode_err(error: impl ToString) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_time(column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{column}: {e}")))
}
