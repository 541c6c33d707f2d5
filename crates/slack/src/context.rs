use std::sync::Arc;

use sirbot_core::config::AppConfig;
use sirbot_core::BotIdentity;
use sirbot_db::{
    ChannelRepository, DbPool, InMemoryChannelRepository, InMemoryMessageRepository,
    InMemoryUserRepository, MessageRepository, SqlChannelRepository, SqlMessageRepository,
    SqlUserRepository, UserRepository,
};
use sirbot_stocks::QuoteApi;

use crate::api::ChatApi;
use crate::links::LinkChecker;

/// Message, channel and user stores.
#[derive(Clone)]
pub struct Archive {
    pub messages: Arc<dyn MessageRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Archive {
    pub fn sql(pool: DbPool) -> Self {
        Self {
            messages: Arc::new(SqlMessageRepository::new(pool.clone())),
            channels: Arc::new(SqlChannelRepository::new(pool.clone())),
            users: Arc::new(SqlUserRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            messages: Arc::new(InMemoryMessageRepository::default()),
            channels: Arc::new(InMemoryChannelRepository::default()),
            users: Arc::new(InMemoryUserRepository::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotSettings {
    pub admin_channel: String,
    pub github_default_org: String,
}

impl BotSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            admin_channel: config.slack.admin_channel.clone(),
            github_default_org: config.links.github_default_org.clone(),
        }
    }
}

/// Everything a handler may touch. Shared read-only across every dispatch.
pub struct BotContext {
    pub chat: Arc<dyn ChatApi>,
    pub quotes: Arc<dyn QuoteApi>,
    pub links: Arc<dyn LinkChecker>,
    /// `None` runs the bot without persistence; archiving handlers become no-ops.
    pub archive: Option<Archive>,
    pub identity: Arc<BotIdentity>,
    pub settings: BotSettings,
}
