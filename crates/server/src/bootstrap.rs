use std::sync::Arc;
use std::time::Duration;

use sirbot_core::config::{AppConfig, ConfigError};
use sirbot_core::{BotIdentity, Dispatcher, HandlerRegistry, RuleError};
use sirbot_db::{connect_with_settings, migrations, DbPool};
use sirbot_slack::{
    register_all, Archive, BotContext, BotSettings, HttpLinkChecker, NoopSocketTransport,
    ReconnectPolicy, SlackWebClient, SocketModeRunner,
};
use sirbot_stocks::IexClient;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub rule_count: usize,
    pub slack_runner: SocketModeRunner<BotContext>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("failed to build {client} http client: {source}")]
    HttpClient {
        client: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("handler registration failed: {0}")]
    Rules(#[from] RuleError),
}

fn http_client(client: &'static str) -> impl FnOnce(reqwest::Error) -> BootstrapError {
    move |source| BootstrapError::HttpClient { client, source }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let chat = SlackWebClient::from_config(&config.slack).map_err(http_client("slack"))?;
    let quotes = IexClient::from_config(&config.quotes).map_err(http_client("quotes"))?;
    let links = HttpLinkChecker::new(Duration::from_secs(config.links.timeout_secs))
        .map_err(http_client("links"))?;

    let identity = Arc::new(BotIdentity::new(
        config.slack.bot_user_id.clone(),
        config.slack.admins.iter().cloned(),
    ));
    let context = Arc::new(BotContext {
        chat: Arc::new(chat),
        quotes: Arc::new(quotes),
        links: Arc::new(links),
        archive: Some(Archive::sql(db_pool.clone())),
        identity: Arc::clone(&identity),
        settings: BotSettings::from_config(&config),
    });

    let registry = Arc::new(HandlerRegistry::new());
    register_all(&registry)?;
    let rule_count = registry.len();
    info!(
        event_name = "system.bootstrap.handlers_registered",
        correlation_id = "bootstrap",
        rules = rule_count,
        admins = identity.admin_count(),
        "handler set registered"
    );

    let dispatcher = Dispatcher::new(registry, identity, context);
    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, rule_count, slack_runner })
}
