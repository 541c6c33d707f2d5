mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use bootstrap::Application;
use sirbot_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let Application { config, db_pool, rule_count, slack_runner } =
        bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &config.server.bind_address,
        config.server.health_check_port,
        db_pool.clone(),
    )
    .await?;

    let runner = tokio::spawn(async move { slack_runner.start().await });
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        rules = rule_count,
        "sirbot-server started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "sirbot-server stopping"
    );

    let grace = Duration::from_secs(config.server.graceful_shutdown_secs);
    if tokio::time::timeout(grace, runner).await.is_err() {
        tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "socket runner did not stop within the grace period"
        );
    }
    db_pool.close().await;
    Ok(())
}
