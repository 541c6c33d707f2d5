use std::sync::Arc;

use tracing::{debug, warn};

use sirbot_core::{HandlerError, IncomingMessage};

use crate::context::BotContext;
use crate::message::ResponseDraft;

/// Posts a GitHub link for every `g#repo` / `g#org/repo` reference that resolves.
pub async fn github_repo_link(
    message: Arc<IncomingMessage>,
    ctx: Arc<BotContext>,
) -> Result<(), HandlerError> {
    let Some(text) = message.text() else {
        return Ok(());
    };

    for repo in repo_references(text, &ctx.settings.github_default_org) {
        let url = format!("https://github.com/{repo}");
        match ctx.links.exists(&url).await {
            Ok(true) => {
                let draft = ResponseDraft::reply_to(&message).text(url);
                ctx.chat.post_message(&draft).await?;
            }
            Ok(false) => {
                debug!(
                    event_name = "handler.github.missing",
                    url = %url,
                    "repository not found"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "handler.github.check_failed",
                    url = %url,
                    error = %error,
                    "link check failed"
                );
            }
        }
    }
    Ok(())
}

/// The word following each `g#`, qualified with `default_org` when it names no owner.
pub(crate) fn repo_references(text: &str, default_org: &str) -> Vec<String> {
    text.split("g#")
        .skip(1)
        .filter_map(|rest| rest.split_whitespace().next())
        .map(|repo| {
            if repo.contains('/') {
                repo.to_owned()
            } else {
                format!("{default_org}/{repo}")
            }
        })
        .collect()
}
