use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use sirbot_core::{CollaboratorError, HandlerError, IncomingMessage, MessageHandler, RuleError};

use crate::context::BotContext;
use crate::handlers::compile;
use crate::message::ResponseDraft;

const TARGET_PATTERN: &str = r"<@([A-Z0-9]+)";

/// `inspect <@U123>` in the admin channel: dumps what is known about a member, preferring the
/// archived profile over a live `users.info` lookup.
pub struct Inspect {
    target: Regex,
}

impl Inspect {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self { target: compile("inspect", TARGET_PATTERN)? })
    }

    fn target<'a>(&self, text: &'a str) -> Option<&'a str> {
        Some(self.target.captures(text)?.get(1)?.as_str())
    }
}

#[async_trait]
impl MessageHandler<BotContext> for Inspect {
    async fn handle(
        &self,
        message: Arc<IncomingMessage>,
        ctx: Arc<BotContext>,
    ) -> Result<(), HandlerError> {
        if message.channel != ctx.settings.admin_channel {
            debug!(
                event_name = "handler.inspect.wrong_channel",
                channel = %message.channel,
                "inspect outside admin channel"
            );
            return Ok(());
        }
        let Some(text) = message.text() else {
            return Ok(());
        };

        let reply = ResponseDraft::reply_to(&message);
        let Some(user_id) = self.target(text) else {
            let draft = reply.text("Sorry I couldn't figure out which user to inspect");
            ctx.chat.post_message(&draft).await?;
            return Ok(());
        };

        let stored = match &ctx.archive {
            Some(archive) => {
                archive.users.find_by_id(user_id).await.map_err(CollaboratorError::from)?
            }
            None => None,
        };
        let profile = match stored {
            Some(record) => record.profile(),
            None => match ctx.chat.users_info(user_id).await {
                Ok(user) => user,
                Err(error) if error.is_not_found() || error.is_unavailable() => {
                    warn!(
                        event_name = "handler.inspect.lookup_failed",
                        user_id,
                        error = %error,
                        "user lookup failed"
                    );
                    let draft = reply.text(format!(
                        "Unable to retrieve profile information for <@{user_id}>"
                    ));
                    ctx.chat.post_message(&draft).await?;
                    return Ok(());
                }
                Err(error) => return Err(error.into()),
            },
        };

        let pretty = serde_json::to_string_pretty(&profile)
            .map_err(|error| HandlerError::Execution(error.to_string()))?;
        let draft = reply.text(format!("<@{user_id}> profile information \n```{pretty}```"));
        ctx.chat.post_message(&draft).await?;
        Ok(())
    }
}
