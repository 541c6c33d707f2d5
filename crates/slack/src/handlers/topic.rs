use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use sirbot_core::{CollaboratorError, HandlerError, IncomingMessage};

use crate::context::BotContext;
use crate::message::{Action, ButtonStyle, ResponseDraft};

const TOPIC_NOT_FOUND: &str = "Original topic not found";

/// Reports topic changes made by regular members to the admin channel.
///
/// When the channel is known to the archive the notice carries Validate/Revert buttons, and the
/// stored topic is moved forward so the next change reports against this one.
pub async fn channel_topic(
    message: Arc<IncomingMessage>,
    ctx: Arc<BotContext>,
) -> Result<(), HandlerError> {
    let Some(user) = message.user() else {
        debug!(
            event_name = "handler.topic.skipped",
            channel = %message.channel,
            "topic change without author"
        );
        return Ok(());
    };
    if ctx.identity.is_admin(user) || ctx.identity.is_bot(user) {
        return Ok(());
    }

    let channel = message.channel.as_str();
    let new_topic = message.raw_str("topic").unwrap_or_default();
    let stored = match &ctx.archive {
        Some(archive) => {
            archive.channels.find_by_id(channel).await.map_err(CollaboratorError::from)?
        }
        None => None,
    };
    let old_topic = stored.as_ref().and_then(|record| record.topic()).unwrap_or(TOPIC_NOT_FOUND);

    let draft = ResponseDraft::to_channel(&ctx.settings.admin_channel).attachment(|notice| {
        notice
            .fallback("Channel topic changed notice: old topic")
            .title(format!("<@{user}> changed <#{channel}> topic."))
            .field("Previous topic", old_topic)
            .field("New topic", new_topic);
        if stored.is_some() {
            let revert = json!({ "channel": channel, "old_topic": old_topic }).to_string();
            notice
                .callback_id("topic_change")
                .action(Action::button("validate", "Validate").style(ButtonStyle::Primary))
                .action(
                    Action::button("revert", "Revert").style(ButtonStyle::Danger).value(revert),
                );
        }
    });
    ctx.chat.post_message(&draft).await?;

    if let (Some(archive), Some(record)) = (&ctx.archive, &stored) {
        archive
            .channels
            .upsert(&record.with_topic(new_topic))
            .await
            .map_err(CollaboratorError::from)?;
    }
    Ok(())
}
