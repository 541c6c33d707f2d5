use std::sync::Arc;

use tracing::debug;

use sirbot_core::{CollaboratorError, HandlerError, IncomingMessage};

use crate::context::BotContext;

const REACTION: &str = "sirbot";

/// Reacts to every message that mentions the bot, except the bot's own.
pub async fn mention(
    message: Arc<IncomingMessage>,
    ctx: Arc<BotContext>,
) -> Result<(), HandlerError> {
    if message.user().is_some_and(|user| ctx.identity.is_bot(user)) {
        return Ok(());
    }
    let ts = message
        .ts
        .as_deref()
        .ok_or_else(|| HandlerError::Precondition("reaction needs a message ts".to_owned()))?;

    match ctx.chat.add_reaction(&message.channel, ts, REACTION).await {
        Ok(()) => Ok(()),
        Err(CollaboratorError::AlreadyDone(code)) => {
            debug!(
                event_name = "handler.mention.already_reacted",
                channel = %message.channel,
                ts,
                code = %code,
                "reaction already present"
            );
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sirbot_core::{CollaboratorError, HandlerError, IncomingMessage};

    use super::mention;
    use crate::api::InMemoryChatApi;
    use crate::handlers::testing::TestBed;

    fn mentioned(user: &str) -> Arc<IncomingMessage> {
        Arc::new(
            IncomingMessage::new("C1")
                .with_user(user)
                .with_text("nice bot")
                .with_ts("1730000000.000100")
                .mentioning_bot(),
        )
    }

    #[tokio::test]
    async fn adds_the_sirbot_reaction() {
        let bed = TestBed::new();
        mention(mentioned("U1"), bed.context.clone()).await.expect("reaction");

        let reactions = bed.chat.reactions();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].name, "sirbot");
        assert_eq!(reactions[0].channel, "C1");
        assert_eq!(reactions[0].timestamp, "1730000000.000100");
    }

    #[tokio::test]
    async fn own_messages_are_ignored() {
        let bed = TestBed::new();
        mention(mentioned("UBOT"), bed.context.clone()).await.expect("skipped");
        assert!(bed.chat.reactions().is_empty());
    }

    #[tokio::test]
    async fn already_reacted_counts_as_success() {
        let bed = TestBed::with_chat(
            InMemoryChatApi::new()
                .with_reaction_error(CollaboratorError::AlreadyDone("already_reacted".to_owned())),
        );
        mention(mentioned("U1"), bed.context.clone()).await.expect("benign");
    }

    #[tokio::test]
    async fn other_reaction_errors_fail_the_handler() {
        let rejected = CollaboratorError::Api("invalid_name".to_owned());
        let bed =
            TestBed::with_chat(InMemoryChatApi::new().with_reaction_error(rejected.clone()));
        let error = mention(mentioned("U1"), bed.context.clone()).await.expect_err("api error");
        assert_eq!(error, HandlerError::Collaborator(rejected));
    }
}
