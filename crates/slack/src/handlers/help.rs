use std::sync::Arc;

use sirbot_core::{HandlerError, IncomingMessage};

use crate::context::BotContext;
use crate::message::ResponseDraft;

const COMMANDS: &[(&str, &str)] = &[
    ("hello", "Say hello to Sir Bot-a-lot."),
    ("help", "Show this message."),
    ("tell <#channel|@user> <message>", "Admins only. Relay a message to a channel or user."),
    ("inspect <@user>", "Admins only, in the admin channel. Show a member's profile."),
    ("s$SYMBOL", "Stock quote, for example s$AAPL."),
    ("c$SYMBOL", "Crypto quote against USDT, for example c$BTC."),
    ("g#repo or g#org/repo", "Link a GitHub repository; bare names use the community org."),
];

pub async fn help_message(
    message: Arc<IncomingMessage>,
    ctx: Arc<BotContext>,
) -> Result<(), HandlerError> {
    let draft = ResponseDraft::reply_to(&message).text("Sir Bot-a-lot help").attachment(|help| {
        help.color("good");
        for (command, description) in COMMANDS {
            help.field(*command, *description);
        }
    });
    ctx.chat.post_message(&draft).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sirbot_core::IncomingMessage;

    use super::help_message;
    use crate::handlers::testing::TestBed;

    #[tokio::test]
    async fn lists_commands_in_a_good_attachment() {
        let bed = TestBed::new();
        let message = IncomingMessage::new("C1").with_text("help").mentioning_bot();
        help_message(Arc::new(message), bed.context.clone()).await.expect("help");

        let posted = bed.chat.posted();
        assert_eq!(posted[0].text.as_deref(), Some("Sir Bot-a-lot help"));
        let attachment = &posted[0].attachments[0];
        assert_eq!(attachment.color.as_deref(), Some("good"));
        assert!(attachment.field("s$SYMBOL").is_some());
        assert!(attachment.field("hello").is_some());
    }
}
