use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use sirbot_core::{HandlerError, IncomingMessage, MessageHandler, RuleError};

use crate::context::BotContext;
use crate::handlers::compile;
use crate::message::ResponseDraft;

const TELL_PATTERN: &str = r"^tell (<(#|@)(?P<to_id>[A-Z0-9]*)(|.*)?>) (?P<msg>.*)";

/// `tell <#C123|general> text` or `tell <@U123> text`: relays `text` to a channel or user.
pub struct Tell {
    pattern: Regex,
}

impl Tell {
    pub fn new() -> Result<Self, RuleError> {
        Ok(Self { pattern: compile("tell", TELL_PATTERN)? })
    }

    fn draft(&self, message: &IncomingMessage) -> ResponseDraft {
        let reply = ResponseDraft::reply_to(message);
        let Some(captures) = self.pattern.captures(message.text().unwrap_or_default()) else {
            return reply.text("Sorry I can not understand");
        };

        let to_id = captures.name("to_id").map_or("", |m| m.as_str());
        let text = captures.name("msg").map_or("", |m| m.as_str());
        if to_id.starts_with(['C', 'U']) {
            reply.redirect(to_id).text(text)
        } else {
            reply.text("Sorry I can not understand the destination.")
        }
    }
}

#[async_trait]
impl MessageHandler<BotContext> for Tell {
    async fn handle(
        &self,
        message: Arc<IncomingMessage>,
        ctx: Arc<BotContext>,
    ) -> Result<(), HandlerError> {
        let draft = self.draft(&message);
        ctx.chat.post_message(&draft).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sirbot_core::{IncomingMessage, MessageHandler};

    use super::Tell;
    use crate::handlers::testing::TestBed;

    async fn tell(text: &str) -> (String, Option<String>, Option<String>) {
        let bed = TestBed::new();
        let message = IncomingMessage::new("CADMIN")
            .with_user("UADMIN")
            .with_text(text)
            .with_thread_ts("9.0")
            .mentioning_bot();
        let tell = Tell::new().expect("pattern");
        tell.handle(Arc::new(message), bed.context.clone()).await.expect("tell");

        let posted = bed.chat.posted();
        assert_eq!(posted.len(), 1);
        let draft = posted[0].clone();
        (draft.channel, draft.thread_ts, draft.text)
    }

    #[tokio::test]
    async fn relays_to_a_channel_reference() {
        let (channel, thread, text) = tell("tell <#C123|general> please read the rules").await;
        assert_eq!(channel, "C123");
        assert_eq!(thread, None);
        assert_eq!(text.as_deref(), Some("please read the rules"));
    }

    #[tokio::test]
    async fn relays_to_a_user_reference() {
        let (channel, _, text) = tell("tell <@U42> hi there").await;
        assert_eq!(channel, "U42");
        assert_eq!(text.as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn unknown_destination_kind_is_reported_in_place() {
        let (channel, thread, text) = tell("tell <@W42> hi").await;
        assert_eq!(channel, "CADMIN");
        assert_eq!(thread.as_deref(), Some("9.0"));
        assert_eq!(text.as_deref(), Some("Sorry I can not understand the destination."));
    }

    #[tokio::test]
    async fn unparseable_command_is_reported() {
        let (channel, _, text) = tell("tell everyone hi").await;
        assert_eq!(channel, "CADMIN");
        assert_eq!(text.as_deref(), Some("Sorry I can not understand"));
    }
}
