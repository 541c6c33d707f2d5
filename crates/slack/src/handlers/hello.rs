use std::sync::Arc;

use sirbot_core::{HandlerError, IncomingMessage};

use crate::context::BotContext;
use crate::message::ResponseDraft;

pub async fn hello(
    message: Arc<IncomingMessage>,
    ctx: Arc<BotContext>,
) -> Result<(), HandlerError> {
    let user = message
        .user()
        .ok_or_else(|| HandlerError::Precondition("greeting needs an author".to_owned()))?;

    let draft = ResponseDraft::reply_to(&message).text(format!("Hello <@{user}>"));
    ctx.chat.post_message(&draft).await?;
    Ok(())
}
