use std::sync::Arc;

use tracing::debug;

use sirbot_core::{ArchivedMessage, CollaboratorError, HandlerError, IncomingMessage};

use crate::context::BotContext;

/// Archives every message. Without a configured store this is a no-op; a message that was
/// already archived (Slack re-delivers) is skipped.
pub async fn save_in_database(
    message: Arc<IncomingMessage>,
    ctx: Arc<BotContext>,
) -> Result<(), HandlerError> {
    let Some(archive) = &ctx.archive else {
        return Ok(());
    };
    // Some Slack events arrive without a ts; there is nothing to key them by.
    let Some(ts) = message.ts.as_deref().filter(|ts| !ts.is_empty()) else {
        debug!(
            event_name = "handler.archive.skipped",
            channel = %message.channel,
            "message without ts"
        );
        return Ok(());
    };
    let record = ArchivedMessage::from_message(&message, ts)
        .ok_or_else(|| HandlerError::Precondition(format!("unusable message ts `{ts}`")))?;

    debug!(
        event_name = "handler.archive.saving",
        ts,
        channel = %message.channel,
        "saving message"
    );
    match archive.messages.insert(&record).await.map_err(CollaboratorError::from) {
        Ok(()) => Ok(()),
        Err(CollaboratorError::UniquenessViolation(_)) => {
            debug!(
                event_name = "handler.archive.duplicate",
                ts,
                "message already archived"
            );
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Map, Value};

    use sirbot_core::IncomingMessage;

    use super::save_in_database;
    use crate::handlers::testing::TestBed;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test]
    async fn stores_message_with_raw_payload_and_second_resolution_time() {
        let bed = TestBed::new();
        let message = IncomingMessage::new("C1")
            .with_user("U1")
            .with_text("hello world")
            .with_ts("1730000000.000200")
            .with_raw(raw(json!({"type": "message", "text": "hello world", "client_msg_id": "x"})));

        save_in_database(Arc::new(message), bed.context.clone()).await.expect("saved");

        let stored = bed
            .archive
            .messages
            .find_by_id("1730000000.000200")
            .await
            .expect("lookup")
            .expect("row");
        assert_eq!(stored.text.as_deref(), Some("hello world"));
        assert_eq!(stored.user.as_deref(), Some("U1"));
        assert_eq!(stored.raw["client_msg_id"], "x");
        assert_eq!(stored.time.timestamp(), 1_730_000_000);
    }

    #[tokio::test]
    async fn redelivery_is_absorbed() {
        let bed = TestBed::new();
        let message =
            Arc::new(IncomingMessage::new("C1").with_text("twice").with_ts("1730000000.1"));

        save_in_database(message.clone(), bed.context.clone()).await.expect("first");
        save_in_database(message, bed.context.clone()).await.expect("duplicate is benign");
    }

    #[tokio::test]
    async fn missing_ts_or_store_is_a_no_op() {
        let bed = TestBed::new();
        let without_ts = Arc::new(IncomingMessage::new("C1").with_text("no ts"));
        save_in_database(without_ts, bed.context.clone()).await.expect("skipped");

        let message = Arc::new(IncomingMessage::new("C1").with_text("x").with_ts("1730000000.5"));
        save_in_database(message, bed.without_archive()).await.expect("no store");
        assert!(bed.archive.messages.find_by_id("1730000000.5").await.expect("lookup").is_none());
    }
}
