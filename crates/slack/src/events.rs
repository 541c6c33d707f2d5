use serde_json::{Map, Value};

use sirbot_core::{BotIdentity, IncomingMessage};

#[derive(Clone, Debug, PartialEq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

impl SlackEnvelope {
    /// Decodes a Socket Mode frame. Frames without an `envelope_id` (hello, disconnect)
    /// need no acknowledgement and yield `None`.
    pub fn from_socket_frame(frame: &Value, identity: &BotIdentity) -> Option<Self> {
        let envelope_id = frame.get("envelope_id")?.as_str()?.to_owned();
        let event = match frame.get("payload").and_then(|payload| payload.get("event")) {
            Some(event) => parse_event(event, identity),
            None => SlackEvent::Unsupported {
                event_type: frame
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_owned(),
            },
        };
        Some(Self { envelope_id, event })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlackEvent {
    Message(IncomingMessage),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::Unsupported { event_type } => event_type,
        }
    }
}

/// Turns a raw Events API `event` object into an [`IncomingMessage`].
///
/// `mentions_bot` is set when the text contains `<@BOT>` or the message arrived in a direct
/// message channel, and never for messages the bot (or any bot integration) wrote itself.
/// The mention is removed from the text so command patterns such as `^help` see `help ...`;
/// a bare mention keeps its original text. The untouched event is kept as the raw payload.
pub fn parse_event(raw: &Value, identity: &BotIdentity) -> SlackEvent {
    let event_type = raw.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let channel = raw.get("channel").and_then(Value::as_str);
    let (Some(channel), "message") = (channel, event_type) else {
        return SlackEvent::Unsupported { event_type: event_type.to_owned() };
    };

    let user = string_field(raw, "user");
    let text = string_field(raw, "text");
    let token = identity.mention_token();
    let mentioned = !identity.bot_user_id().is_empty()
        && text.as_deref().is_some_and(|text| text.contains(&token));
    let direct = channel.starts_with('D');
    let from_bot = raw.get("bot_id").is_some_and(|bot_id| !bot_id.is_null())
        || user.as_deref().is_some_and(|user| user == identity.bot_user_id());

    let text = match text {
        Some(text) if mentioned => Some(strip_mention(&text, &token)),
        other => other,
    };

    let raw_map = match raw {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    SlackEvent::Message(IncomingMessage {
        channel: channel.to_owned(),
        user,
        text,
        ts: string_field(raw, "ts"),
        thread_ts: string_field(raw, "thread_ts"),
        subtype: string_field(raw, "subtype"),
        mentions_bot: (mentioned || direct) && !from_bot,
        raw: raw_map,
    })
}

fn strip_mention(text: &str, token: &str) -> String {
    let stripped = text.replace(token, " ");
    match stripped.trim() {
        "" => text.to_owned(),
        rest => rest.to_owned(),
    }
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use sirbot_core::BotIdentity;

    use super::{parse_event, SlackEnvelope, SlackEvent};

    fn identity() -> BotIdentity {
        BotIdentity::new("UBOT", ["UADMIN"])
    }

    fn message(event: SlackEvent) -> sirbot_core::IncomingMessage {
        match event {
            SlackEvent::Message(message) => message,
            other => panic!("expected message, got {other:?}"),
        }
    }

    #[test]
    fn mention_is_detected_and_stripped() {
        let event = json!({
            "type": "message",
            "channel": "C1",
            "user": "U1",
            "text": "<@UBOT> help me",
            "ts": "1730000000.000100"
        });

        let parsed = message(parse_event(&event, &identity()));
        assert!(parsed.mentions_bot);
        assert_eq!(parsed.text(), Some("help me"));
        assert_eq!(parsed.user(), Some("U1"));
        assert_eq!(parsed.raw_str("text"), Some("<@UBOT> help me"));
    }

    #[test]
    fn other_user_mentions_are_left_alone() {
        let event = json!({
            "type": "message",
            "channel": "C1",
            "user": "UADMIN",
            "text": "<@UBOT> tell <@U2> hi"
        });

        let parsed = message(parse_event(&event, &identity()));
        assert_eq!(parsed.text(), Some("tell <@U2> hi"));
    }

    #[test]
    fn direct_messages_count_as_mentions() {
        let event = json!({"type": "message", "channel": "D42", "user": "U1", "text": "hello"});
        let parsed = message(parse_event(&event, &identity()));

        assert!(parsed.mentions_bot);
        assert_eq!(parsed.text(), Some("hello"));
    }

    #[test]
    fn bot_authored_messages_never_mention_the_bot() {
        let echo = json!({
            "type": "message",
            "channel": "D42",
            "user": "UBOT",
            "bot_id": "B1",
            "text": "Hello <@UBOT>"
        });
        let parsed = message(parse_event(&echo, &identity()));
        assert!(!parsed.mentions_bot);

        let integration =
            json!({"type": "message", "channel": "C1", "bot_id": "B9", "text": "<@UBOT> hi"});
        assert!(!message(parse_event(&integration, &identity())).mentions_bot);
    }

    #[test]
    fn bare_mention_keeps_its_text() {
        let event = json!({"type": "message", "channel": "C1", "user": "U1", "text": "<@UBOT>"});
        let parsed = message(parse_event(&event, &identity()));

        assert!(parsed.mentions_bot);
        assert_eq!(parsed.text(), Some("<@UBOT>"));
    }

    #[test]
    fn plain_channel_message_is_not_a_mention() {
        let event = json!({"type": "message", "channel": "C1", "user": "U1", "text": "s$AAPL"});
        assert!(!message(parse_event(&event, &identity())).mentions_bot);
    }

    #[test]
    fn subtype_and_thread_are_copied() {
        let event = json!({
            "type": "message",
            "subtype": "channel_topic",
            "channel": "C1",
            "user": "U1",
            "topic": "new topic",
            "thread_ts": "1.0"
        });

        let parsed = message(parse_event(&event, &identity()));
        assert_eq!(parsed.subtype.as_deref(), Some("channel_topic"));
        assert_eq!(parsed.thread_ts.as_deref(), Some("1.0"));
        assert_eq!(parsed.raw_str("topic"), Some("new topic"));
    }

    #[test]
    fn non_message_events_are_unsupported() {
        let event = json!({"type": "reaction_added", "user": "U1"});
        assert_eq!(
            parse_event(&event, &identity()),
            SlackEvent::Unsupported { event_type: "reaction_added".to_owned() }
        );

        let channelless = json!({"type": "message", "text": "hi"});
        assert_eq!(parse_event(&channelless, &identity()).event_type(), "message");
        assert!(matches!(parse_event(&channelless, &identity()), SlackEvent::Unsupported { .. }));
    }

    #[test]
    fn socket_frames_are_unwrapped() {
        let frame = json!({
            "envelope_id": "env-1",
            "type": "events_api",
            "payload": {"event": {"type": "message", "channel": "C1", "text": "hi"}}
        });
        let envelope = SlackEnvelope::from_socket_frame(&frame, &identity()).expect("envelope");
        assert_eq!(envelope.envelope_id, "env-1");
        assert_eq!(envelope.event.event_type(), "message");

        let hello = json!({"type": "hello"});
        assert!(SlackEnvelope::from_socket_frame(&hello, &identity()).is_none());

        let interactive = json!({"envelope_id": "env-2", "type": "interactive", "payload": {}});
        assert_eq!(
            SlackEnvelope::from_socket_frame(&interactive, &identity()).expect("envelope").event,
            SlackEvent::Unsupported { event_type: "interactive".to_owned() }
        );
    }
}
