use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::message::IncomingMessage;

/// One archived chat message, keyed by the Slack timestamp that uniquely identifies it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchivedMessage {
    pub id: String,
    pub text: Option<String>,
    pub user: Option<String>,
    pub channel: String,
    pub raw: Value,
    pub time: DateTime<Utc>,
}

impl ArchivedMessage {
    /// Returns `None` when the timestamp carries no usable seconds part.
    ///
    /// The text is archived as sent, before any mention stripping.
    pub fn from_message(message: &IncomingMessage, ts: &str) -> Option<Self> {
        let text = message.raw_str("text").map(str::to_owned).or_else(|| message.text.clone());
        Some(Self {
            id: ts.to_owned(),
            text,
            user: message.user.clone(),
            channel: message.channel.clone(),
            raw: message.raw_value(),
            time: time_from_ts(ts)?,
        })
    }
}

/// Wall-clock time of a Slack `ts` such as `1730000000.000200` (fraction dropped).
pub fn time_from_ts(ts: &str) -> Option<DateTime<Utc>> {
    let seconds = ts.split('.').next()?.parse::<i64>().ok()?;
    DateTime::from_timestamp(seconds, 0)
}

/// Last known channel metadata as Slack reported it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: String,
    pub raw: Value,
    pub updated_at: DateTime<Utc>,
}

impl ChannelRecord {
    pub fn new(id: impl Into<String>, raw: Value) -> Self {
        Self { id: id.into(), raw, updated_at: Utc::now() }
    }

    pub fn topic(&self) -> Option<&str> {
        self.raw.get("topic")?.get("value")?.as_str()
    }

    /// Copy of this record with `topic.value` replaced, other raw fields untouched.
    pub fn with_topic(&self, topic: &str) -> Self {
        let mut raw = match &self.raw {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        match raw.get_mut("topic") {
            Some(Value::Object(current)) => {
                current.insert("value".to_owned(), Value::String(topic.to_owned()));
            }
            _ => {
                raw.insert("topic".to_owned(), json!({ "value": topic }));
            }
        }
        Self { id: self.id.clone(), raw: Value::Object(raw), updated_at: Utc::now() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub raw: Value,
    pub join_date: DateTime<Utc>,
}

impl UserRecord {
    /// Raw profile with `join_date` folded in as an RFC 3339 string.
    pub fn profile(&self) -> Value {
        let mut profile = match &self.raw {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("raw".to_owned(), other.clone());
                map
            }
        };
        profile.insert("join_date".to_owned(), Value::String(self.join_date.to_rfc3339()));
        Value::Object(profile)
    }
}
