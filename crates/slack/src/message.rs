use serde::Serialize;

use sirbot_core::IncomingMessage;

/// Body of a `chat.postMessage` call. Built from the triggering message so replies stay in
/// the same channel and thread unless a handler redirects them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResponseDraft {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl ResponseDraft {
    pub fn reply_to(message: &IncomingMessage) -> Self {
        Self {
            channel: message.channel.clone(),
            thread_ts: message.thread_ts.clone(),
            ..Self::default()
        }
    }

    pub fn to_channel(channel: impl Into<String>) -> Self {
        Self { channel: channel.into(), ..Self::default() }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sends the draft somewhere else; a thread from the original channel no longer applies.
    pub fn redirect(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self.thread_ts = None;
        self
    }

    pub fn attachment<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut AttachmentBuilder),
    {
        let mut builder = AttachmentBuilder::default();
        build(&mut builder);
        self.attachments.push(builder.build());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl Attachment {
    pub fn field(&self, title: &str) -> Option<&str> {
        self.fields.iter().find(|field| field.title == title).map(|field| field.value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub short: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Danger,
}

/// Interactive button on a legacy attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Action {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Action {
    pub fn button(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            kind: "button".to_owned(),
            style: None,
            value: None,
        }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Default)]
pub struct AttachmentBuilder {
    attachment: Attachment,
}

impl AttachmentBuilder {
    pub fn fallback(&mut self, text: impl Into<String>) -> &mut Self {
        self.attachment.fallback = Some(text.into());
        self
    }

    pub fn color(&mut self, color: impl Into<String>) -> &mut Self {
        self.attachment.color = Some(color.into());
        self
    }

    pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
        self.attachment.title = Some(title.into());
        self
    }

    pub fn title_link(&mut self, link: impl Into<String>) -> &mut Self {
        self.attachment.title_link = Some(link.into());
        self
    }

    pub fn thumb_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.attachment.thumb_url = Some(url.into());
        self
    }

    pub fn field(&mut self, title: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push_field(title.into(), value.into(), false)
    }

    pub fn short_field(&mut self, title: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push_field(title.into(), value.into(), true)
    }

    fn push_field(&mut self, title: String, value: String, short: bool) -> &mut Self {
        self.attachment.fields.push(Field { title, value, short });
        self
    }

    pub fn footer(&mut self, text: impl Into<String>, icon: impl Into<String>) -> &mut Self {
        self.attachment.footer = Some(text.into());
        self.attachment.footer_icon = Some(icon.into());
        self
    }

    pub fn ts(&mut self, epoch_secs: f64) -> &mut Self {
        self.attachment.ts = Some(epoch_secs);
        self
    }

    pub fn callback_id(&mut self, callback_id: impl Into<String>) -> &mut Self {
        self.attachment.callback_id = Some(callback_id.into());
        self
    }

    pub fn action(&mut self, action: Action) -> &mut Self {
        self.attachment.actions.push(action);
        self
    }

    fn build(self) -> Attachment {
        self.attachment
    }
}
