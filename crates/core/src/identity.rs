use std::collections::HashSet;

/// Who the bot is and who may run admin-only commands.
///
/// Built once at startup and shared behind an `Arc`; dispatch only ever reads it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BotIdentity {
    bot_user_id: String,
    admins: HashSet<String>,
}

impl BotIdentity {
    pub fn new<I, S>(bot_user_id: impl Into<String>, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bot_user_id: bot_user_id.into(),
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    pub fn is_bot(&self, user_id: &str) -> bool {
        !self.bot_user_id.is_empty() && self.bot_user_id == user_id
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }

    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }

    /// The `<@ID>` token Slack uses when someone mentions the bot.
    pub fn mention_token(&self) -> String {
        format!("<@{}>", self.bot_user_id)
    }
}
