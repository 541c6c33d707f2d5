use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing::{debug, warn};

use sirbot_core::config::SlackConfig;
use sirbot_core::errors::CollaboratorError;

use crate::message::ResponseDraft;

/// The subset of the Slack Web API the handlers call.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(&self, draft: &ResponseDraft) -> Result<(), CollaboratorError>;

    /// `already_reacted` surfaces as [`CollaboratorError::AlreadyDone`].
    async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<(), CollaboratorError>;

    /// Returns the `user` object of a `users.info` response.
    async fn users_info(&self, user_id: &str) -> Result<Value, CollaboratorError>;
}

/// Maps a Slack `error` code to the collaborator error taxonomy.
pub fn classify_error_code(code: &str) -> CollaboratorError {
    match code {
        "already_reacted" => CollaboratorError::AlreadyDone(code.to_owned()),
        "user_not_found" | "users_not_found" => CollaboratorError::NotFound(code.to_owned()),
        "ratelimited" => CollaboratorError::RateLimited(code.to_owned()),
        "service_unavailable" | "fatal_error" | "internal_error" | "request_timeout" => {
            CollaboratorError::Unavailable(code.to_owned())
        }
        other => CollaboratorError::Api(other.to_owned()),
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    body: serde_json::Map<String, Value>,
}

pub struct SlackWebClient {
    client: Client,
    base_url: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url, bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.api_base_url.clone(),
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<serde_json::Map<String, Value>, CollaboratorError> {
        let response =
            request.bearer_auth(self.bot_token.expose_secret()).send().await.map_err(|error| {
                warn!(
                    event_name = "slack.api.request_failed",
                    method,
                    error = %error,
                    "slack api request failed"
                );
                CollaboratorError::Unavailable(error.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("unknown")
                .to_owned();
            warn!(
                event_name = "slack.api.rate_limited",
                method,
                retry_after = %retry_after,
                "slack api rate limited"
            );
            return Err(CollaboratorError::RateLimited(format!("retry after {retry_after}s")));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(CollaboratorError::NotFound(method.to_owned()));
        }
        if !status.is_success() {
            warn!(
                event_name = "slack.api.http_error",
                method,
                status = %status,
                "slack api http error"
            );
            return Err(CollaboratorError::Unavailable(format!("{method} returned {status}")));
        }

        let envelope: ApiEnvelope = response.json().await.map_err(|error| {
            CollaboratorError::Api(format!("invalid {method} response: {error}"))
        })?;

        if envelope.ok {
            debug!(
                event_name = "slack.api.ok",
                method,
                "slack api call succeeded"
            );
            return Ok(envelope.body);
        }

        let code = envelope.error.unwrap_or_else(|| "unknown_error".to_owned());
        debug!(
            event_name = "slack.api.error",
            method,
            code = %code,
            "slack api returned error"
        );
        Err(classify_error_code(&code))
    }
}

#[async_trait]
impl ChatApi for SlackWebClient {
    async fn post_message(&self, draft: &ResponseDraft) -> Result<(), CollaboratorError> {
        let request = self.client.post(self.url("chat.postMessage")).json(draft);
        self.call("chat.postMessage", request).await.map(|_| ())
    }

    async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<(), CollaboratorError> {
        let request = self
            .client
            .post(self.url("reactions.add"))
            .json(&json!({ "channel": channel, "timestamp": timestamp, "name": name }));
        self.call("reactions.add", request).await.map(|_| ())
    }

    async fn users_info(&self, user_id: &str) -> Result<Value, CollaboratorError> {
        let request = self.client.get(self.url("users.info")).query(&[("user", user_id)]);
        let mut body = self.call("users.info", request).await?;
        body.remove("user")
            .ok_or_else(|| CollaboratorError::Api("users.info without user".to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reaction {
    pub channel: String,
    pub timestamp: String,
    pub name: String,
}

/// Records every call; used by handler tests in place of the Web API.
#[derive(Default)]
pub struct InMemoryChatApi {
    posted: Mutex<Vec<ResponseDraft>>,
    reactions: Mutex<Vec<Reaction>>,
    users: Mutex<Vec<(String, Value)>>,
    reaction_error: Mutex<Option<CollaboratorError>>,
    post_error: Mutex<Option<CollaboratorError>>,
    posted_signal: Notify,
}

impl InMemoryChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user_id: impl Into<String>, profile: Value) -> Self {
        self.users.lock().push((user_id.into(), profile));
        self
    }

    pub fn with_reaction_error(self, error: CollaboratorError) -> Self {
        *self.reaction_error.lock() = Some(error);
        self
    }

    pub fn with_post_error(self, error: CollaboratorError) -> Self {
        *self.post_error.lock() = Some(error);
        self
    }

    pub fn posted(&self) -> Vec<ResponseDraft> {
        self.posted.lock().clone()
    }

    pub fn reactions(&self) -> Vec<Reaction> {
        self.reactions.lock().clone()
    }

    /// Waits until at least `count` messages were posted or `timeout` elapses, then returns
    /// whatever was posted.
    pub async fn wait_for_posts(&self, count: usize, timeout: Duration) -> Vec<ResponseDraft> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.posted_signal.notified();
            {
                let posted = self.posted.lock();
                if posted.len() >= count {
                    return posted.clone();
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.posted();
            }
        }
    }
}

#[async_trait]
impl ChatApi for InMemoryChatApi {
    async fn post_message(&self, draft: &ResponseDraft) -> Result<(), CollaboratorError> {
        if let Some(error) = self.post_error.lock().clone() {
            return Err(error);
        }
        self.posted.lock().push(draft.clone());
        self.posted_signal.notify_waiters();
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel: &str,
        timestamp: &str,
        name: &str,
    ) -> Result<(), CollaboratorError> {
        self.reactions.lock().push(Reaction {
            channel: channel.to_owned(),
            timestamp: timestamp.to_owned(),
            name: name.to_owned(),
        });
        match self.reaction_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn users_info(&self, user_id: &str) -> Result<Value, CollaboratorError> {
        self.users
            .lock()
            .iter()
            .find(|(id, _)| id == user_id)
            .map(|(_, profile)| profile.clone())
            .ok_or_else(|| CollaboratorError::NotFound("user_not_found".to_owned()))
    }
}
