use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, StatusCode};
use tracing::debug;

use sirbot_core::errors::CollaboratorError;

#[async_trait]
pub trait LinkChecker: Send + Sync {
    /// `true` iff a plain GET of `url` answers 200.
    async fn exists(&self, url: &str) -> Result<bool, CollaboratorError>;
}

pub struct HttpLinkChecker {
    client: Client,
}

impl HttpLinkChecker {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LinkChecker for HttpLinkChecker {
    async fn exists(&self, url: &str) -> Result<bool, CollaboratorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| CollaboratorError::Unavailable(error.to_string()))?;
        debug!(
            event_name = "links.check.completed",
            url,
            status = %response.status(),
            "checked link"
        );
        Ok(response.status() == StatusCode::OK)
    }
}

/// Answers from a fixed set of known URLs and records every lookup.
#[derive(Default)]
pub struct StaticLinkChecker {
    existing: HashSet<String>,
    checked: Mutex<Vec<String>>,
}

impl StaticLinkChecker {
    pub fn new<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { existing: existing.into_iter().map(Into::into).collect(), checked: Mutex::default() }
    }

    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().clone()
    }
}

#[async_trait]
impl LinkChecker for StaticLinkChecker {
    async fn exists(&self, url: &str) -> Result<bool, CollaboratorError> {
        self.checked.lock().push(url.to_owned());
        Ok(self.existing.contains(url))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum::response::Redirect;
    use axum::routing::get;
    use axum::Router;

    use super::{HttpLinkChecker, LinkChecker};

    #[tokio::test]
    async fn only_http_200_counts_as_existing() {
        let app = Router::new()
            .route("/pyslackers/sirbot", get(|| async { "repo" }))
            .route("/moved", get(|| async { Redirect::permanent("/elsewhere") }))
            .route("/private", get(|| async { StatusCode::UNAUTHORIZED }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let checker = HttpLinkChecker::new(Duration::from_secs(5)).expect("client");
        let base = format!("http://{address}");

        assert!(checker.exists(&format!("{base}/pyslackers/sirbot")).await.expect("check"));
        assert!(!checker.exists(&format!("{base}/private")).await.expect("check"));
        assert!(!checker.exists(&format!("{base}/missing")).await.expect("check"));
        assert!(!checker.exists(&format!("{base}/moved")).await.expect("check"));
    }
}
