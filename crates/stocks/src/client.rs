use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use sirbot_core::config::QuotesConfig;
use sirbot_core::errors::CollaboratorError;

use crate::model::{BookResponse, LogoResponse, Quote};
use crate::QuoteApi;

/// HTTP client for an IEX Cloud compatible quote API.
pub struct IexClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl IexClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url, token })
    }

    pub fn from_config(config: &QuotesConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.base_url.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        subject: &str,
    ) -> Result<T, CollaboratorError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.expose_secret())]);
        }

        let response = request.send().await.map_err(|error| {
            warn!(
                event_name = "quotes.request.failed",
                path,
                error = %error,
                "quote request failed"
            );
            CollaboratorError::Unavailable(error.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(
                event_name = "quotes.request.not_found",
                path,
                "quote api returned 404"
            );
            return Err(CollaboratorError::NotFound(subject.to_owned()));
        }
        if !status.is_success() {
            warn!(
                event_name = "quotes.request.rejected",
                path,
                status = %status,
                "quote api error"
            );
            return Err(CollaboratorError::Unavailable(format!("quote api returned {status}")));
        }

        response.json::<T>().await.map_err(|error| {
            warn!(
                event_name = "quotes.decode.failed",
                path,
                error = %error,
                "unexpected quote payload"
            );
            CollaboratorError::Unavailable(format!("failed to decode quote payload: {error}"))
        })
    }
}

#[async_trait]
impl QuoteApi for IexClient {
    async fn book_quote(&self, symbol: &str) -> Result<Quote, CollaboratorError> {
        let book: BookResponse = self.get_json(&format!("/stock/{symbol}/book"), symbol).await?;
        Ok(book.quote)
    }

    async fn logo(&self, symbol: &str) -> Result<String, CollaboratorError> {
        let logo: LogoResponse = self.get_json(&format!("/stock/{symbol}/logo"), symbol).await?;
        Ok(logo.url)
    }

    async fn list_crypto(&self) -> Result<Vec<Quote>, CollaboratorError> {
        self.get_json("/stock/market/crypto", "crypto").await
    }
}
