use std::collections::HashMap;

use async_trait::async_trait;

use sirbot_core::errors::CollaboratorError;

use crate::model::Quote;
use crate::QuoteApi;

/// Canned quote provider for handler tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryQuoteApi {
    books: HashMap<String, Quote>,
    logos: HashMap<String, String>,
    crypto: Vec<Quote>,
    outage: Option<CollaboratorError>,
}

impl InMemoryQuoteApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, quote: Quote, logo_url: impl Into<String>) -> Self {
        self.logos.insert(quote.symbol.clone(), logo_url.into());
        self.books.insert(quote.symbol.clone(), quote);
        self
    }

    pub fn with_crypto(mut self, quote: Quote) -> Self {
        self.crypto.push(quote);
        self
    }

    /// Every call fails with `error`.
    pub fn failing(mut self, error: CollaboratorError) -> Self {
        self.outage = Some(error);
        self
    }

    fn check_outage(&self) -> Result<(), CollaboratorError> {
        match &self.outage {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl QuoteApi for InMemoryQuoteApi {
    async fn book_quote(&self, symbol: &str) -> Result<Quote, CollaboratorError> {
        self.check_outage()?;
        self.books
            .get(symbol)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(symbol.to_owned()))
    }

    async fn logo(&self, symbol: &str) -> Result<String, CollaboratorError> {
        self.check_outage()?;
        self.logos
            .get(symbol)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(symbol.to_owned()))
    }

    async fn list_crypto(&self) -> Result<Vec<Quote>, CollaboratorError> {
        self.check_outage()?;
        Ok(self.crypto.clone())
    }
}
