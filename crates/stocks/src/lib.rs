//! Market data lookups for the `s$` and `c$` chat commands.

pub mod client;
pub mod format;
pub mod memory;
pub mod model;

use async_trait::async_trait;

use sirbot_core::errors::CollaboratorError;

pub use client::IexClient;
pub use memory::InMemoryQuoteApi;
pub use model::Quote;

/// Read-only quote provider. An unknown symbol is [`CollaboratorError::NotFound`]; any
/// other provider failure is [`CollaboratorError::Unavailable`].
#[async_trait]
pub trait QuoteApi: Send + Sync {
    async fn book_quote(&self, symbol: &str) -> Result<Quote, CollaboratorError>;
    async fn logo(&self, symbol: &str) -> Result<String, CollaboratorError>;
    async fn list_crypto(&self) -> Result<Vec<Quote>, CollaboratorError>;
}
