use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::message::IncomingMessage;
use crate::errors::HandlerError;

/// An action bound to a rule. Receives the message and the shared application context.
#[async_trait]
pub trait MessageHandler<C>: Send + Sync + 'static
where
    C: Send + Sync + 'static,
{
    async fn handle(&self, message: Arc<IncomingMessage>, ctx: Arc<C>) -> Result<(), HandlerError>;
}

/// Adapts an async function into a [`MessageHandler`].
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F>(f: F) -> FnHandler<F> {
    FnHandler { f }
}

#[async_trait]
impl<C, F, Fut> MessageHandler<C> for FnHandler<F>
where
    C: Send + Sync + 'static,
    F: Fn(Arc<IncomingMessage>, Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, message: Arc<IncomingMessage>, ctx: Arc<C>) -> Result<(), HandlerError> {
        (self.f)(message, ctx).await
    }
}
