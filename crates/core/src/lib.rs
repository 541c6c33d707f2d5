pub mod config;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod routing;

pub use domain::archive::{ArchivedMessage, ChannelRecord, UserRecord};
pub use domain::message::IncomingMessage;
pub use errors::{CollaboratorError, HandlerError, RuleError};
pub use identity::BotIdentity;
pub use routing::{
    handler_fn, Concurrency, DispatchReport, Dispatcher, HandlerRegistry, MessageHandler,
    PredicateKind, Rule, RuleOutcome,
};
