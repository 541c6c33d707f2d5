//! Message routing: rules gate handlers by pattern, mention, admin and subtype predicates,
//! and the dispatcher runs every matching handler for an incoming message.

pub mod dispatcher;
pub mod handler;
pub mod predicate;
pub mod registry;
pub mod rule;

pub use dispatcher::{DispatchReport, Dispatcher, RuleExecution, RuleOutcome};
pub use handler::{handler_fn, FnHandler, MessageHandler};
pub use predicate::PredicateKind;
pub use registry::{HandlerRegistry, RuleSnapshot};
pub use rule::{Concurrency, Rule, RuleBuilder};
