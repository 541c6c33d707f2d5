use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::message::IncomingMessage;
use crate::identity::BotIdentity;
use crate::routing::handler::MessageHandler;
use crate::routing::registry::HandlerRegistry;
use crate::routing::rule::Concurrency;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleOutcome {
    Completed,
    Failed(String),
    /// Spawned fire-and-forget; its result is never observed by dispatch.
    Detached,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleExecution {
    pub rule: String,
    pub outcome: RuleOutcome,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatch_id: String,
    pub executions: Vec<RuleExecution>,
}

impl DispatchReport {
    pub fn matched(&self) -> Vec<&str> {
        self.executions.iter().map(|execution| execution.rule.as_str()).collect()
    }

    pub fn outcome_of(&self, rule: &str) -> Option<&RuleOutcome> {
        self.executions
            .iter()
            .find(|execution| execution.rule == rule)
            .map(|execution| &execution.outcome)
    }

    pub fn failed_count(&self) -> usize {
        self.executions
            .iter()
            .filter(|execution| matches!(execution.outcome, RuleOutcome::Failed(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}

/// Runs every matching rule for a message.
///
/// Blocking rules are awaited one after another in registration order; fire-and-forget rules
/// are spawned and left alone. Every handler runs in its own task, so an error or a panic stays
/// inside that handler. Cloning is cheap and clones share registry, identity and context.
pub struct Dispatcher<C> {
    registry: Arc<HandlerRegistry<C>>,
    identity: Arc<BotIdentity>,
    context: Arc<C>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            identity: Arc::clone(&self.identity),
            context: Arc::clone(&self.context),
        }
    }
}

impl<C> Dispatcher<C>
where
    C: Send + Sync + 'static,
{
    pub fn new(
        registry: Arc<HandlerRegistry<C>>,
        identity: Arc<BotIdentity>,
        context: Arc<C>,
    ) -> Self {
        Self { registry, identity, context }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry<C>> {
        &self.registry
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    pub async fn dispatch(&self, message: IncomingMessage) -> DispatchReport {
        let dispatch_id = Uuid::new_v4().to_string();
        let message = Arc::new(message);
        let rules = self.registry.rules();
        let mut executions = Vec::new();

        for rule in rules.iter() {
            if !rule.matches(&message, &self.identity) {
                continue;
            }

            debug!(
                event_name = "dispatch.rule.matched",
                correlation_id = %dispatch_id,
                rule = rule.name(),
                concurrency = ?rule.concurrency(),
                channel = %message.channel,
                "rule matched incoming message"
            );

            let invocation = Invocation {
                dispatch_id: dispatch_id.clone(),
                rule: rule.name().to_owned(),
                concurrency: rule.concurrency(),
                handler: rule.handler(),
                message: Arc::clone(&message),
                context: Arc::clone(&self.context),
            };

            let outcome = match rule.concurrency() {
                Concurrency::Blocking => invocation.run().await,
                Concurrency::FireAndForget => {
                    tokio::spawn(invocation.run());
                    RuleOutcome::Detached
                }
            };
            executions.push(RuleExecution { rule: rule.name().to_owned(), outcome });
        }

        if executions.is_empty() {
            debug!(
                event_name = "dispatch.no_match",
                correlation_id = %dispatch_id,
                channel = %message.channel,
                "no rule matched incoming message"
            );
        }

        DispatchReport { dispatch_id, executions }
    }
}

struct Invocation<C> {
    dispatch_id: String,
    rule: String,
    concurrency: Concurrency,
    handler: Arc<dyn MessageHandler<C>>,
    message: Arc<IncomingMessage>,
    context: Arc<C>,
}

impl<C> Invocation<C>
where
    C: Send + Sync + 'static,
{
    /// Failure boundary for one handler call: errors and panics become a [`RuleOutcome`].
    async fn run(self) -> RuleOutcome {
        let Self { dispatch_id, rule, concurrency, handler, message, context } = self;
        let task = tokio::spawn(async move { handler.handle(message, context).await });

        match task.await {
            Ok(Ok(())) => {
                debug!(
                    event_name = "dispatch.rule.completed",
                    correlation_id = %dispatch_id,
                    rule = %rule,
                    concurrency = ?concurrency,
                    "handler completed"
                );
                RuleOutcome::Completed
            }
            Ok(Err(handler_error)) if concurrency == Concurrency::FireAndForget => {
                error!(
                    event_name = "dispatch.rule.failed",
                    correlation_id = %dispatch_id,
                    rule = %rule,
                    concurrency = ?concurrency,
                    error = %handler_error,
                    "detached handler failed"
                );
                RuleOutcome::Failed(handler_error.to_string())
            }
            Ok(Err(handler_error)) => {
                warn!(
                    event_name = "dispatch.rule.failed",
                    correlation_id = %dispatch_id,
                    rule = %rule,
                    concurrency = ?concurrency,
                    error = %handler_error,
                    "handler failed; other handlers are unaffected"
                );
                RuleOutcome::Failed(handler_error.to_string())
            }
            Err(join_error) => {
                error!(
                    event_name = "dispatch.rule.aborted",
                    correlation_id = %dispatch_id,
                    rule = %rule,
                    concurrency = ?concurrency,
                    panicked = join_error.is_panic(),
                    error = %join_error,
                    "handler task aborted"
                );
                RuleOutcome::Failed(format!("handler task aborted: {join_error}"))
            }
        }
    }
}
