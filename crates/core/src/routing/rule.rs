use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::domain::message::IncomingMessage;
use crate::errors::RuleError;
use crate::identity::BotIdentity;
use crate::routing::handler::MessageHandler;
use crate::routing::predicate::{self, PredicateKind};

/// Whether dispatch waits for a handler before moving to the next rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Concurrency {
    #[default]
    Blocking,
    FireAndForget,
}

/// A registered binding of pattern and predicates to a handler. Immutable once built.
pub struct Rule<C> {
    name: String,
    pattern: Regex,
    predicates: BTreeSet<PredicateKind>,
    handler: Arc<dyn MessageHandler<C>>,
    concurrency: Concurrency,
}

impl<C> Rule<C>
where
    C: Send + Sync + 'static,
{
    pub fn builder<H>(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> RuleBuilder<C>
    where
        H: MessageHandler<C>,
    {
        RuleBuilder {
            name: name.into(),
            pattern: pattern.into(),
            predicates: BTreeSet::new(),
            handler: Arc::new(handler),
            concurrency: Concurrency::Blocking,
            conflicting_subtype: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn predicates(&self) -> &BTreeSet<PredicateKind> {
        &self.predicates
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    pub fn matches(&self, message: &IncomingMessage, identity: &BotIdentity) -> bool {
        predicate::matches(&self.pattern, &self.predicates, message, identity)
    }

    pub(crate) fn handler(&self) -> Arc<dyn MessageHandler<C>> {
        Arc::clone(&self.handler)
    }
}

impl<C> fmt::Debug for Rule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("predicates", &self.predicates)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

pub struct RuleBuilder<C> {
    name: String,
    pattern: String,
    predicates: BTreeSet<PredicateKind>,
    handler: Arc<dyn MessageHandler<C>>,
    concurrency: Concurrency,
    conflicting_subtype: bool,
}

impl<C> RuleBuilder<C>
where
    C: Send + Sync + 'static,
{
    pub fn mention(mut self) -> Self {
        self.predicates.insert(PredicateKind::MentionRequired);
        self
    }

    pub fn admin(mut self) -> Self {
        self.predicates.insert(PredicateKind::AdminRequired);
        self
    }

    pub fn case_insensitive(mut self) -> Self {
        self.predicates.insert(PredicateKind::CaseInsensitive);
        self
    }

    pub fn subtype(mut self, subtype: impl Into<String>) -> Self {
        let subtype = subtype.into();
        let existing = self.predicates.iter().find_map(|predicate| match predicate {
            PredicateKind::SubtypeEquals(current) => Some(current.clone()),
            _ => None,
        });
        match existing {
            Some(current) if current != subtype => self.conflicting_subtype = true,
            Some(_) => {}
            None => {
                self.predicates.insert(PredicateKind::SubtypeEquals(subtype));
            }
        }
        self
    }

    pub fn fire_and_forget(mut self) -> Self {
        self.concurrency = Concurrency::FireAndForget;
        self
    }

    pub fn build(self) -> Result<Rule<C>, RuleError> {
        if self.conflicting_subtype {
            return Err(RuleError::ConflictingSubtype { rule: self.name });
        }

        let pattern = RegexBuilder::new(&self.pattern)
            .case_insensitive(self.predicates.contains(&PredicateKind::CaseInsensitive))
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                rule: self.name.clone(),
                pattern: self.pattern.clone(),
                source,
            })?;

        Ok(Rule {
            name: self.name,
            pattern,
            predicates: self.predicates,
            handler: self.handler,
            concurrency: self.concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Concurrency, Rule};
    use crate::domain::message::IncomingMessage;
    use crate::errors::{HandlerError, RuleError};
    use crate::identity::BotIdentity;
    use crate::routing::handler::handler_fn;
    use crate::routing::predicate::PredicateKind;

    async fn noop(_message: Arc<IncomingMessage>, _ctx: Arc<()>) -> Result<(), HandlerError> {
        Ok(())
    }

    #[test]
    fn builder_collects_predicates_and_defaults_to_blocking() {
        let rule = Rule::builder("tell", "^tell", handler_fn(noop))
            .case_insensitive()
            .mention()
            .admin()
            .build()
            .expect("valid rule");

        assert_eq!(rule.name(), "tell");
        assert_eq!(rule.concurrency(), Concurrency::Blocking);
        assert!(rule.predicates().contains(&PredicateKind::MentionRequired));
        assert!(rule.predicates().contains(&PredicateKind::AdminRequired));
        assert!(rule.predicates().contains(&PredicateKind::CaseInsensitive));
    }

    #[test]
    fn case_insensitive_flag_is_compiled_into_pattern() {
        let identity = BotIdentity::new("UBOT", ["UADMIN"]);
        let rule = Rule::builder("hello", "hello", handler_fn(noop))
            .case_insensitive()
            .mention()
            .build()
            .expect("valid rule");

        let message = IncomingMessage::new("C1").with_text("HELLO bot").mentioning_bot();
        assert!(rule.matches(&message, &identity));
    }

    #[test]
    fn invalid_pattern_fails_at_registration_time() {
        let error =
            Rule::builder("broken", "s$[A-Z", handler_fn(noop)).build().expect_err("bad pattern");
        assert!(matches!(error, RuleError::InvalidPattern { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn two_different_subtypes_are_rejected() {
        let error = Rule::builder("topic", ".*", handler_fn(noop))
            .subtype("channel_topic")
            .subtype("channel_purpose")
            .build()
            .expect_err("conflicting subtypes");
        assert!(matches!(error, RuleError::ConflictingSubtype { .. }));

        let repeated = Rule::builder("topic", ".*", handler_fn(noop))
            .subtype("channel_topic")
            .subtype("channel_topic")
            .fire_and_forget()
            .build()
            .expect("same subtype twice is harmless");
        assert_eq!(repeated.predicates().len(), 1);
        assert_eq!(repeated.concurrency(), Concurrency::FireAndForget);
    }
}
