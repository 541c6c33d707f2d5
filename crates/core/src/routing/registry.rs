use std::sync::Arc;

use parking_lot::RwLock;

use crate::routing::rule::Rule;

/// Rules in registration order.
pub type RuleSnapshot<C> = Arc<Vec<Arc<Rule<C>>>>;

/// Ordered, append-only rule list.
///
/// Registration is copy-on-write: a dispatch holding a snapshot keeps seeing the list it
/// started with while later registrations publish a new one.
pub struct HandlerRegistry<C> {
    rules: RwLock<RuleSnapshot<C>>,
}

impl<C> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self { rules: RwLock::new(Arc::new(Vec::new())) }
    }
}

impl<C> HandlerRegistry<C>
where
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, rule: Rule<C>) {
        let mut rules = self.rules.write();
        Arc::make_mut(&mut *rules).push(Arc::new(rule));
    }

    pub fn rules(&self) -> RuleSnapshot<C> {
        Arc::clone(&self.rules.read())
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<String> {
        self.rules().iter().map(|rule| rule.name().to_owned()).collect()
    }
}
