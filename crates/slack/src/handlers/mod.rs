//! The bot's chat commands and passive listeners, and the order they are registered in.

mod archive;
mod github;
mod hello;
mod help;
mod inspect;
mod mention;
mod quotes;
mod tell;
mod topic;

use regex::Regex;

use sirbot_core::{handler_fn, HandlerRegistry, Rule, RuleError};

use crate::context::BotContext;

pub use archive::save_in_database;
pub use github::github_repo_link;
pub use hello::hello;
pub use help::help_message;
pub use inspect::Inspect;
pub use mention::mention;
pub use quotes::{CryptoQuote, StockQuote};
pub use tell::Tell;
pub use topic::channel_topic;

/// Registers every handler. All rules are built before the first one is registered, so a bad
/// pattern leaves the registry untouched.
pub fn register_all(registry: &HandlerRegistry<BotContext>) -> Result<(), RuleError> {
    let rules = vec![
        Rule::builder("hello", "hello", handler_fn(hello))
            .case_insensitive()
            .mention()
            .build()?,
        Rule::builder("tell", "^tell", Tell::new()?)
            .case_insensitive()
            .mention()
            .admin()
            .build()?,
        Rule::builder("mention", ".*", handler_fn(mention))
            .case_insensitive()
            .mention()
            .build()?,
        Rule::builder("save_in_database", ".*", handler_fn(save_in_database))
            .fire_and_forget()
            .build()?,
        Rule::builder("channel_topic", ".*", handler_fn(channel_topic))
            .subtype("channel_topic")
            .build()?,
        Rule::builder("github_repo_link", "g#", handler_fn(github_repo_link)).build()?,
        Rule::builder("inspect", "^inspect", Inspect::new()?)
            .case_insensitive()
            .mention()
            .admin()
            .build()?,
        Rule::builder("help", "^help", handler_fn(help_message))
            .case_insensitive()
            .mention()
            .build()?,
        // A leading `s$` keeps ordinary capitalised words from triggering lookups.
        Rule::builder("stock_quote", r"s\$[A-Z\.]{1,5}", StockQuote::new()?)
            .fire_and_forget()
            .build()?,
        Rule::builder("crypto_quote", r"c\$[A-Z\.]{1,5}", CryptoQuote::new()?)
            .fire_and_forget()
            .build()?,
    ];

    for rule in rules {
        registry.register(rule);
    }
    Ok(())
}

/// Compiles a pattern a handler uses internally, reporting failures against its rule.
pub(crate) fn compile(rule: &str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        rule: rule.to_owned(),
        pattern: pattern.to_owned(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use sirbot_core::{Concurrency, HandlerRegistry, PredicateKind};

    use super::register_all;
    use crate::context::BotContext;

    #[test]
    fn handlers_register_in_order_with_their_predicates() {
        let registry = HandlerRegistry::<BotContext>::new();
        register_all(&registry).expect("all patterns compile");

        assert_eq!(
            registry.names(),
            vec![
                "hello",
                "tell",
                "mention",
                "save_in_database",
                "channel_topic",
                "github_repo_link",
                "inspect",
                "help",
                "stock_quote",
                "crypto_quote",
            ]
        );

        let rules = registry.rules();
        let tell = rules.iter().find(|rule| rule.name() == "tell").expect("tell");
        assert!(tell.predicates().contains(&PredicateKind::AdminRequired));
        assert!(tell.predicates().contains(&PredicateKind::MentionRequired));

        let topic = rules.iter().find(|rule| rule.name() == "channel_topic").expect("topic");
        assert!(topic
            .predicates()
            .contains(&PredicateKind::SubtypeEquals("channel_topic".to_owned())));

        let detached: Vec<&str> = rules
            .iter()
            .filter(|rule| rule.concurrency() == Concurrency::FireAndForget)
            .map(|rule| rule.name())
            .collect();
        assert_eq!(detached, vec!["save_in_database", "stock_quote", "crypto_quote"]);
    }
}
