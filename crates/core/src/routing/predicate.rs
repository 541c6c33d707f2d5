use crate::domain::message::IncomingMessage;
use crate::identity::BotIdentity;

/// A gate on a rule. A rule without a given kind is unconstrained on that axis.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PredicateKind {
    MentionRequired,
    AdminRequired,
    SubtypeEquals(String),
    /// Compile-time pattern flag; always passes at evaluation.
    CaseInsensitive,
}

impl PredicateKind {
    pub fn evaluate(&self, message: &IncomingMessage, identity: &BotIdentity) -> bool {
        match self {
            Self::MentionRequired => message.mentions_bot,
            Self::AdminRequired => message.user().is_some_and(|user| identity.is_admin(user)),
            Self::SubtypeEquals(subtype) => message.subtype.as_deref() == Some(subtype.as_str()),
            Self::CaseInsensitive => true,
        }
    }
}

/// Pattern search over the message text. Missing or empty text never matches.
pub fn pattern_matches(pattern: &regex::Regex, message: &IncomingMessage) -> bool {
    message.text().is_some_and(|text| pattern.is_match(text))
}

/// Pattern plus every predicate, ANDed.
pub fn matches<'a, I>(
    pattern: &regex::Regex,
    predicates: I,
    message: &IncomingMessage,
    identity: &BotIdentity,
) -> bool
where
    I: IntoIterator<Item = &'a PredicateKind>,
{
    pattern_matches(pattern, message)
        && predicates.into_iter().all(|predicate| predicate.evaluate(message, identity))
}

#[cfg(test)]
mod tests {
    use regex::{Regex, RegexBuilder};

    use super::{matches, pattern_matches, PredicateKind};
    use crate::domain::message::IncomingMessage;
    use crate::identity::BotIdentity;

    fn identity() -> BotIdentity {
        BotIdentity::new("UBOT", ["UADMIN"])
    }

    fn any() -> Regex {
        Regex::new(".*").expect("pattern")
    }

    #[test]
    fn catch_all_pattern_skips_missing_and_empty_text() {
        let pattern = any();
        assert!(!pattern_matches(&pattern, &IncomingMessage::new("C1")));
        assert!(!pattern_matches(&pattern, &IncomingMessage::new("C1").with_text("")));
        assert!(pattern_matches(&pattern, &IncomingMessage::new("C1").with_text(" ")));
    }

    #[test]
    fn pattern_is_searched_not_anchored() {
        let pattern = Regex::new("g#").expect("pattern");
        let message = IncomingMessage::new("C1").with_text("see g#sirbot-pyslackers");
        assert!(pattern_matches(&pattern, &message));
    }

    #[test]
    fn case_insensitivity_comes_from_compilation() {
        let strict = Regex::new("hello").expect("pattern");
        let relaxed = RegexBuilder::new("hello").case_insensitive(true).build().expect("pattern");
        let message = IncomingMessage::new("C1").with_text("HeLLo there");

        assert!(!pattern_matches(&strict, &message));
        assert!(pattern_matches(&relaxed, &message));
        assert!(PredicateKind::CaseInsensitive.evaluate(&message, &identity()));
    }

    #[test]
    fn mention_uses_adapter_flag() {
        let identity = identity();
        let plain = IncomingMessage::new("C1").with_text("<@UBOT> hi");
        let flagged = plain.clone().mentioning_bot();

        assert!(!PredicateKind::MentionRequired.evaluate(&plain, &identity));
        assert!(PredicateKind::MentionRequired.evaluate(&flagged, &identity));
    }

    #[test]
    fn admin_requires_known_user() {
        let identity = identity();
        let admin = IncomingMessage::new("C1").with_user("UADMIN");
        let member = IncomingMessage::new("C1").with_user("U1");
        let anonymous = IncomingMessage::new("C1");

        assert!(PredicateKind::AdminRequired.evaluate(&admin, &identity));
        assert!(!PredicateKind::AdminRequired.evaluate(&member, &identity));
        assert!(!PredicateKind::AdminRequired.evaluate(&anonymous, &identity));
    }

    #[test]
    fn subtype_must_equal_exactly() {
        let identity = identity();
        let topic = PredicateKind::SubtypeEquals("channel_topic".to_owned());

        let with_subtype = IncomingMessage::new("C1").with_subtype("channel_topic");
        let other_subtype = IncomingMessage::new("C1").with_subtype("channel_join");
        let no_subtype = IncomingMessage::new("C1");

        assert!(topic.evaluate(&with_subtype, &identity));
        assert!(!topic.evaluate(&other_subtype, &identity));
        assert!(!topic.evaluate(&no_subtype, &identity));
    }

    #[test]
    fn non_admin_never_passes_admin_gate_whatever_else_matches() {
        let identity = identity();
        let pattern = any();
        let predicates = [PredicateKind::AdminRequired, PredicateKind::MentionRequired];

        for subtype in [None, Some("channel_topic"), Some("bot_message")] {
            for mentioned in [false, true] {
                let mut message = IncomingMessage::new("C1").with_user("U1").with_text("tell");
                message.subtype = subtype.map(str::to_owned);
                message.mentions_bot = mentioned;
                assert!(!matches(&pattern, &predicates, &message, &identity));
            }
        }
    }

    #[test]
    fn predicates_are_anded() {
        let identity = identity();
        let pattern = any();
        let predicates = [PredicateKind::AdminRequired, PredicateKind::MentionRequired];

        let admin_only = IncomingMessage::new("C1").with_user("UADMIN").with_text("inspect");
        assert!(!matches(&pattern, &predicates, &admin_only, &identity));
        assert!(matches(&pattern, &predicates, &admin_only.mentioning_bot(), &identity));
    }
}
