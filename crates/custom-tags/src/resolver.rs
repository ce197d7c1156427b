//! Works out which user an outgoing message is about.

use custom_tags_core::{SpecialMessageIndex, irc_equals};

use crate::protocol::{MessageSource, UserDirectory, UserId};
use crate::who::WHOX_REPLY;

/// Resolves the subject of a message against a special-message table.
///
/// Resolution is total: anything ambiguous yields `None`, which means "attach
/// nothing". Losing tags is acceptable; attaching the wrong user's is not.
#[derive(Debug, Clone, Copy)]
pub struct SubjectResolver<'a> {
    index: &'a SpecialMessageIndex,
}

impl<'a> SubjectResolver<'a> {
    #[must_use]
    pub const fn new(index: &'a SpecialMessageIndex) -> Self {
        Self { index }
    }

    /// Subject of a message.
    ///
    /// A user source is its own subject. Otherwise the command must be a
    /// special message, and the nickname at its configured position (or, for
    /// a WHOX reply, one past the negotiated `who_field`) must belong to a
    /// connected user.
    pub fn resolve<D>(
        &self,
        command: &str,
        params: &[String],
        source: &MessageSource,
        who_field: Option<usize>,
        directory: &D,
    ) -> Option<UserId>
    where
        D: UserDirectory + ?Sized,
    {
        if let MessageSource::User(user) = source {
            return Some(user.clone());
        }

        let configured = self.index.position(command)?;
        let position = if irc_equals(command, WHOX_REPLY) {
            // Parameter 0 of a 354 is the requesting client.
            who_field?.checked_add(1)?
        } else {
            configured
        };

        let nick = params.get(position)?;
        directory.find_nick(nick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custom_tags_core::irc_fold;
    use std::collections::HashMap;

    struct Nicks(HashMap<String, UserId>);

    impl Nicks {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(nick, uuid)| (irc_fold(nick), UserId::new(uuid)))
                    .collect(),
            )
        }
    }

    impl UserDirectory for Nicks {
        fn find_nick(&self, nick: &str) -> Option<UserId> {
            self.0.get(&irc_fold(nick)).cloned()
        }
    }

    fn params(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn index() -> SpecialMessageIndex {
        SpecialMessageIndex::from_pairs([("321", 1), ("354", 0), ("311", 1)]).expect("index")
    }

    #[test]
    fn user_source_wins_over_special_entry() {
        let index = index();
        let nicks = Nicks::new(&[("Bob", "001B")]);
        let alice = UserId::new("001A");
        let subject = SubjectResolver::new(&index).resolve(
            "321",
            &params(&["Alice", "Bob"]),
            &MessageSource::User(alice.clone()),
            None,
            &nicks,
        );
        assert_eq!(subject, Some(alice));
    }

    #[test]
    fn special_message_resolves_configured_position() {
        let index = index();
        let nicks = Nicks::new(&[("Alice", "001A"), ("Bob", "001B")]);
        let resolver = SubjectResolver::new(&index);
        let subject = resolver.resolve(
            "321",
            &params(&["Alice", "Bob", "extra"]),
            &MessageSource::Server,
            None,
            &nicks,
        );
        assert_eq!(subject, Some(UserId::new("001B")));
    }

    #[test]
    fn short_params_resolve_to_none() {
        let index = index();
        let nicks = Nicks::new(&[("Alice", "001A")]);
        let subject = SubjectResolver::new(&index).resolve(
            "321",
            &params(&["Alice"]),
            &MessageSource::Server,
            None,
            &nicks,
        );
        assert_eq!(subject, None);
    }

    #[test]
    fn unknown_command_resolves_to_none() {
        let index = index();
        let nicks = Nicks::new(&[("Bob", "001B")]);
        let subject = SubjectResolver::new(&index).resolve(
            "NOTICE",
            &params(&["Bob", "Bob"]),
            &MessageSource::Absent,
            None,
            &nicks,
        );
        assert_eq!(subject, None);
    }

    #[test]
    fn unknown_nick_resolves_to_none() {
        let index = index();
        let nicks = Nicks::new(&[]);
        let subject = SubjectResolver::new(&index).resolve(
            "311",
            &params(&["Alice", "Ghost"]),
            &MessageSource::Server,
            None,
            &nicks,
        );
        assert_eq!(subject, None);
    }

    #[test]
    fn nick_lookup_is_case_insensitive() {
        let index = index();
        let nicks = Nicks::new(&[("Bob[away]", "001B")]);
        let subject = SubjectResolver::new(&index).resolve(
            "311",
            &params(&["Alice", "bob{AWAY}"]),
            &MessageSource::Server,
            None,
            &nicks,
        );
        assert_eq!(subject, Some(UserId::new("001B")));
    }

    #[test]
    fn whox_uses_negotiated_field_plus_one() {
        let index = index();
        let nicks = Nicks::new(&[("Bob", "001B"), ("chan", "bogus")]);
        let resolver = SubjectResolver::new(&index);
        let reply = params(&["Alice", "#chan", "host", "Bob", "H"]);
        assert_eq!(
            resolver.resolve("354", &reply, &MessageSource::Server, Some(2), &nicks),
            Some(UserId::new("001B"))
        );
    }

    #[test]
    fn whox_without_negotiated_field_is_none() {
        let index = index();
        let nicks = Nicks::new(&[("Alice", "001A")]);
        let reply = params(&["Alice", "Alice"]);
        assert_eq!(
            SubjectResolver::new(&index).resolve("354", &reply, &MessageSource::Server, None, &nicks),
            None
        );
    }

    #[test]
    fn whox_requires_a_table_entry() {
        let index = SpecialMessageIndex::from_pairs([("321", 1)]).expect("index");
        let nicks = Nicks::new(&[("Bob", "001B")]);
        let reply = params(&["Alice", "Bob"]);
        assert_eq!(
            SubjectResolver::new(&index).resolve("354", &reply, &MessageSource::Server, Some(0), &nicks),
            None
        );
    }

    #[test]
    fn whox_short_reply_is_none() {
        let index = index();
        let nicks = Nicks::new(&[("Alice", "001A")]);
        let reply = params(&["Alice", "#chan", "host"]);
        assert_eq!(
            SubjectResolver::new(&index).resolve("354", &reply, &MessageSource::Server, Some(2), &nicks),
            None
        );
    }
}
