//! Host-facing seams.
//!
//! The protocol engine, the user directory, per-user extension storage and
//! capability negotiation all live in the host server. The tag engine only
//! talks to them through the traits here.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use custom_tags_core::TagStore;

// =============================================================================
// Identities
// =============================================================================

/// Network-wide unique identifier of a connected user (its UUID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(Arc<str>);

impl UserId {
    #[must_use]
    pub fn new(uuid: &str) -> Self {
        Self(Arc::from(uuid))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(uuid: &str) -> Self {
        Self::new(uuid)
    }
}

/// Identity of a message-tag provider.
///
/// Every tag records the provider that attached it; providers recognise their
/// own tags by comparing ids, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(NonZeroU64);

static NEXT_PROVIDER: AtomicU64 = AtomicU64::new(1);

impl ProviderId {
    /// Allocate a fresh id, distinct from every other id in the process.
    #[must_use]
    pub fn next() -> Self {
        let raw = NEXT_PROVIDER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

// =============================================================================
// Outgoing messages
// =============================================================================

/// Who a message claims to come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource {
    /// A real (non-server) user.
    User(UserId),
    /// The local or a remote server.
    Server,
    /// No prefix at all.
    Absent,
}

/// One tag attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTag {
    pub name: String,
    pub value: String,
    pub owner: ProviderId,
}

/// An outgoing protocol message as seen by tag providers.
pub trait OutgoingMessage {
    fn command(&self) -> &str;

    fn params(&self) -> &[String];

    fn source(&self) -> &MessageSource;

    fn add_tag(&mut self, name: String, owner: ProviderId, value: String);
}

/// Plain [`OutgoingMessage`] for hosts that have no message type of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    command: String,
    params: Vec<String>,
    source: MessageSource,
    tags: Vec<MessageTag>,
}

impl ClientMessage {
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            params: Vec::new(),
            source: MessageSource::Absent,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn sent_by(mut self, user: UserId) -> Self {
        self.source = MessageSource::User(user);
        self
    }

    #[must_use]
    pub fn sent_by_server(mut self) -> Self {
        self.source = MessageSource::Server;
        self
    }

    /// Tags in the order they were attached.
    #[must_use]
    pub fn tags(&self) -> &[MessageTag] {
        &self.tags
    }

    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&MessageTag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// Tags a particular recipient may see, according to `should_send`.
    pub fn visible_tags<'a, F>(
        &'a self,
        mut should_send: F,
    ) -> impl Iterator<Item = &'a MessageTag>
    where
        F: FnMut(&MessageTag) -> bool + 'a,
    {
        self.tags.iter().filter(move |tag| should_send(tag))
    }
}

impl OutgoingMessage for ClientMessage {
    fn command(&self) -> &str {
        &self.command
    }

    fn params(&self) -> &[String] {
        &self.params
    }

    fn source(&self) -> &MessageSource {
        &self.source
    }

    /// The first provider to attach a given name keeps it.
    fn add_tag(&mut self, name: String, owner: ProviderId, value: String) {
        if self.tags.iter().any(|tag| tag.name == name) {
            return;
        }
        self.tags.push(MessageTag { name, value, owner });
    }
}

// =============================================================================
// Host collaborators
// =============================================================================

/// Live nickname lookup.
pub trait UserDirectory {
    /// Currently connected user with this nickname (case-insensitive).
    fn find_nick(&self, nick: &str) -> Option<UserId>;
}

/// Per-user extension storage holding each user's tags.
///
/// Implementations must never keep an empty store: `set` is only called with
/// non-empty stores and `unset` removes the entry.
pub trait TagStorage {
    fn get(&self, user: &UserId) -> Option<&TagStore>;

    fn set(&mut self, user: &UserId, store: TagStore);

    fn unset(&mut self, user: &UserId);
}

impl<S: BuildHasher> TagStorage for HashMap<UserId, TagStore, S> {
    fn get(&self, user: &UserId) -> Option<&TagStore> {
        HashMap::get(self, user)
    }

    fn set(&mut self, user: &UserId, store: TagStore) {
        self.insert(user.clone(), store);
    }

    fn unset(&mut self, user: &UserId) {
        self.remove(user);
    }
}

/// Per-connection capability negotiation state.
pub trait CapabilityQuery<C: ?Sized> {
    fn is_enabled(&self, connection: &C, capability: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_are_unique() {
        let a = ProviderId::next();
        let b = ProviderId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn first_tag_with_a_name_wins() {
        let first = ProviderId::next();
        let second = ProviderId::next();
        let mut msg = ClientMessage::new("PRIVMSG");
        msg.add_tag("acme/level".into(), first, "5".into());
        msg.add_tag("acme/level".into(), second, "9".into());
        assert_eq!(msg.tags().len(), 1);
        assert_eq!(msg.tag("acme/level").map(|t| t.owner), Some(first));
    }

    #[test]
    fn builder_sets_source_and_params() {
        let msg = ClientMessage::new("321")
            .with_params(["Alice", "Bob"])
            .sent_by_server();
        assert_eq!(msg.command(), "321");
        assert_eq!(msg.params().to_vec(), vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(msg.source(), &MessageSource::Server);

        let bob = UserId::new("001AAAAAB");
        let msg = ClientMessage::new("PRIVMSG").sent_by(bob.clone());
        assert_eq!(msg.source(), &MessageSource::User(bob));
    }

    #[test]
    fn hashmap_storage_set_and_unset() {
        let user = UserId::new("001AAAAAA");
        let mut storage: HashMap<UserId, TagStore> = HashMap::new();
        let store = TagStore::from_pairs([("a", "1")]).expect("store");
        TagStorage::set(&mut storage, &user, store.clone());
        assert_eq!(TagStorage::get(&storage, &user), Some(&store));
        TagStorage::unset(&mut storage, &user);
        assert!(TagStorage::get(&storage, &user).is_none());
    }
}
