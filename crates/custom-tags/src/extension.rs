//! Replication hook for the per-user `custom-tags` extension item.
//!
//! The host's extension framework stores each user's [`TagStore`] and calls
//! [`TagsExtension::from_network`] / [`TagsExtension::to_network`] when the
//! item crosses a server link. Local changes made by services go through
//! [`TagsExtension::set_tag`] and [`TagsExtension::unset_tag`], which always
//! replace the whole store so there is a single mutation point per user.

use custom_tags_core::{DecodedTags, Result, TagStore};

use crate::protocol::{TagStorage, UserId};

/// Name of the extension item on the wire.
pub const EXTENSION_NAME: &str = "custom-tags";

/// Codec glue between the extension framework and [`TagStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TagsExtension;

impl TagsExtension {
    #[must_use]
    pub const fn name(self) -> &'static str {
        EXTENSION_NAME
    }

    /// Apply a replicated value for `user`.
    ///
    /// A malformed value is logged and dropped; whatever the user had stays.
    /// An empty value removes the user's tags.
    pub fn from_network<S>(self, user: &UserId, raw: &str, storage: &mut S)
    where
        S: TagStorage + ?Sized,
    {
        match TagStore::decode(raw) {
            Ok(DecodedTags::Present(store)) => storage.set(user, store),
            Ok(DecodedTags::Cleared) => storage.unset(user),
            Err(err) => {
                tracing::debug!(
                    user = %user,
                    error = %err,
                    "Malformed tag list received for {user}: {raw}"
                );
            }
        }
    }

    /// Value to replicate for a stored tag set.
    #[must_use]
    pub fn to_network(self, store: &TagStore) -> String {
        store.encode()
    }

    /// Set one tag on `user`, creating the store if needed.
    pub fn set_tag<S>(self, user: &UserId, name: &str, value: &str, storage: &mut S) -> Result<()>
    where
        S: TagStorage + ?Sized,
    {
        let mut store = storage.get(user).cloned().unwrap_or_default();
        store.set(name, value)?;
        storage.set(user, store);
        Ok(())
    }

    /// Remove one tag from `user`. Removing the last tag removes the store.
    ///
    /// Returns the removed value.
    pub fn unset_tag<S>(self, user: &UserId, name: &str, storage: &mut S) -> Option<String>
    where
        S: TagStorage + ?Sized,
    {
        let mut store = storage.get(user)?.clone();
        let removed = store.remove(name)?;
        if store.is_empty() {
            storage.unset(user);
        } else {
            storage.set(user, store);
        }
        Some(removed)
    }

    /// Drop everything held for a user that has left the network.
    pub fn forget_user<S>(self, user: &UserId, storage: &mut S)
    where
        S: TagStorage + ?Sized,
    {
        storage.unset(user);
    }
}
