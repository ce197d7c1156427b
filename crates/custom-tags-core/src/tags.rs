//! Per-user tag store and its replication wire format.
//!
//! A store maps tag names to values. Names compare case-insensitively under
//! the `rfc1459` casemapping, iteration follows insertion order, and the
//! spelling of the first insertion is what gets emitted.
//!
//! On the wire a store is a flat list of `name value` pairs separated by
//! single spaces:
//!
//! ```text
//! level 5 clan red
//! ```
//!
//! An empty payload means "no tags". A store is never kept empty at rest, so
//! decoding returns [`DecodedTags::Cleared`] instead of an empty store.

use indexmap::IndexMap;

use crate::casemap::irc_fold;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct TagEntry {
    name: String,
    value: String,
}

/// Ordered, case-insensitive mapping of tag name to tag value.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    /// Keyed by the folded name.
    entries: IndexMap<String, TagEntry>,
}

/// Outcome of decoding a replication payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedTags {
    /// At least one tag; replaces whatever the user had.
    Present(TagStore),
    /// Zero tags; the user's store must be removed.
    Cleared,
}

impl TagStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from pairs, validating every token.
    ///
    /// Later duplicates of a name replace the earlier value in place.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::new();
        for (name, value) in pairs {
            store.set(name, value)?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&irc_fold(name))
            .map(|entry| entry.value.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&irc_fold(name))
    }

    /// Set a tag, replacing the value of an existing (case-insensitively
    /// equal) name without moving it.
    ///
    /// Returns the previous value, if any.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>> {
        let name = name.into();
        let value = value.into();
        check_token(&name, true).map_err(|reason| Error::InvalidTagToken {
            token: name.clone(),
            reason,
        })?;
        check_token(&value, false).map_err(|reason| Error::InvalidTagToken {
            token: value.clone(),
            reason,
        })?;

        match self.entries.get_mut(&irc_fold(&name)) {
            Some(entry) => Ok(Some(std::mem::replace(&mut entry.value, value))),
            None => {
                self.entries.insert(irc_fold(&name), TagEntry { name, value });
                Ok(None)
            }
        }
    }

    /// Remove a tag, keeping the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries
            .shift_remove(&irc_fold(name))
            .map(|entry| entry.value)
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
    }

    /// Decode a replication payload.
    ///
    /// The payload is split on single spaces and consumed two tokens at a
    /// time. An odd token count or an empty name fails; empty values are
    /// kept. When a name repeats, the first occurrence wins.
    ///
    /// A stray leading or trailing space is not skipped: it yields an empty
    /// name or an odd token count and fails the payload.
    pub fn decode(raw: &str) -> Result<DecodedTags> {
        if raw.is_empty() {
            return Ok(DecodedTags::Cleared);
        }

        let tokens: Vec<&str> = raw.split(' ').collect();
        if tokens.len() % 2 != 0 {
            return Err(malformed(raw, "tag name without a value"));
        }

        let mut store = Self::new();
        for pair in tokens.chunks_exact(2) {
            let (name, value) = (pair[0], pair[1]);
            check_token(name, true).map_err(|reason| malformed(raw, reason))?;
            check_token(value, false).map_err(|reason| malformed(raw, reason))?;
            store
                .entries
                .entry(irc_fold(name))
                .or_insert_with(|| TagEntry {
                    name: name.to_string(),
                    value: value.to_string(),
                });
        }

        if store.is_empty() {
            Ok(DecodedTags::Cleared)
        } else {
            Ok(DecodedTags::Present(store))
        }
    }

    /// Encode into the replication payload: `name value` pairs joined by a
    /// single space, no trailing delimiter.
    #[must_use]
    pub fn encode(&self) -> String {
        let capacity = self
            .entries
            .values()
            .map(|entry| entry.name.len() + entry.value.len() + 2)
            .sum();
        let mut buf = String::with_capacity(capacity);
        for (name, value) in self.iter() {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(name);
            buf.push(' ');
            buf.push_str(value);
        }
        buf
    }
}

/// Stores are equal when they hold the same names (as spelled) and values in
/// the same order.
impl PartialEq for TagStore {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for TagStore {}

fn check_token(token: &str, is_name: bool) -> std::result::Result<(), &'static str> {
    if is_name && token.is_empty() {
        return Err("empty tag name");
    }
    if token.contains(|c: char| c.is_whitespace() || c.is_control()) {
        return Err("whitespace or control character in tag");
    }
    Ok(())
}

fn malformed(raw: &str, reason: &'static str) -> Error {
    Error::MalformedPayload {
        raw: raw.to_string(),
        reason,
    }
}
