//! The custom tag provider.
//!
//! [`CustomTags`] decides, for every outgoing message, whose tags apply and
//! attaches them as `vendor/name` tags. Whether a particular recipient sees
//! them is decided separately by [`CustomTags::should_send`].

use std::sync::Arc;

use custom_tags_core::{LockLevel, OrderedRwLock, Result, Settings, TagsConfig};

use crate::protocol::{
    CapabilityQuery, MessageTag, OutgoingMessage, ProviderId, TagStorage, UserDirectory,
};
use crate::resolver::SubjectResolver;
use crate::who::{DynamicFieldTracker, WhoExchange, WhoxFields};

/// Capability a connection must have enabled to receive custom tags.
pub const MESSAGE_TAGS_CAP: &str = "message-tags";

/// Message-tag provider for services-assigned custom tags.
#[derive(Debug)]
pub struct CustomTags {
    provider: ProviderId,
    settings: OrderedRwLock<Arc<Settings>>,
    tracker: DynamicFieldTracker,
}

impl CustomTags {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            provider: ProviderId::next(),
            settings: OrderedRwLock::new(LockLevel::Settings, Arc::new(settings)),
            tracker: DynamicFieldTracker::new(),
        }
    }

    pub fn from_config(config: &TagsConfig, server_name: &str) -> Result<Self> {
        Ok(Self::new(Settings::build(config, server_name)?))
    }

    /// Identity stamped on every tag this provider attaches.
    #[must_use]
    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    /// Current settings snapshot.
    #[must_use]
    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings.read())
    }

    #[must_use]
    pub fn vendor(&self) -> String {
        self.settings().vendor.clone()
    }

    #[must_use]
    pub const fn tracker(&self) -> &DynamicFieldTracker {
        &self.tracker
    }

    /// Validate `config` and install it. On error the running settings are
    /// left untouched.
    pub fn reload(&self, config: &TagsConfig, server_name: &str) -> Result<()> {
        let next = match Settings::build(config, server_name) {
            Ok(next) => Arc::new(next),
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    "custom tags configuration rejected; keeping previous"
                );
                return Err(err);
            }
        };
        tracing::info!(
            special_messages = next.index.len(),
            vendor = %next.vendor,
            "custom tags configuration loaded"
        );
        *self.settings.write() = next;
        Ok(())
    }

    /// WHO reply hook: remember where the nickname sits in this request's
    /// `354` replies.
    pub fn on_who_line(&self, requested_fields: WhoxFields) {
        self.tracker.observe_request(requested_fields);
    }

    /// Attach the subject's tags, taking the WHOX layout from the shared
    /// tracker.
    pub fn populate<M, D, S>(&self, message: &mut M, directory: &D, storage: &S)
    where
        M: OutgoingMessage + ?Sized,
        D: UserDirectory + ?Sized,
        S: TagStorage + ?Sized,
    {
        let who_field = self.tracker.current();
        self.populate_with(message, directory, storage, who_field);
    }

    /// Attach the subject's tags, taking the WHOX layout from the exchange
    /// the message belongs to.
    pub fn populate_in<M, D, S>(
        &self,
        message: &mut M,
        directory: &D,
        storage: &S,
        exchange: WhoExchange,
    ) where
        M: OutgoingMessage + ?Sized,
        D: UserDirectory + ?Sized,
        S: TagStorage + ?Sized,
    {
        self.populate_with(message, directory, storage, exchange.subject_field());
    }

    fn populate_with<M, D, S>(
        &self,
        message: &mut M,
        directory: &D,
        storage: &S,
        who_field: Option<usize>,
    ) where
        M: OutgoingMessage + ?Sized,
        D: UserDirectory + ?Sized,
        S: TagStorage + ?Sized,
    {
        let settings = self.settings();
        let Some(subject) = SubjectResolver::new(&settings.index).resolve(
            message.command(),
            message.params(),
            message.source(),
            who_field,
            directory,
        ) else {
            return;
        };

        let Some(tags) = storage.get(&subject) else {
            return;
        };

        for (name, value) in tags.iter() {
            message.add_tag(
                format!("{}/{name}", settings.vendor),
                self.provider,
                value.to_string(),
            );
        }
    }

    /// Recipient filter: only our own tags, and only to connections that
    /// enabled `message-tags`.
    pub fn should_send<C, Q>(&self, connection: &C, tag: &MessageTag, capabilities: &Q) -> bool
    where
        C: ?Sized,
        Q: CapabilityQuery<C> + ?Sized,
    {
        tag.owner == self.provider && capabilities.is_enabled(connection, MESSAGE_TAGS_CAP)
    }
}
