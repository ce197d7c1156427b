//! Services-assigned custom message tags
//!
//! A trusted services layer attaches named tags to a user; this crate
//! re-attaches them, namespaced under a vendor prefix, to every outgoing
//! message about that user: messages the user sends, server numerics that
//! name the user at a configured position, and WHOX replies whose nickname
//! position is negotiated per request.
//!
//! - [`CustomTags`]: populates messages and filters tags per recipient
//! - [`SubjectResolver`]: decides who a message is about
//! - [`who`]: WHOX field negotiation and the shared field tracker
//! - [`TagsExtension`]: replication hook for the per-user tag store
//! - [`protocol`]: the traits a host server implements

#![forbid(unsafe_code)]

pub mod engine;
pub mod extension;
pub mod protocol;
pub mod resolver;
pub mod who;

pub use custom_tags_core::{
    DecodedTags, Error, Result, Settings, SpecialMessageIndex, TagStore, TagsConfig,
};
pub use engine::{CustomTags, MESSAGE_TAGS_CAP};
pub use extension::{EXTENSION_NAME, TagsExtension};
pub use protocol::{
    CapabilityQuery, ClientMessage, MessageSource, MessageTag, OutgoingMessage, ProviderId,
    TagStorage, UserDirectory, UserId,
};
pub use resolver::SubjectResolver;
pub use who::{DynamicFieldTracker, WHOX_REPLY, WhoExchange, WhoxFields};
