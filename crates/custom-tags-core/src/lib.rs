//! Core types for services-assigned custom tags
//!
//! This crate provides:
//! - The per-user `TagStore` and its replication wire format
//! - Configuration (`TagsConfig`, `SpecialMessageIndex`, `Settings`)
//! - IRC casemapping used for every case-insensitive comparison
//! - Common error types and the ordered locks guarding shared state

#![forbid(unsafe_code)]

pub mod casemap;
pub mod config;
pub mod error;
pub mod lock_order;
pub mod tags;

#[cfg(test)]
pub mod proptest_generators;

// Re-export key types for convenience
pub use casemap::{irc_equals, irc_fold};
pub use config::{
    MAX_SPECIAL_INDEX, Settings, SpecialMessageEntry, SpecialMessageIndex, TagsConfig,
    VendorSection,
};
pub use error::{Error, Result};
pub use lock_order::{LockLevel, OrderedMutex, OrderedRwLock};
pub use tags::{DecodedTags, TagStore};
