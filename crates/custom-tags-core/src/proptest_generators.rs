//! Property-based test generators for tag stores.
//!
//! All generated values satisfy the token rules of the replication format:
//! names are non-empty, and neither names nor values contain whitespace.

use proptest::prelude::*;

use crate::tags::TagStore;

/// Shared proptest configuration: 1 000 cases, generous shrink budget.
#[must_use]
pub fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 1000,
        max_shrink_iters: 5000,
        ..ProptestConfig::default()
    }
}

/// Strategy for a tag name, including the `rfc1459` special characters.
pub fn arb_tag_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9_.\\-\\[\\]{}|^~]{1,16}").expect("valid regex")
}

/// Strategy for a tag value; may be empty.
pub fn arb_tag_value() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9=_.:/+\\-]{0,24}").expect("valid regex")
}

/// Strategy for a non-empty store of 1–8 entries.
pub fn arb_tag_store() -> impl Strategy<Value = TagStore> {
    proptest::collection::vec((arb_tag_name(), arb_tag_value()), 1..8).prop_map(|pairs| {
        TagStore::from_pairs(pairs).expect("generated tokens are valid")
    })
}
