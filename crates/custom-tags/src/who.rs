//! WHOX field negotiation.
//!
//! A WHOX request (`WHO <mask> [flags]%<fields>[,<querytype>]`) chooses which
//! fields its `354` replies carry, so the nickname's parameter position is
//! only known per request. Replies list the requested fields in the fixed
//! order `t c u i h s n f d l a o r`, after the requesting client's own nick
//! at parameter 0.

use custom_tags_core::{LockLevel, OrderedMutex};

/// Reply numeric of a WHOX request.
pub const WHOX_REPLY: &str = "354";

/// Field marker for the nickname.
pub const NICK_FIELD: char = 'n';

/// Order in which requested fields appear in a `354` reply.
const FIELD_ORDER: [char; 13] = [
    't', 'c', 'u', 'i', 'h', 's', 'n', 'f', 'd', 'l', 'a', 'o', 'r',
];

/// Set of fields requested by a WHOX request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhoxFields {
    bits: u16,
}

impl WhoxFields {
    /// Parse the flags parameter of a WHO request. `None` for a plain WHO
    /// (no `%`). Unknown field letters are ignored.
    #[must_use]
    pub fn parse(flags: &str) -> Option<Self> {
        let (_, selector) = flags.split_once('%')?;
        let fields = selector.split_once(',').map_or(selector, |(f, _)| f);
        Some(Self::from_chars(fields.chars()))
    }

    #[must_use]
    pub fn from_chars(fields: impl IntoIterator<Item = char>) -> Self {
        let bits = fields
            .into_iter()
            .filter_map(slot)
            .fold(0_u16, |acc, slot| acc | (1 << slot));
        Self { bits }
    }

    #[must_use]
    pub fn contains(self, field: char) -> bool {
        slot(field).is_some_and(|slot| self.bits & (1 << slot) != 0)
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Requested fields in reply order.
    pub fn requested(self) -> impl Iterator<Item = char> {
        FIELD_ORDER
            .into_iter()
            .filter(move |field| self.contains(*field))
    }

    /// Position of `field` among the requested fields, counted in reply
    /// order. `None` when the field was not requested.
    #[must_use]
    pub fn field_index(self, field: char) -> Option<usize> {
        if !self.contains(field) {
            return None;
        }
        Some(self.requested().take_while(|f| *f != field).count())
    }

    /// Position of the nickname field, if it was requested.
    #[must_use]
    pub fn nick_index(self) -> Option<usize> {
        self.field_index(NICK_FIELD)
    }
}

fn slot(field: char) -> Option<usize> {
    FIELD_ORDER.iter().position(|f| *f == field)
}

/// Negotiated nickname field of one WHOX exchange.
///
/// Passed alongside the replies of a single request so concurrent requests
/// from different connections never see each other's layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhoExchange {
    subject_field: Option<usize>,
}

impl WhoExchange {
    #[must_use]
    pub const fn new(subject_field: Option<usize>) -> Self {
        Self { subject_field }
    }

    #[must_use]
    pub fn from_fields(fields: WhoxFields) -> Self {
        Self::new(fields.nick_index())
    }

    #[must_use]
    pub const fn subject_field(self) -> Option<usize> {
        self.subject_field
    }
}

/// Process-wide "last seen" nickname field position.
///
/// Every WHOX reply overwrites it, whichever connection it belongs to. Hosts
/// that can thread a [`WhoExchange`] through should prefer that.
#[derive(Debug)]
pub struct DynamicFieldTracker {
    position: OrderedMutex<Option<usize>>,
}

impl Default for DynamicFieldTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicFieldTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            position: OrderedMutex::new(LockLevel::WhoFieldTracker, None),
        }
    }

    /// Record `subject_field_position` when the nickname field was requested,
    /// otherwise clear.
    pub fn observe(&self, requested_fields: WhoxFields, subject_field_position: Option<usize>) {
        let next = if requested_fields.contains(NICK_FIELD) {
            subject_field_position
        } else {
            None
        };
        *self.position.lock() = next;
    }

    /// Record the position derived from the request itself.
    pub fn observe_request(&self, requested_fields: WhoxFields) {
        self.observe(requested_fields, requested_fields.nick_index());
    }

    #[must_use]
    pub fn current(&self) -> Option<usize> {
        *self.position.lock()
    }

    pub fn clear(&self) {
        *self.position.lock() = None;
    }
}
