//! Configuration for custom tags
//!
//! The configuration document is JSON (JSON5 accepted as a fallback, so
//! comments and trailing commas are fine):
//!
//! ```json5
//! {
//!   // Numerics that are "about" a user, and where that user's nick sits.
//!   specialmsg: [
//!     { command: "321", index: 1 },
//!     { command: "354" },          // WHOX: position negotiated per request
//!   ],
//!   customtags: { vendor: "acme.example" },
//! }
//! ```
//!
//! Two environment variables are honoured (process env first, then a `.env`
//! file in the working directory): `CUSTOMTAGS_CONFIG` points at the document
//! and `CUSTOMTAGS_VENDOR` overrides the vendor prefix.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::Deserialize;

use crate::casemap::irc_fold;
use crate::error::{Error, Result};

/// Highest parameter position a special message may name.
pub const MAX_SPECIAL_INDEX: usize = 20;

/// Position used when `index` is absent or out of range.
const DEFAULT_SPECIAL_INDEX: usize = 0;

const CONFIG_PATH_ENV: &str = "CUSTOMTAGS_CONFIG";
const VENDOR_ENV: &str = "CUSTOMTAGS_VENDOR";

// =============================================================================
// Raw document
// =============================================================================

/// Parsed configuration document, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Repeatable `<specialmsg>` entries.
    #[serde(rename = "specialmsg")]
    pub special_messages: Vec<SpecialMessageEntry>,
    /// The `<customtags>` section.
    #[serde(rename = "customtags")]
    pub tags: VendorSection,
}

/// One `<specialmsg command="..." index="...">` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecialMessageEntry {
    pub command: Option<String>,
    pub index: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VendorSection {
    pub vendor: Option<String>,
}

impl SpecialMessageEntry {
    #[must_use]
    pub fn new(command: &str, index: i64) -> Self {
        Self {
            command: Some(command.to_string()),
            index: Some(index),
        }
    }
}

impl TagsConfig {
    /// Parse a configuration document, trying strict JSON before JSON5.
    pub fn parse(text: &str) -> Result<Self> {
        let body = text.strip_prefix('\u{FEFF}').unwrap_or(text);
        match serde_json::from_str::<Self>(body) {
            Ok(config) => Ok(config),
            Err(json_error) => match json5::from_str::<Self>(body) {
                Ok(config) => Ok(config),
                Err(json5_error) => Err(Error::ConfigParse {
                    json_error: json_error.to_string(),
                    json5_error: json5_error.to_string(),
                }),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Load from `CUSTOMTAGS_CONFIG` (empty config when unset), then apply
    /// `CUSTOMTAGS_VENDOR`.
    pub fn from_env() -> Result<Self> {
        let mut config = match env_value(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        if let Some(vendor) = env_value(VENDOR_ENV) {
            config.tags.vendor = Some(vendor);
        }
        Ok(config)
    }
}

// =============================================================================
// Validated snapshot
// =============================================================================

/// Command name → parameter position of the message's subject nickname.
///
/// Immutable once built. A reload builds a fresh index and swaps it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialMessageIndex {
    /// Keyed by the folded command name.
    positions: HashMap<String, usize>,
}

impl SpecialMessageIndex {
    /// Validate `<specialmsg>` entries.
    ///
    /// Any entry without a command rejects the whole table. An `index`
    /// outside `0..=20` is reported and replaced by 0. A repeated command
    /// takes the position of its last entry.
    pub fn build(entries: &[SpecialMessageEntry]) -> Result<Self> {
        let mut positions = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let command = entry
                .command
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or(Error::MissingCommand { position })?;
            let index = entry.index.map_or(DEFAULT_SPECIAL_INDEX, |raw| {
                usize::try_from(raw)
                    .ok()
                    .filter(|idx| *idx <= MAX_SPECIAL_INDEX)
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            command,
                            value = raw,
                            "<specialmsg:index> is not between 0 and {MAX_SPECIAL_INDEX}; using {DEFAULT_SPECIAL_INDEX}"
                        );
                        DEFAULT_SPECIAL_INDEX
                    })
            });
            positions.insert(irc_fold(command), index);
        }
        Ok(Self { positions })
    }

    /// Convenience for building an index from `(command, index)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, i64)>) -> Result<Self> {
        let entries: Vec<SpecialMessageEntry> = pairs
            .into_iter()
            .map(|(command, index)| SpecialMessageEntry::new(command, index))
            .collect();
        Self::build(&entries)
    }

    /// Configured subject position for `command`, if it is a special message.
    #[must_use]
    pub fn position(&self, command: &str) -> Option<usize> {
        self.positions.get(&irc_fold(command)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Everything the tag engine reads while populating a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub index: SpecialMessageIndex,
    /// Namespace prefix for emitted tag names.
    pub vendor: String,
}

impl Settings {
    /// Validate a document into a snapshot. The vendor falls back to
    /// `server_name` when unset or empty.
    pub fn build(config: &TagsConfig, server_name: &str) -> Result<Self> {
        let index = SpecialMessageIndex::build(&config.special_messages)?;
        let vendor = config
            .tags
            .vendor
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(server_name)
            .to_string();
        Ok(Self { index, vendor })
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

static DOTENV: OnceLock<HashMap<String, String>> = OnceLock::new();

#[cfg(test)]
thread_local! {
    static TEST_OVERRIDES: std::cell::RefCell<HashMap<String, String>> =
        std::cell::RefCell::new(HashMap::new());
}

/// Look `key` up in the process environment, then in `./.env`.
#[must_use]
pub fn env_value(key: &str) -> Option<String> {
    #[cfg(test)]
    if let Some(value) = TEST_OVERRIDES.with(|overrides| overrides.borrow().get(key).cloned()) {
        return Some(value);
    }
    env::var(key).ok().or_else(|| {
        DOTENV
            .get_or_init(|| {
                fs::read_to_string(".env")
                    .map(|contents| parse_dotenv_contents(&contents))
                    .unwrap_or_default()
            })
            .get(key)
            .cloned()
    })
}

/// Parse `KEY=value` lines. Understands `#` comments, an `export ` prefix and
/// single or double quoted values; anything else is skipped.
#[must_use]
pub fn parse_dotenv_contents(contents: &str) -> HashMap<String, String> {
    contents.lines().filter_map(dotenv_line).collect()
}

fn dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let (key, value) = line
        .strip_prefix("export ")
        .unwrap_or(line)
        .split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then(|| (key.to_string(), dotenv_value(value.trim())))
}

fn dotenv_value(raw: &str) -> String {
    let quoted = raw
        .chars()
        .next()
        .filter(|c| matches!(*c, '"' | '\''))
        .and_then(|quote| {
            let body = &raw[1..];
            let end = body.find(quote)?;
            let rest = body[end + 1..].trim_start();
            (rest.is_empty() || rest.starts_with('#')).then(|| &body[..end])
        });
    quoted.unwrap_or_else(|| without_comment(raw)).to_string()
}

/// A `#` opens a comment at the start of the value or after whitespace.
fn without_comment(value: &str) -> &str {
    value
        .char_indices()
        .find(|&(at, c)| c == '#' && (at == 0 || value[..at].ends_with(char::is_whitespace)))
        .map_or(value, |(at, _)| value[..at].trim_end())
}
