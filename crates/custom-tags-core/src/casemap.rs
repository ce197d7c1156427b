//! IRC `rfc1459` casemapping.
//!
//! Tag names, nicknames and command names compare case-insensitively where
//! `A-Z` fold to `a-z` and `[]\~` fold to `{}|^`. Everything outside ASCII is
//! compared byte-for-byte.

/// Fold a single character under `rfc1459`.
#[inline]
#[must_use]
pub const fn fold_char(c: char) -> char {
    match c {
        'A'..='Z' => c.to_ascii_lowercase(),
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Fold a string into its canonical lookup key.
#[must_use]
pub fn irc_fold(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Case-insensitive equality under `rfc1459`.
#[must_use]
pub fn irc_equals(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.chars()
            .zip(b.chars())
            .all(|(x, y)| fold_char(x) == fold_char(y))
}
