//! Sheet naming policy
//!
//! Excel constrains worksheet names to at most 31 characters and forbids
//! `: \ / ? * [ ]`. These helpers sanitize, truncate and de-duplicate the
//! names chosen for copied sheets. All three are pure; only [`make_unique`]
//! can fail, and only on the practically unreachable suffix-exhaustion path.

use std::collections::HashSet;

use crate::error::{MergeError, Result};

/// Maximum length of a worksheet name.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Label substituted when sanitization leaves nothing.
pub const DEFAULT_SHEET_NAME: &str = "Sheet";

const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// Replace each illegal character with `_` and trim surrounding whitespace.
/// An empty result becomes [`DEFAULT_SHEET_NAME`].
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Keep the first `max_len` characters of `name`.
pub fn truncate(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect()
}

/// Sanitize and truncate `desired`, then make it unique against `existing`
/// by probing `_2`, `_3`, … suffixes, shortening the base so that
/// `base + suffix` still fits in 31 characters.
///
/// The probe bound (9999 candidates) is a safety valve; exhausting it is a
/// configuration error, not an expected outcome.
pub fn make_unique(existing: &HashSet<String>, desired: &str) -> Result<String> {
    let base = truncate(&sanitize(desired), MAX_SHEET_NAME_LEN);
    if !existing.contains(&base) {
        return Ok(base);
    }

    for n in 2..10_000u32 {
        let suffix = format!("_{n}");
        let max_base = MAX_SHEET_NAME_LEN - suffix.len();
        let candidate = format!("{}{}", truncate(&base, max_base), suffix);
        if !existing.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(MergeError::NameSpaceExhausted(desired.to_string()))
}
