//! Input normalization.
//!
//! Every downstream matcher works on the normalized form: lower-case, no
//! diacritics, single spaces, bounded length.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Default cap on normalized input length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 500;

/// Normalize `text` for matching.
///
/// Lower-cases, decomposes (NFD) and drops combining marks, collapses runs of
/// whitespace, then truncates to `max_chars` characters. Idempotent for a
/// fixed `max_chars`.
pub fn normalize(text: &str, max_chars: usize) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_chars).collect();
    truncated.trim_end().to_string()
}

/// Raw user text together with its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub raw: String,
    pub normalized: String,
}

impl Message {
    pub fn new(raw: impl Into<String>, max_chars: usize) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw, max_chars);
        Self { raw, normalized }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}
