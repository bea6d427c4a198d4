//! Text normalization used only as a matching aid.
//!
//! Case-folds, strips accents through canonical decomposition, and
//! collapses every run of non-alphanumeric characters to one space. The
//! result is never shown to callers.

use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, accent-stripped, punctuation-collapsed form of a raw text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Words of the normalized text, in order.
    pub fn words(&self) -> Vec<&str> {
        self.0.split(' ').filter(|w| !w.is_empty()).collect()
    }

    /// Whole-word containment: `needle` must start and end on word edges.
    pub fn contains_phrase(&self, needle: &NormalizedText) -> bool {
        if needle.is_empty() || self.is_empty() {
            return false;
        }
        let haystack = format!(" {} ", self.0);
        haystack.contains(&format!(" {} ", needle.0))
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize `text` for rule matching.
pub fn normalize(text: &str) -> NormalizedText {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }

    NormalizedText(out)
}
