//! Core types for the safety filter

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of checking one text against the rule set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// Whether no rule fired
    pub is_safe: bool,
    /// Identifiers of every rule that fired
    pub flagged: BTreeSet<String>,
}

impl SafetyVerdict {
    /// Build a verdict from the set of flagged rule identifiers
    pub fn from_flagged(flagged: BTreeSet<String>) -> Self {
        Self {
            is_safe: flagged.is_empty(),
            flagged,
        }
    }

    /// Verdict for text that triggered nothing
    pub fn safe() -> Self {
        Self::from_flagged(BTreeSet::new())
    }

    /// Flagged terms as an owned list, in sorted order
    pub fn flagged_list(&self) -> Vec<String> {
        self.flagged.iter().cloned().collect()
    }
}

/// How a rule matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    /// Case-insensitive word-boundary match on the raw sentence
    WordBoundary,
    /// Word-boundary match on the normalized sentence
    Normalized,
    /// Similarity ratio above the configured threshold
    Fuzzy,
    /// Dangerous verb-noun pattern
    Pattern,
    /// Context-safe keyword next to a dangerous pattern
    Contextual,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::WordBoundary => write!(f, "word-boundary"),
            MatchKind::Normalized => write!(f, "normalized"),
            MatchKind::Fuzzy => write!(f, "fuzzy"),
            MatchKind::Pattern => write!(f, "pattern"),
            MatchKind::Contextual => write!(f, "contextual"),
        }
    }
}

/// A single rule hit inside one sentence
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Rule identifier (keyword phrase or `pattern:<name>`)
    pub rule: String,
    /// How it matched
    pub kind: MatchKind,
    /// Byte span in the sentence, when the match maps onto raw text
    pub span: Option<(usize, usize)>,
}

/// Direction of content flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Text on its way to the model
    Input,
    /// Text produced by the model
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}
