//! Built-in block rules
//!
//! The rule set is compiled once per process and shared read-only. Extra
//! keywords from configuration produce a separate owned copy.

use crate::normalize::{normalize, NormalizedText};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Unsafe-intent vocabulary. Any match flags the sentence.
const UNCONDITIONAL_KEYWORDS: &[&str] = &[
    // Prompt override
    "ignore previous",
    "ignore all previous",
    "disregard previous",
    "disregard your instructions",
    "forget your instructions",
    "forget everything",
    "new instructions",
    "bypass restrictions",
    "bypass the filter",
    "jailbreak",
    "developer mode",
    "do anything now",
    // Prompt extraction
    "system prompt",
    "reveal your prompt",
    "print your prompt",
    // Destructive system commands
    "system command",
    "delete all",
    "shutdown",
    "format disk",
    "rm -rf",
    "drop table",
    "wipe the disk",
    "sudo",
    // Exfiltration
    "exfiltrate",
    "send me the password",
    "api key",
];

/// Words that are legitimate in a listing and only count next to a
/// dangerous pattern.
const CONTEXT_SAFE_KEYWORDS: &[&str] = &[
    "token", "script", "connect", "connection", "key", "link", "code", "file", "system",
    "password", "url", "command", "shell", "disk",
];

/// Dangerous verb-noun combinations, matched within one sentence. Line
/// breaks inside a sentence do not stop a match.
const DANGER_PATTERNS: &[(&str, &str)] = &[
    (
        "override_instructions",
        r"(?is)\b(?:ignore|bypass|override|disregard|skip)\b.*?\b(?:instructions?|constraints?|rules|guardrails?|prompts?|filters?)\b",
    ),
    (
        "destroy_storage",
        r"(?is)\b(?:delete|erase|format|wipe)\b.*?\b(?:disks?|drives?|files?|system|database|directory|directories)\b",
    ),
    (
        "execute_code",
        r"(?is)\b(?:run|execute|eval)\b.*?\b(?:code|scripts?|commands?|shell|payloads?)\b",
    ),
    (
        "leak_secret",
        r"(?is)\b(?:reveal|send|leak|expose|dump)\b.*?\b(?:passwords?|tokens?|keys?|secrets?|credentials?)\b",
    ),
    (
        "follow_link",
        r"(?is)\b(?:visit|click|follow)\b.*?\b(?:urls?|links?)\b",
    ),
    (
        "role_override",
        r"(?is)\b(?:pretend|act\s+as\s+if|act\s+as\s+though)\b.*?\b(?:rules?|restrictions?|limits?|guidelines?)\b",
    ),
];

static BUILTIN: Lazy<Arc<RuleSet>> = Lazy::new(|| Arc::new(RuleSet::builtin()));

/// A keyword with its precompiled matchers
#[derive(Debug, Clone)]
pub struct KeywordRule {
    /// The phrase as written, used as the rule identifier
    pub phrase: String,
    /// Normalized phrase for normalized and fuzzy matching
    pub normalized: NormalizedText,
    /// Number of words in the normalized phrase
    pub word_count: usize,
    regex: Option<Regex>,
}

impl KeywordRule {
    /// Compile a keyword rule. A phrase that cannot be compiled keeps only
    /// its normalized matchers.
    pub fn new(phrase: &str) -> Self {
        let normalized = normalize(phrase);
        let word_count = normalized.words().len();
        Self {
            phrase: phrase.trim().to_string(),
            regex: boundary_regex(phrase),
            normalized,
            word_count,
        }
    }

    /// Case-insensitive word-boundary matches against raw text
    pub fn find_spans(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            None => vec![],
        }
    }
}

/// A named dangerous verb-noun pattern
#[derive(Debug, Clone)]
pub struct DangerPattern {
    pub name: &'static str,
    pub regex: Regex,
}

impl DangerPattern {
    /// Identifier reported in flagged terms
    pub fn rule_id(&self) -> String {
        format!("pattern:{}", self.name)
    }
}

/// The full set of block rules
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub keywords: Vec<KeywordRule>,
    pub context_safe: Vec<KeywordRule>,
    pub patterns: Vec<DangerPattern>,
}

impl RuleSet {
    /// Compile the built-in rules
    pub fn builtin() -> Self {
        let keywords = UNCONDITIONAL_KEYWORDS
            .iter()
            .map(|k| KeywordRule::new(k))
            .collect();
        let context_safe = CONTEXT_SAFE_KEYWORDS
            .iter()
            .map(|k| KeywordRule::new(&format!("{k}s?")))
            .map(|mut rule| {
                // Identifier and normalized form drop the plural suffix
                rule.phrase = rule.phrase.trim_end_matches("s?").to_string();
                rule.normalized = normalize(&rule.phrase);
                rule
            })
            .collect();
        // Built-in patterns are constants; one that fails to compile is skipped
        let patterns = DANGER_PATTERNS
            .iter()
            .filter_map(|&(name, pattern)| {
                Regex::new(pattern)
                    .ok()
                    .map(|regex| DangerPattern { name, regex })
            })
            .collect();

        Self {
            keywords,
            context_safe,
            patterns,
        }
    }

    /// The process-wide built-in rule set
    pub fn shared() -> Arc<RuleSet> {
        BUILTIN.clone()
    }

    /// Built-in rules plus extra unconditional keywords
    pub fn with_extra_keywords(extra: &[String]) -> Self {
        let mut rules = BUILTIN.as_ref().clone();
        for keyword in extra {
            if normalize(keyword).is_empty() {
                continue;
            }
            if rules.keywords.iter().any(|k| k.phrase.eq_ignore_ascii_case(keyword.trim())) {
                continue;
            }
            rules.keywords.push(KeywordRule::new(keyword));
        }
        rules
    }
}

/// Build a case-insensitive regex for `phrase`, with word boundaries on
/// whichever ends are word characters and flexible whitespace inside.
fn boundary_regex(phrase: &str) -> Option<Regex> {
    let phrase = phrase.trim();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let first = phrase.chars().next()?;
    let last = phrase.chars().last()?;

    // Keep a trailing `s?` plural marker unescaped
    let (body, plural) = match phrase.strip_suffix("s?") {
        Some(stem) if !stem.is_empty() => (stem, "s?"),
        _ => (phrase, ""),
    };
    let body = body
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    let start = if is_word(first) { r"\b" } else { "" };
    let end = if plural.is_empty() && !is_word(last) {
        ""
    } else {
        r"\b"
    };

    Regex::new(&format!("(?i){start}{body}{plural}{end}")).ok()
}
