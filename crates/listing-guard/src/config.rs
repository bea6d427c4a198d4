//! Configuration for the safety filter

use serde::{Deserialize, Serialize};

/// Default similarity ratio at or above which a fuzzy match counts
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

/// Default marker written over redacted spans
pub const DEFAULT_REDACTION_MARKER: &str = "[REDACTED]";

/// Main configuration for the guard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Matching configuration
    pub safety: SafetyConfig,
    /// Audit configuration
    pub audit: AuditConfig,
}

/// Matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Fuzzy similarity threshold (0.0-1.0)
    pub fuzzy_threshold: f64,
    /// Character that separates sentence-like units
    pub sentence_delimiter: char,
    /// Replacement text for redacted spans
    pub redaction_marker: String,
    /// Additional unconditional keywords
    pub extra_keywords: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            sentence_delimiter: '.',
            redaction_marker: DEFAULT_REDACTION_MARKER.to_string(),
            extra_keywords: vec![],
        }
    }
}

impl SafetyConfig {
    /// Set the fuzzy threshold, clamped to 0.0-1.0
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Add an unconditional keyword
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.extra_keywords.push(keyword.into());
        self
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable audit logging
    pub enabled: bool,
    /// Log content excerpts (vs. just hashes)
    pub log_content: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_content: false, // Privacy by default
        }
    }
}
