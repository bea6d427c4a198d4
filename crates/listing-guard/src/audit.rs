//! Audit logging for safety verdicts

use crate::config::AuditConfig;
use crate::types::{Direction, SafetyVerdict};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Audit log entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Direction (input/output)
    pub direction: Direction,
    /// Original content hash
    pub content_hash: String,
    /// Whether the content passed
    pub is_safe: bool,
    /// Rules that fired
    pub flagged: Vec<String>,
}

/// Audit logger
pub struct AuditLogger {
    config: AuditConfig,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Log a verdict. Returns the entry that was emitted, if any.
    pub fn log(
        &self,
        direction: Direction,
        content: &str,
        verdict: &SafetyVerdict,
    ) -> Option<AuditEntry> {
        if !self.config.enabled {
            return None;
        }

        let entry = AuditEntry {
            direction,
            content_hash: hash_content(content),
            is_safe: verdict.is_safe,
            flagged: verdict.flagged_list(),
        };

        let content_field = if self.config.log_content {
            Some(truncate(content, 200))
        } else {
            None
        };

        if entry.is_safe {
            debug!(
                direction = %entry.direction,
                content_hash = %entry.content_hash,
                "Guard audit: passed"
            );
        } else {
            warn!(
                direction = %entry.direction,
                content_hash = %entry.content_hash,
                flagged = ?entry.flagged,
                content = ?content_field,
                "Guard audit: unsafe content"
            );
        }

        Some(entry)
    }
}

/// Hash content for audit (privacy-preserving)
fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Truncate string for logging
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_hash_content() {
        let hash1 = hash_content("test");
        let hash2 = hash_content("test");
        let hash3 = hash_content("different");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a longer string", 10), "this is a ...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_audit_disabled() {
        let logger = AuditLogger::new(AuditConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(logger
            .log(Direction::Input, "test content", &SafetyVerdict::safe())
            .is_none());
    }

    #[test]
    fn test_audit_entry_carries_flagged_terms() {
        let logger = AuditLogger::new(AuditConfig::default());
        let verdict =
            SafetyVerdict::from_flagged(BTreeSet::from(["shutdown".to_string()]));
        let entry = logger
            .log(Direction::Output, "please shutdown", &verdict)
            .unwrap();

        assert!(!entry.is_safe);
        assert_eq!(entry.flagged, vec!["shutdown".to_string()]);
        assert_eq!(entry.content_hash, hash_content("please shutdown"));
    }
}
