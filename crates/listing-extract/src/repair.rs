//! Recovering a JSON record from free-form model text
//!
//! Models wrap JSON in markdown fences, use typographic quotes and leave
//! trailing commas. These helpers undo that before parsing and make sure
//! the result sits under the record's single top-level key.

use crate::config::DEFAULT_WRAPPING_KEY;
use crate::error::{ExtractError, Result};
use serde_json::{Map, Value};
use std::future::Future;
use tracing::{debug, warn};

/// Return the JSON-looking payload of `raw`.
///
/// The first fenced block labelled `json` wins, then the first unlabelled
/// fence whose body starts like JSON. Otherwise the trimmed input.
pub fn extract_candidate(raw: &str) -> String {
    let mut rest = raw;
    let mut unlabelled = None;

    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let label_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        let label = &after[..label_len];
        let body = &after[label_len..];

        let Some(close) = body.find("```") else {
            break;
        };
        let inner = body[..close].trim();

        if label.eq_ignore_ascii_case("json") {
            return inner.to_string();
        }
        if unlabelled.is_none()
            && label.is_empty()
            && (inner.starts_with('{') || inner.starts_with('['))
        {
            unlabelled = Some(inner.to_string());
        }
        rest = &body[close + 3..];
    }

    unlabelled.unwrap_or_else(|| raw.trim().to_string())
}

/// Straighten typographic quotes and drop trailing commas before `}` or `]`.
///
/// Commas inside string literals are left alone.
pub fn clean_candidate(candidate: &str) -> String {
    let straightened: String = candidate.chars().map(straighten_quote).collect();

    let chars: Vec<char> = straightened.chars().collect();
    let mut out = String::with_capacity(straightened.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn straighten_quote(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
        other => other,
    }
}

/// Wrap `value` under `key` unless it already holds `key` at the top level.
///
/// An object holding `key` next to other keys is returned as is, so
/// [`check_shape`] rejects it instead of nesting the key inside itself.
pub fn ensure_wrapping_key(value: Value, key: &str) -> Value {
    match &value {
        Value::Object(map) if map.contains_key(key) => value,
        _ => {
            let mut wrapped = Map::new();
            wrapped.insert(key.to_string(), value);
            Value::Object(wrapped)
        }
    }
}

/// Check that `value` is `{key: {...}}`
pub fn check_shape(value: &Value, key: &str) -> std::result::Result<(), String> {
    match value.as_object() {
        Some(map) if map.len() == 1 => match map.get(key) {
            Some(Value::Object(_)) => Ok(()),
            Some(_) => Err(format!("'{key}' is not an object")),
            None => Err(format!("missing top-level '{key}' key")),
        },
        Some(_) => Err(format!("expected a single top-level '{key}' key")),
        None => Err("expected a JSON object".to_string()),
    }
}

/// Parser for model output with a fixed wrapping key
#[derive(Debug, Clone)]
pub struct OutputRepair {
    wrapping_key: String,
}

impl Default for OutputRepair {
    fn default() -> Self {
        Self::new(DEFAULT_WRAPPING_KEY)
    }
}

impl OutputRepair {
    pub fn new(wrapping_key: impl Into<String>) -> Self {
        Self {
            wrapping_key: wrapping_key.into(),
        }
    }

    pub fn wrapping_key(&self) -> &str {
        &self.wrapping_key
    }

    /// Extract, clean, parse and wrap `raw` in one pass
    pub fn parse_once(&self, raw: &str) -> Result<Value> {
        let candidate = clean_candidate(&extract_candidate(raw));
        let malformed = |reason: String| ExtractError::MalformedOutput {
            last_text: raw.to_string(),
            reason,
        };

        let parsed: Value =
            serde_json::from_str(&candidate).map_err(|e| malformed(e.to_string()))?;
        let value = ensure_wrapping_key(parsed, &self.wrapping_key);
        check_shape(&value, &self.wrapping_key).map_err(malformed)?;
        Ok(value)
    }

    /// Parse `raw`, asking `repair` for a corrected text after each failure.
    ///
    /// At most `max_attempts` parses are made (zero counts as one). Errors
    /// from `repair` are returned as-is; exhausting the attempts yields
    /// [`ExtractError::MalformedOutput`] for the last text tried.
    pub async fn parse_with_repair<F, Fut>(
        &self,
        raw: &str,
        max_attempts: usize,
        mut repair: F,
    ) -> Result<Value>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut current = raw.to_string();
        let mut attempt = 1;

        loop {
            match self.parse_once(&current) {
                Ok(value) => {
                    debug!(attempt, "Parsed model output");
                    return Ok(value);
                }
                Err(err) if attempt >= max_attempts => return Err(err),
                Err(err) => {
                    warn!(attempt, error = %err, "Model output did not parse, requesting repair");
                    current = repair(current).await?;
                    attempt += 1;
                }
            }
        }
    }
}
