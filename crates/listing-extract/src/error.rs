//! Error types for listing extraction

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Description is empty")]
    EmptyInput,

    #[error("Input contains unsafe content: {flagged:?}")]
    UnsafeInput { flagged: Vec<String> },

    #[error("Model output contains unsafe content: {flagged:?}")]
    UnsafeOutput { flagged: Vec<String> },

    #[error("Malformed model output ({reason}): {last_text}")]
    MalformedOutput { last_text: String, reason: String },

    #[error("Gave up after {attempts} attempts (last flagged: {flagged:?}): {last_output}")]
    RetryExhausted {
        attempts: usize,
        flagged: Vec<String>,
        last_output: String,
    },

    #[error("Model call timed out after {0} seconds")]
    OracleTimeout(u64),

    #[error("Model error: {0}")]
    Oracle(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Flagged terms carried by a safety failure, if any
    pub fn flagged(&self) -> &[String] {
        match self {
            ExtractError::UnsafeInput { flagged }
            | ExtractError::UnsafeOutput { flagged }
            | ExtractError::RetryExhausted { flagged, .. } => flagged,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
