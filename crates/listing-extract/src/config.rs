//! Configuration for the model connection and the extraction pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Azure OpenAI API version
pub const DEFAULT_API_VERSION: &str = "2025-01-01-preview";

/// Default top-level key of a listing record
pub const DEFAULT_WRAPPING_KEY: &str = "car";

/// Default category reported for a readable image
pub const DEFAULT_IMAGE_CATEGORY: &str = "hatchback";

/// Chat-completions endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL, e.g. `https://my-resource.openai.azure.com` or
    /// `https://api.openai.com/v1`
    pub endpoint: String,
    /// API key. Sent as `api-key` for Azure deployments, bearer otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Azure deployment name. When set, Azure URL and auth conventions apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
    /// Azure API version query parameter
    pub api_version: String,
    /// Model name, sent only to non-Azure endpoints
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            deployment: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            max_tokens: None,
        }
    }
}

impl OracleConfig {
    /// Azure OpenAI deployment settings
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            deployment: Some(deployment.into()),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Whether requests follow Azure OpenAI conventions
    pub fn is_azure(&self) -> bool {
        self.deployment.is_some()
    }

    /// Chat-completions URL for this endpoint
    pub fn completions_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        match &self.deployment {
            Some(deployment) => format!(
                "{base}/openai/deployments/{deployment}/chat/completions?api-version={}",
                self.api_version
            ),
            None => format!("{base}/chat/completions"),
        }
    }
}

/// Retry and repair limits for one extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum model attempts per extraction. Zero is treated as one.
    pub max_retries: usize,
    /// Maximum parse attempts when repairing a stored payload
    pub repair_attempts: usize,
    /// Required top-level key of every record
    pub wrapping_key: String,
    /// Deadline for a single model call
    pub oracle_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            repair_attempts: 2,
            wrapping_key: DEFAULT_WRAPPING_KEY.to_string(),
            oracle_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs.max(1))
    }
}

/// Image hint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Category reported for any readable image
    pub fixed_category: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            fixed_category: DEFAULT_IMAGE_CATEGORY.to_string(),
        }
    }
}
