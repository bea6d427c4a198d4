//! # Listing Config
//!
//! One TOML file configures every listing component. It lives at
//! `~/.config/listing/listing.toml` unless a path is given, and the
//! `AZURE_*` / `GMAIL_*` environment variables override what it says.
//!
//! ```toml
//! output_file = "car_listing.json"
//!
//! [oracle]
//! endpoint = "https://my-resource.openai.azure.com"
//! deployment = "gpt-4o-mini"
//!
//! [pipeline]
//! max_retries = 3
//!
//! [guard.safety]
//! fuzzy_threshold = 0.85
//!
//! [mail]
//! smtp_host = "smtp.gmail.com"
//! ```

use listing_extract::{ClassifierConfig, OracleConfig, PipelineConfig};
use listing_guard::GuardConfig;
use listing_mail::MailConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Azure OpenAI resource URL
pub const ENV_AZURE_ENDPOINT: &str = "AZURE_ENDPOINT";
/// Azure OpenAI key
pub const ENV_AZURE_KEY: &str = "AZURE_OPENAI_KEY";
/// Azure deployment name
pub const ENV_AZURE_DEPLOYMENT: &str = "AZURE_DEPLOYMENT_NAME";
/// Gmail account used to send listings
pub const ENV_GMAIL_ADDRESS: &str = "GMAIL_ADDRESS";
/// Gmail app password
pub const ENV_GMAIL_PASSWORD: &str = "GMAIL_APP_PASSWORD";

const CONFIG_FILE: &str = "listing.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Missing setting: {0}")]
    Missing(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for every listing component
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the extracted record is written
    pub output_file: PathBuf,
    pub oracle: OracleConfig,
    pub pipeline: PipelineConfig,
    pub guard: GuardConfig,
    pub mail: MailConfig,
    pub classifier: ClassifierConfig,
}

impl AppConfig {
    /// `~/.config/listing/listing.toml`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("listing").join(CONFIG_FILE))
            .ok_or_else(|| ConfigError::Missing("user config directory".to_string()))
    }

    /// Load from `path`, or from the default location. A missing default
    /// file is created with defaults; a missing explicit file is an error.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    let config = Self::default();
                    config.save_to(&path)?;
                    info!(path = %path.display(), "Created default config");
                    config
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse one config file, no overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply `AZURE_*` and `GMAIL_*` variables from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_AZURE_ENDPOINT) {
            self.oracle.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(key) = get(ENV_AZURE_KEY) {
            self.oracle.api_key = Some(key);
        }
        if let Some(deployment) = get(ENV_AZURE_DEPLOYMENT) {
            self.oracle.deployment = Some(deployment);
        }
        if let Some(address) = get(ENV_GMAIL_ADDRESS) {
            self.mail.username = Some(address);
        }
        if let Some(password) = get(ENV_GMAIL_PASSWORD) {
            self.mail.password = Some(password);
        }
    }

    /// Mail settings, if they are complete enough to send
    pub fn require_mail(&self) -> Result<&MailConfig> {
        if self.mail.username.is_none() {
            return Err(ConfigError::Missing(format!(
                "mail.username (or {ENV_GMAIL_ADDRESS})"
            )));
        }
        if self.mail.password.is_none() {
            return Err(ConfigError::Missing(format!(
                "mail.password (or {ENV_GMAIL_PASSWORD})"
            )));
        }
        Ok(&self.mail)
    }

    /// Record destination, defaulting to `car_listing.json`
    pub fn output_file(&self) -> &Path {
        if self.output_file.as_os_str().is_empty() {
            Path::new("car_listing.json")
        } else {
            &self.output_file
        }
    }
}
