//! SMTP settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// App password for the SMTP account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Sender address; defaults to `username`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: None,
            password: None,
            from: None,
            timeout_secs: 30,
        }
    }
}

impl MailConfig {
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sender address, falling back to the login name
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MailConfig::default();
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert!(config.sender().is_none());
    }

    #[test]
    fn test_sender_falls_back_to_username() {
        let config = MailConfig::default().with_credentials("seller@gmail.com", "app-pass");
        assert_eq!(config.sender(), Some("seller@gmail.com"));

        let config = MailConfig {
            from: Some("listings@dealer.com".to_string()),
            ..config
        };
        assert_eq!(config.sender(), Some("listings@dealer.com"));
    }
}
