//! Outgoing mail transports

use crate::config::MailConfig;
use crate::error::{MailError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MimeAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

/// A file attached to an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A ready-to-send message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<()>;
}

/// SMTP relay with STARTTLS and password login
pub struct SmtpTransport {
    config: MailConfig,
}

impl SmtpTransport {
    pub fn new(config: MailConfig) -> Result<Self> {
        if config.username.is_none() || config.password.is_none() {
            return Err(MailError::Delivery(
                "SMTP username and password must be set".to_string(),
            ));
        }
        Ok(Self { config })
    }

    fn build_message(envelope: &Envelope) -> Result<Message> {
        let from: Mailbox = envelope
            .from
            .parse()
            .map_err(|e| MailError::Message(format!("sender {}: {e}", envelope.from)))?;
        let to: Mailbox = envelope
            .to
            .parse()
            .map_err(|e| MailError::Message(format!("recipient {}: {e}", envelope.to)))?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(envelope.body.clone()));
        for attachment in &envelope.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse("application/octet-stream"))
                .map_err(|e| MailError::Message(e.to_string()))?;
            parts = parts.singlepart(
                MimeAttachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type),
            );
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(envelope.subject.clone())
            .multipart(parts)
            .map_err(|e| MailError::Message(e.to_string()))
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        let message = Self::build_message(&envelope)?;
        let credentials = Credentials::new(
            self.config.username.clone().unwrap_or_default(),
            self.config.password.clone().unwrap_or_default(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| MailError::Delivery(e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .timeout(Some(self.config.timeout()))
            .build();

        debug!(host = %self.config.smtp_host, port = self.config.smtp_port, "Sending over SMTP");
        mailer
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> Envelope {
        Envelope {
            from: "seller@gmail.com".to_string(),
            to: "buyer@example.com".to_string(),
            subject: "Car listing".to_string(),
            body: "See attached.".to_string(),
            attachments: vec![Attachment {
                filename: "car_listing.json".to_string(),
                content_type: "application/json".to_string(),
                bytes: b"{\"car\": {}}".to_vec(),
            }],
        }
    }

    #[test]
    fn test_build_message() {
        let message = SmtpTransport::build_message(&envelope()).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Subject: Car listing"));
        assert!(formatted.contains("car_listing.json"));
        assert!(formatted.contains("application/json"));
    }

    #[test]
    fn test_build_message_bad_sender() {
        let mut envelope = envelope();
        envelope.from = "not an address".to_string();
        assert!(matches!(
            SmtpTransport::build_message(&envelope),
            Err(MailError::Message(_))
        ));
    }

    #[test]
    fn test_requires_credentials() {
        assert!(SmtpTransport::new(MailConfig::default()).is_err());
        let config = MailConfig::default().with_credentials("u@gmail.com", "p");
        assert!(SmtpTransport::new(config).is_ok());
    }
}
