//! Sending a listing with its files attached

use crate::address::validate_and_normalize_address;
use crate::error::{MailError, Result};
use crate::transport::{Attachment, Envelope, Transport};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Addresses, attaches and hands messages to a [`Transport`]
pub struct Mailer {
    transport: Arc<dyn Transport>,
    from: String,
}

impl Mailer {
    pub fn new(transport: Arc<dyn Transport>, from: impl Into<String>) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }

    /// Send `body` to `to` with every readable file in `attachments`.
    ///
    /// The recipient is validated before anything else. Missing files are
    /// logged and skipped.
    pub async fn send_with_attachments<P: AsRef<Path>>(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[P],
    ) -> Result<()> {
        let to = validate_and_normalize_address(to)?;

        let mut files = Vec::with_capacity(attachments.len());
        for path in attachments {
            let path = path.as_ref();
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %path.display(), "Attachment not found, skipping");
                    continue;
                }
                Err(e) => return Err(MailError::Io(e)),
            };
            files.push(Attachment {
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "attachment".to_string()),
                content_type: guess_content_type(path).to_string(),
                bytes,
            });
        }

        let attached = files.len();
        self.transport
            .send(Envelope {
                from: self.from.clone(),
                to: to.clone(),
                subject: subject.to_string(),
                body: body.to_string(),
                attachments: files,
            })
            .await?;

        info!(to = %to, attachments = attached, "Email sent");
        Ok(())
    }
}

/// MIME type from a file extension
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => "application/json",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
