//! # Listing Mail
//!
//! Delivers extracted listings by email. Recipients must match the
//! `name@domain.com` rule; files are attached with a MIME type guessed
//! from their extension.
//!
//! ```rust,no_run
//! use listing_mail::{MailConfig, Mailer, SmtpTransport};
//! use std::sync::Arc;
//!
//! # async fn run() -> listing_mail::Result<()> {
//! let config = MailConfig::default().with_credentials("seller@gmail.com", "app-password");
//! let mailer = Mailer::new(Arc::new(SmtpTransport::new(config)?), "seller@gmail.com");
//! mailer
//!     .send_with_attachments("Buyer@Example.com", "Car listing", "Attached.", &["car_listing.json"])
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod config;
pub mod error;
pub mod mailer;
pub mod transport;

pub use address::validate_and_normalize_address;
pub use config::MailConfig;
pub use error::{MailError, Result};
pub use mailer::Mailer;
pub use transport::{Attachment, Envelope, SmtpTransport, Transport};
