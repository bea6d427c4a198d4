//! Error types for listing delivery

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    AddressValidation(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Could not build message: {0}")]
    Message(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MailError>;
