//! Recipient address validation
//!
//! Only `localpart@domain.com` addresses are accepted; many valid
//! addresses on other domains are rejected.

use crate::error::{MailError, Result};

/// Trim, lowercase and validate `address`, returning the normalized form
pub fn validate_and_normalize_address(address: &str) -> Result<String> {
    let normalized = address.trim().to_lowercase();
    let invalid =
        |reason: &str| Err(MailError::AddressValidation(format!("{reason}: {address:?}")));

    if normalized.is_empty() {
        return invalid("address is empty");
    }
    let Some((local, domain)) = normalized.split_once('@') else {
        return invalid("missing '@'");
    };
    if domain.contains('@') {
        return invalid("more than one '@'");
    }
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return invalid("invalid local part");
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return invalid("invalid dots in local part");
    }

    let label_ok = domain.strip_suffix(".com").is_some_and(|label| {
        !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !label_ok {
        return invalid("address must look like name@domain.com");
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(
            validate_and_normalize_address("User@Example.COM").unwrap(),
            "user@example.com"
        );
        assert_eq!(
            validate_and_normalize_address("  seller.one+cars@my-dealer.com \n").unwrap(),
            "seller.one+cars@my-dealer.com"
        );
    }

    #[test]
    fn test_rejects_other_tlds() {
        for address in ["user@example.org", "user@example.co.uk", "user@mail.example.com"] {
            assert!(
                matches!(
                    validate_and_normalize_address(address),
                    Err(MailError::AddressValidation(_))
                ),
                "{address} accepted"
            );
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for address in [
            "",
            "   ",
            "no-at-sign.com",
            "@example.com",
            "a@b@example.com",
            "first last@example.com",
            ".user@example.com",
            "user..name@example.com",
            "user@.com",
            "user@exa_mple.com",
        ] {
            assert!(
                validate_and_normalize_address(address).is_err(),
                "{address:?} accepted"
            );
        }
    }
}
