//! Mailer behaviour with an in-memory transport

use async_trait::async_trait;
use listing_mail::{Envelope, MailError, Mailer, Result, Transport};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<Envelope>>,
    fail: bool,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        if self.fail {
            return Err(MailError::Delivery("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(envelope);
        Ok(())
    }
}

#[tokio::test]
async fn sends_normalized_recipient_with_attachments() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("car_listing.json");
    let photo = dir.path().join("photo.png");
    std::fs::write(&json, br#"{"car": {"brand": "Ford"}}"#).unwrap();
    std::fs::write(&photo, [0x89, b'P', b'N', b'G']).unwrap();

    let transport = Arc::new(RecordingTransport::default());
    let mailer = Mailer::new(transport.clone(), "seller@gmail.com");
    mailer
        .send_with_attachments(
            "User@Example.COM",
            "Your Car Listing JSON",
            "Attached.",
            &[&json, &photo],
        )
        .await
        .unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "user@example.com");
    assert_eq!(sent[0].from, "seller@gmail.com");
    assert_eq!(sent[0].attachments.len(), 2);
    assert_eq!(sent[0].attachments[0].filename, "car_listing.json");
    assert_eq!(sent[0].attachments[0].content_type, "application/json");
    assert_eq!(sent[0].attachments[1].content_type, "image/png");
}

#[tokio::test]
async fn missing_attachment_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let json = dir.path().join("car_listing.json");
    std::fs::write(&json, b"{}").unwrap();
    let missing = dir.path().join("missing.jpg");

    let transport = Arc::new(RecordingTransport::default());
    Mailer::new(transport.clone(), "seller@gmail.com")
        .send_with_attachments("buyer@example.com", "Listing", "", &[&missing, &json])
        .await
        .unwrap();

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent[0].attachments.len(), 1);
    assert_eq!(sent[0].attachments[0].filename, "car_listing.json");
}

#[tokio::test]
async fn invalid_address_sends_nothing() {
    let transport = Arc::new(RecordingTransport::default());
    let err = Mailer::new(transport.clone(), "seller@gmail.com")
        .send_with_attachments::<&str>("user@example.org", "Listing", "", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::AddressValidation(_)));
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failure_is_delivery_error() {
    let transport = Arc::new(RecordingTransport {
        fail: true,
        ..Default::default()
    });
    let err = Mailer::new(transport, "seller@gmail.com")
        .send_with_attachments::<&str>("buyer@example.com", "Listing", "", &[])
        .await
        .unwrap_err();

    assert!(matches!(err, MailError::Delivery(_)));
}
