use lettre::{EmailAddress, Envelope, SendableEmail};
use mail_builder::MessageBuilder;
use uuid::Uuid;

use crate::message::OutboundMessage;
use crate::transport::{TransportError, TransportErrorKind};

/// A message rendered to RFC 5322 bytes, ready for delivery.
#[derive(Debug, Clone, Default)]
pub struct PreparedEmail {
    pub to: Vec<String>,
    pub from: String,
    pub message_id: String,
    pub message: Vec<u8>,
}

pub fn prepare_email(message: &OutboundMessage, helo_name: &str) -> Result<PreparedEmail, TransportError> {
    let message_id = format!("{}@{}", Uuid::new_v4().to_hyphenated(), helo_name);

    // mail-builder adds Date and MIME-Version, folds and encodes the headers
    // and picks the transfer encoding of each part
    let mut builder = MessageBuilder::new()
        .from((message.from_display_name.as_str(), message.from.as_str()))
        .to(message.to.as_str())
        .subject(message.subject.as_str())
        .message_id(message_id.as_str())
        .html_body(message.html_body.as_str());

    for attachment in &message.attachments {
        builder = builder.attachment(
            attachment.content_type.as_str(),
            attachment.filename.as_str(),
            &attachment.data[..],
        );
    }

    let bytes = builder.write_to_vec().map_err(|e| {
        TransportError::new(TransportErrorKind::Message, format!("Unable to render message: {}", e))
    })?;

    Ok(PreparedEmail {
        to: vec![message.to.clone()],
        from: message.from.clone(),
        message_id,
        message: bytes,
    })
}

impl PreparedEmail {
    pub fn as_sendable_email(&self) -> Result<SendableEmail, lettre::error::Error> {
        let to = self
            .to
            .iter()
            .map(|s| EmailAddress::new(s.clone()))
            .collect::<Result<Vec<EmailAddress>, _>>()?;
        let envelope = Envelope::new(Some(EmailAddress::new(self.from.clone())?), to)?;
        Ok(SendableEmail::new(envelope, self.message_id.clone(), self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Attachment;

    // RFC 5322 section 2.1.1
    const MAX_LINE: usize = 998;

    fn message() -> OutboundMessage {
        OutboundMessage {
            subject: "Reminder".to_owned(),
            html_body: "<p>See you tomorrow</p>".to_owned(),
            attachments: vec![Attachment::new("agenda.txt", b"1. intro\n2. demo\n".to_vec())],
            to: "4155551234@txt.att.net".to_owned(),
            from: "alerts@example.com".to_owned(),
            from_display_name: "Example Alerts".to_owned(),
        }
    }

    fn rendered(message: &OutboundMessage) -> String {
        let prepared = prepare_email(message, "mx.example.com").unwrap();
        String::from_utf8(prepared.message).unwrap()
    }

    fn longest_line(text: &str) -> usize {
        text.split("\r\n").map(str::len).max().unwrap_or(0)
    }

    #[test]
    fn test_prepare_multipart() {
        let prepared = prepare_email(&message(), "mx.example.com").unwrap();
        let text = String::from_utf8(prepared.message.clone()).unwrap();

        assert_eq!(prepared.to, vec!["4155551234@txt.att.net".to_owned()]);
        assert_eq!(prepared.from, "alerts@example.com");
        assert!(prepared.message_id.ends_with("@mx.example.com"));
        assert!(text.contains(&prepared.message_id));
        assert!(text.contains("Subject: Reminder"));
        assert!(text.contains("Example Alerts"));
        assert!(text.contains("multipart/mixed"));
        assert!(text.contains("text/html"));
        assert!(text.contains("agenda.txt"));
    }

    #[test]
    fn test_long_non_ascii_subject_is_folded() {
        let mut m = message();
        m.subject = "Caf\u{e9} ".repeat(200);
        let text = rendered(&m);

        assert!(text.contains("=?utf-8?") || text.contains("=?UTF-8?"));
        assert!(longest_line(&text) <= MAX_LINE);
    }

    #[test]
    fn test_long_ascii_subject_is_folded() {
        let mut m = message();
        m.subject = "Quarterly schedule update ".repeat(47);
        assert!(m.subject.len() > 1200);
        assert!(longest_line(&rendered(&m)) <= MAX_LINE);
    }

    #[test]
    fn test_attachment_filename_keeps_quotes() {
        let mut m = message();
        m.attachments = vec![Attachment::new("report \"final\".txt", vec![0u8; 300])];
        let text = rendered(&m);

        assert!(text.contains("final"));
        assert!(!text.contains("report final.txt"));
        assert!(longest_line(&text) <= MAX_LINE);
    }

    #[test]
    fn test_sendable_email_envelope() {
        let prepared = prepare_email(&message(), "localhost").unwrap();
        assert!(prepared.as_sendable_email().is_ok());
    }
}
