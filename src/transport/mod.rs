mod smtp;

pub use self::smtp::SmtpTransport;

use crate::message::OutboundMessage;
use crate::relay::RelayIdentity;

/// Broad cause of a failed handoff. The dispatcher does not act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not resolve or reach the relay
    Connection,
    Tls,
    /// The relay refused the message with a 4xx reply
    TransientRejection,
    /// The relay refused the message with a 5xx reply
    PermanentRejection,
    /// The message could not be formed (bad address, bad header)
    Message,
    Other,
}

/// A failed handoff, carried as data into the attempt outcome
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "{}", reason)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub reason: String,
}

impl TransportError {
    pub fn new<S: Into<String>>(kind: TransportErrorKind, reason: S) -> TransportError {
        TransportError {
            kind,
            reason: reason.into(),
        }
    }
}

/// Something that can hand a message to a relay
pub trait Transport: Send {
    /// Hand off `message` through `relay`, blocking until the relay answers
    fn send(&mut self, relay: &RelayIdentity, message: &OutboundMessage) -> Result<(), TransportError>;

    /// Check that `relay` accepts its credentials, by sending a test message
    /// from the identity to itself
    fn test_connect(&mut self, relay: &RelayIdentity) -> Result<(), TransportError> {
        let message = OutboundMessage {
            subject: "Test Email".to_owned(),
            html_body: "This is a test email.".to_owned(),
            attachments: Vec::new(),
            to: relay.from_address.clone(),
            from: relay.from_address.clone(),
            from_display_name: relay.display_name.clone(),
        };
        self.send(relay, &message)
    }
}
