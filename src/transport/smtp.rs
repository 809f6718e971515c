use std::net::ToSocketAddrs;

use lettre::smtp::authentication::Credentials;
use lettre::smtp::client::net::ClientTlsParameters;
use lettre::smtp::error::Error as LettreSmtpError;
use lettre::smtp::extension::ClientId;
use lettre::smtp::response::Severity;
use lettre::smtp::{ClientSecurity, SmtpClient};
use lettre::Transport as LettreTransport;
use native_tls::{Protocol, TlsConnector};

use super::{Transport, TransportError, TransportErrorKind};
use crate::config::Config;
use crate::message::OutboundMessage;
use crate::prepared_email::prepare_email;
use crate::relay::RelayIdentity;

const WRAPPED_TLS_PORT: u16 = 465;

/// Hands messages to SMTP relays, one connection per message.
pub struct SmtpTransport {
    config: Config,
}

impl SmtpTransport {
    pub fn new(config: Config) -> SmtpTransport {
        SmtpTransport { config }
    }

    fn client_security(&self, relay: &RelayIdentity) -> Result<ClientSecurity, TransportError> {
        let connector = TlsConnector::builder()
            .min_protocol_version(Some(Protocol::Tlsv12))
            .build()
            .map_err(|e| {
                info!("(smtp) failed to create TLS Connector: {:?}", e);
                TransportError::new(TransportErrorKind::Tls, format!("Failed to create TLS connector: {}", e))
            })?;
        let tls_parameters = ClientTlsParameters::new(relay.host.clone(), connector);

        Ok(if relay.port == WRAPPED_TLS_PORT {
            ClientSecurity::Wrapper(tls_parameters)
        } else if self.config.require_tls {
            ClientSecurity::Required(tls_parameters)
        } else {
            ClientSecurity::Opportunistic(tls_parameters)
        })
    }
}

impl Transport for SmtpTransport {
    fn send(&mut self, relay: &RelayIdentity, message: &OutboundMessage) -> Result<(), TransportError> {
        let prepared = prepare_email(message, &self.config.helo_name)?;

        let sendable_email = prepared.as_sendable_email().map_err(|e| {
            warn!("Invalid email address error: {:?}", e);
            TransportError::new(TransportErrorKind::Message, format!("Invalid email address: {}", e))
        })?;

        let client_security = self.client_security(relay)?;

        let sockaddr = match (&*relay.host, relay.port).to_socket_addrs() {
            Err(e) => {
                warn!("ToSocketAddr failed for ({}, {}): {:?}", relay.host, relay.port, e);
                return Err(TransportError::new(
                    TransportErrorKind::Connection,
                    format!("Cannot resolve {}:{}: {}", relay.host, relay.port, e),
                ));
            }
            Ok(mut iter) => match iter.next() {
                Some(sa) => sa,
                None => {
                    warn!("No SockAddrs for ({}, {})", relay.host, relay.port);
                    return Err(TransportError::new(
                        TransportErrorKind::Connection,
                        format!("No addresses for {}:{}", relay.host, relay.port),
                    ));
                }
            },
        };

        let mailer = SmtpClient::new(sockaddr, client_security).map_err(|e| {
            info!("(smtp) failed to setup SMTP transport: {:?}", e);
            classify(e)
        })?;

        let mut mailer = mailer
            .hello_name(ClientId::Domain(self.config.helo_name.clone()))
            .smtp_utf8(true) // is only used if the server supports it
            .timeout(Some(self.config.smtp_timeout()))
            .credentials(Credentials::new(relay.username.clone(), relay.secret.clone()))
            .transport();

        debug!(
            "(smtp) handing {} to {}:{} as {}",
            message.to, relay.host, relay.port, relay.username
        );

        let result = match mailer.send(sendable_email) {
            Ok(response) => match response.code.severity {
                Severity::PositiveCompletion | Severity::PositiveIntermediate => {
                    info!("(smtp) Delivery Success: {:?}", response);
                    Ok(())
                }
                Severity::TransientNegativeCompletion => {
                    info!("(smtp) Delivery Deferred: {:?}", response);
                    Err(TransportError::new(
                        TransportErrorKind::TransientRejection,
                        format!("{:?}", response),
                    ))
                }
                Severity::PermanentNegativeCompletion => {
                    info!("(smtp) Delivery Failed: {:?}", response);
                    Err(TransportError::new(
                        TransportErrorKind::PermanentRejection,
                        format!("{:?}", response),
                    ))
                }
            },
            Err(e) => {
                info!("(smtp) delivery failed: {:?}", e);
                Err(classify(e))
            }
        };

        mailer.close();

        result
    }
}

fn classify(e: LettreSmtpError) -> TransportError {
    let kind = match e {
        LettreSmtpError::Transient(_) => TransportErrorKind::TransientRejection,
        LettreSmtpError::Permanent(_) => TransportErrorKind::PermanentRejection,
        LettreSmtpError::Resolution | LettreSmtpError::Io(_) => TransportErrorKind::Connection,
        LettreSmtpError::Tls(_) => TransportErrorKind::Tls,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, e.to_string())
}
