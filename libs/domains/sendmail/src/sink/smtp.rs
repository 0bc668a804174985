//! SMTP delivery sink using lettre.
//!
//! The endpoint is `smtp://host[:port]` for plain connections (MailHog,
//! Mailpit and similar) or `smtps://host[:port]` for an implicit-TLS relay.
//! The key, when non-empty, is `user:password`.

use super::{DeliveryError, DeliverySink};
use crate::model::{Address, Message};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, error, info};

const DEFAULT_PORT: u16 = 25;
const DEFAULT_TLS_PORT: u16 = 465;

/// Parsed SMTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl SmtpEndpoint {
    pub fn parse(url: &str) -> Result<Self, DeliveryError> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| DeliveryError::Build(format!("SMTP endpoint {url:?} has no scheme")))?;

        let tls = match scheme {
            "smtp" => false,
            "smtps" => true,
            other => {
                return Err(DeliveryError::Build(format!(
                    "unsupported SMTP scheme {other:?}"
                )));
            }
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| DeliveryError::Build(format!("invalid SMTP port {port:?}: {e}")))?;
                (host, port)
            }
            None if tls => (rest, DEFAULT_TLS_PORT),
            None => (rest, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(DeliveryError::Build("SMTP endpoint has no host".to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

/// SMTP sink.
pub struct SmtpSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    endpoint: SmtpEndpoint,
}

impl SmtpSink {
    pub fn new(url: &str, key: &str) -> Result<Self, DeliveryError> {
        let endpoint = SmtpEndpoint::parse(url)?;
        let credentials = parse_credentials(key)?;
        let transport = Self::build_transport(&endpoint, credentials)?;
        Ok(Self { transport, endpoint })
    }

    pub fn endpoint(&self) -> &SmtpEndpoint {
        &self.endpoint
    }

    fn build_transport(
        endpoint: &SmtpEndpoint,
        credentials: Option<Credentials>,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, DeliveryError> {
        let mut builder = if endpoint.tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&endpoint.host)?.port(endpoint.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&endpoint.host).port(endpoint.port)
        };

        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        Ok(builder.build())
    }
}

fn parse_credentials(key: &str) -> Result<Option<Credentials>, DeliveryError> {
    if key.is_empty() {
        return Ok(None);
    }
    let (user, password) = key
        .split_once(':')
        .ok_or_else(|| DeliveryError::Build("SMTP key must be user:password".to_string()))?;
    Ok(Some(Credentials::new(user.to_string(), password.to_string())))
}

fn mailbox(addr: &Address) -> Result<Mailbox, DeliveryError> {
    let email = addr
        .email
        .parse::<lettre::Address>()
        .map_err(|e| DeliveryError::Build(format!("invalid address {:?}: {}", addr.email, e)))?;
    let name = (!addr.name.is_empty()).then(|| addr.name.clone());
    Ok(Mailbox::new(name, email))
}

fn content_type(body_type: &str) -> ContentType {
    if body_type == "text/html" {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    }
}

/// Build a lettre message from an assembled message.
fn build_message(message: &Message) -> Result<lettre::Message, DeliveryError> {
    let mut builder = lettre::Message::builder()
        .from(mailbox(&message.from)?)
        .subject(&message.subject);

    for addr in &message.to {
        builder = builder.to(mailbox(addr)?);
    }
    for addr in &message.cc {
        builder = builder.cc(mailbox(addr)?);
    }
    for addr in &message.bcc {
        builder = builder.bcc(mailbox(addr)?);
    }

    builder
        .header(content_type(&message.body_type))
        .body(message.body.clone())
        .map_err(|e| DeliveryError::Build(e.to_string()))
}

#[async_trait]
impl DeliverySink for SmtpSink {
    async fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        debug!(
            subject = %message.subject,
            host = %self.endpoint.host,
            port = %self.endpoint.port,
            recipients = message.recipient_count(),
            "Sending email via SMTP"
        );

        let email = build_message(message)?;

        let response = self.transport.send(email).await.map_err(|e| {
            error!(host = %self.endpoint.host, error = %e, "Failed to send email via SMTP");
            DeliveryError::Smtp(e)
        })?;

        let reply = response.message().next().map(|s| s.to_string());
        info!(reply = ?reply, "Email sent via SMTP");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
