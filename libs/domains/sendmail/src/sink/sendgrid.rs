//! SendGrid delivery sink (HTTP v3 `mail/send`).

use super::{DeliveryError, DeliverySink};
use crate::model::{Address, Message};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const SEND_PATH: &str = "/v3/mail/send";

/// SendGrid sink.
#[derive(Debug, Clone)]
pub struct SendGridSink {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl SendGridSink {
    /// `base_url` is the API root, e.g. `https://api.sendgrid.com`.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), SEND_PATH),
            api_key: api_key.into(),
            client: Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: EmailAddress<'a>,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    subject: &'a str,
    to: Vec<EmailAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<EmailAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<EmailAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

impl<'a> From<&'a Address> for EmailAddress<'a> {
    fn from(addr: &'a Address) -> Self {
        Self {
            email: &addr.email,
            name: (!addr.name.is_empty()).then_some(addr.name.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
}

fn addresses(list: &[Address]) -> Vec<EmailAddress<'_>> {
    list.iter().map(EmailAddress::from).collect()
}

fn build_request(message: &Message) -> SendGridRequest<'_> {
    SendGridRequest {
        personalizations: vec![Personalization {
            subject: &message.subject,
            to: addresses(&message.to),
            cc: addresses(&message.cc),
            bcc: addresses(&message.bcc),
        }],
        from: EmailAddress::from(&message.from),
        content: vec![Content {
            content_type: &message.body_type,
            value: &message.body,
        }],
    }
}

#[async_trait]
impl DeliverySink for SendGridSink {
    async fn send(&self, message: &Message) -> Result<(), DeliveryError> {
        let request = build_request(message);

        debug!(
            subject = %message.subject,
            recipients = message.recipient_count(),
            "Sending email via SendGrid"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(status = %status, "Email accepted by SendGrid");
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(status = %status, error = %error_body, "SendGrid rejected email");

        let body = match serde_json::from_str::<SendGridError>(&error_body) {
            Ok(sg_error) if !sg_error.errors.is_empty() => sg_error
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(", "),
            _ => error_body,
        };

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
