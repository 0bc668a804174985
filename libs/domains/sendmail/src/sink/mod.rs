//! Delivery sinks.
//!
//! A sink takes an assembled [`Message`] and hands it to a provider. Concrete
//! backends are selected at startup through [`crate::registry::DeliverySinks`].

mod memory;
mod sendgrid;
mod smtp;

pub use memory::MemorySink;
pub use sendgrid::SendGridSink;
pub use smtp::SmtpSink;

use crate::model::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while delivering a message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("SMTP send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The message or sink settings cannot be expressed for this provider.
    #[error("cannot build message: {0}")]
    Build(String),

    #[error("{0}")]
    Other(String),
}

/// Delivers assembled messages.
///
/// Implementations must be safe to call repeatedly and from several workers
/// at once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &Message) -> Result<(), DeliveryError>;

    /// Get the sink name for logging.
    fn name(&self) -> &'static str;
}
