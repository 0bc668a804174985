//! Sendmail Domain
//!
//! Turns queued send requests into delivered emails.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │   Redis Stream    │  ← sendmail queue, one JSON request per entry
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │ SendmailProcessor │  ← decode, classify outcome, ack / reject
//! └─────────┬─────────┘
//!           │
//! ┌─────────▼─────────┐
//! │      Mailer       │  ← validate → load → render → assemble → validate
//! └────┬─────────┬────┘
//!      │         │
//! ┌────▼─────┐ ┌─▼────────────┐
//! │ Template │ │ DeliverySink │  ← fs / memory, SendGrid / SMTP / memory
//! │  Source  │ └──────────────┘
//! └──────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_sendmail::{DeliverySinks, Mailer, SendmailProcessor, SinkSettings, TemplateSources};
//!
//! let templates = TemplateSources::builtin().open("fs:///srv/templates")?;
//! let sink = DeliverySinks::builtin().open("sendgrid", &settings)?;
//! let processor = SendmailProcessor::new(Mailer::new(templates, sink), true);
//! ```

pub mod assemble;
pub mod error;
pub mod mailer;
pub mod model;
pub mod processor;
pub mod registry;
pub mod render;
pub mod rules;
pub mod sink;
pub mod streams;
pub mod template;
pub mod validation;

// Re-export commonly used types
pub use error::{FailureKind, InternalError, SendMailError, SendMailResult};
pub use mailer::Mailer;
pub use model::{Address, DraftMessage, Message, Request};
pub use processor::SendmailProcessor;
pub use registry::{DeliverySinks, RegistryError, SinkSettings, TemplateSources};
pub use render::RenderError;
pub use sink::{DeliveryError, DeliverySink, MemorySink, SendGridSink, SmtpSink};
pub use streams::SendmailStream;
pub use template::{FsTemplateSource, InMemoryTemplateSource, TemplateError, TemplateSource};
pub use validation::{Violation, Violations};
