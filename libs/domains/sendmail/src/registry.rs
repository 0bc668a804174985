//! Backend registries.
//!
//! Each registry is an immutable name → factory table built once at startup.
//! The binary picks a template source by the scheme of its root location
//! (`fs:///srv/templates`) and a delivery sink by provider name.

use crate::sink::{DeliveryError, DeliverySink, SendGridSink, SmtpSink};
use crate::template::{FsTemplateSource, TemplateSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

const PROTOCOL_DELIMITER: &str = "://";

/// Errors raised while selecting or building a backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("templates path must start with protocol://")]
    MissingProtocol,

    #[error("protocol {0} is unsupported")]
    UnsupportedProtocol(String),

    #[error("unsupported sender {0}")]
    UnsupportedSender(String),

    #[error("cannot build {name} sender: {source}")]
    Sender {
        name: String,
        #[source]
        source: DeliveryError,
    },
}

type TemplateFactory = fn(&str) -> Result<Arc<dyn TemplateSource>, RegistryError>;

/// Template sources by URL scheme.
pub struct TemplateSources {
    factories: BTreeMap<&'static str, TemplateFactory>,
}

impl TemplateSources {
    /// Registry with every built-in source.
    pub fn builtin() -> Self {
        let mut factories: BTreeMap<&'static str, TemplateFactory> = BTreeMap::new();
        factories.insert("fs", |root| Ok(Arc::new(FsTemplateSource::new(root))));
        Self { factories }
    }

    /// Registered schemes, sorted.
    pub fn protocols(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Open the source for `location`, e.g. `fs:///srv/templates`.
    pub fn open(&self, location: &str) -> Result<Arc<dyn TemplateSource>, RegistryError> {
        let (protocol, root) = location
            .split_once(PROTOCOL_DELIMITER)
            .ok_or(RegistryError::MissingProtocol)?;

        let factory = self
            .factories
            .get(protocol)
            .ok_or_else(|| RegistryError::UnsupportedProtocol(protocol.to_string()))?;

        factory(root)
    }
}

/// Endpoint and credentials handed to a sink factory.
#[derive(Debug, Clone, Default)]
pub struct SinkSettings {
    pub url: String,
    pub key: String,
}

type SinkFactory = fn(&SinkSettings) -> Result<Arc<dyn DeliverySink>, DeliveryError>;

/// Delivery sinks by provider name.
pub struct DeliverySinks {
    factories: BTreeMap<&'static str, SinkFactory>,
}

impl DeliverySinks {
    /// Registry with every built-in provider.
    pub fn builtin() -> Self {
        let mut factories: BTreeMap<&'static str, SinkFactory> = BTreeMap::new();
        factories.insert("sendgrid", |s| Ok(Arc::new(SendGridSink::new(&s.url, s.key.clone()))));
        factories.insert("smtp", |s| Ok(Arc::new(SmtpSink::new(&s.url, &s.key)?)));
        Self { factories }
    }

    /// Registered provider names, sorted.
    pub fn providers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    pub fn open(&self, name: &str, settings: &SinkSettings) -> Result<Arc<dyn DeliverySink>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnsupportedSender(name.to_string()))?;

        factory(settings).map_err(|source| RegistryError::Sender {
            name: name.to_string(),
            source,
        })
    }
}
