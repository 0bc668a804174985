//! Request and message types.
//!
//! Inbound requests are JSON with camelCase keys; template output is a YAML
//! document with PascalCase keys. `Address` accepts both spellings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decode `null` the same as an absent field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// An email address with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(alias = "Email", deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(alias = "Name", deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub name: String,
}

impl Address {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A send request as it arrives on the queue.
///
/// Keys are camelCase; PascalCase producers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Request {
    #[serde(alias = "TemplateLang", deserialize_with = "nullable")]
    pub template_lang: String,
    #[serde(alias = "TemplateName", deserialize_with = "nullable")]
    pub template_name: String,
    #[serde(alias = "TemplateArgs", deserialize_with = "nullable")]
    pub template_args: Map<String, Value>,
    #[serde(alias = "To", deserialize_with = "nullable")]
    pub to: Vec<Address>,
    #[serde(alias = "Cc", deserialize_with = "nullable")]
    pub cc: Vec<Address>,
    #[serde(alias = "Bcc", deserialize_with = "nullable")]
    pub bcc: Vec<Address>,
}

impl Request {
    /// Decode a queue payload.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn has_recipients(&self) -> bool {
        !(self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty())
    }
}

/// Message fields as decoded from rendered template output.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DraftMessage {
    #[serde(deserialize_with = "nullable")]
    pub from: Address,
    #[serde(deserialize_with = "nullable")]
    pub to: Vec<Address>,
    #[serde(deserialize_with = "nullable")]
    pub cc: Vec<Address>,
    #[serde(deserialize_with = "nullable")]
    pub bcc: Vec<Address>,
    #[serde(deserialize_with = "nullable")]
    pub subject: String,
    #[serde(deserialize_with = "nullable")]
    pub body_type: String,
    #[serde(deserialize_with = "nullable")]
    pub body: String,
}

/// A fully assembled message handed to a delivery sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub from: Address,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub subject: String,
    pub body_type: String,
    pub body: String,
}

impl Message {
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}
