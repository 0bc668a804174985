//! Placeholder substitution and draft decoding.
//!
//! Templates reference request arguments as `{{.Key}}`, or `{{.User.Name}}`
//! for nested objects. An argument that is absent or `null` renders as
//! `<no value>`. The substituted text must be a YAML document describing a
//! [`DraftMessage`].

use crate::model::DraftMessage;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)$").unwrap()
});

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const NO_VALUE: &str = "<no value>";

/// Template parse and decode failures. None of these are attributable to a
/// request field.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unclosed action at byte {0}")]
    Unclosed(usize),

    #[error("unsupported action {{{{{0}}}}}")]
    UnsupportedAction(String),

    #[error("rendered template is not a valid message: {0}")]
    Decode(#[from] serde_yaml_ng::Error),
}

/// Substitute `args` into `template` and decode the result.
pub fn render(template: &str, args: &Map<String, Value>) -> Result<DraftMessage, RenderError> {
    let text = substitute(template, args)?;
    decode(&text)
}

/// Replace every `{{.Path}}` action with the referenced argument.
pub fn substitute(template: &str, args: &Map<String, Value>) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let offset = template.len() - rest.len() + start;
        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE).ok_or(RenderError::Unclosed(offset))?;

        let action = after[..end].trim();
        let path = ACTION
            .captures(action)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| RenderError::UnsupportedAction(action.to_string()))?
            .as_str();
        push_value(&mut out, lookup(args, path));

        rest = &after[end + CLOSE.len()..];
    }

    out.push_str(rest);
    Ok(out)
}

fn lookup<'a>(args: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut value = args.get(segments.next()?)?;
    for segment in segments {
        value = value.as_object()?.get(segment)?;
    }
    Some(value)
}

fn push_value(out: &mut String, value: Option<&Value>) {
    match value {
        Some(Value::String(s)) => out.push_str(s),
        None | Some(Value::Null) => out.push_str(NO_VALUE),
        Some(other) => out.push_str(&other.to_string()),
    }
}

/// Decode rendered text. Blank output yields an empty draft, which then
/// fails message validation rather than decoding.
pub fn decode(text: &str) -> Result<DraftMessage, RenderError> {
    if text.trim().is_empty() {
        return Ok(DraftMessage::default());
    }
    Ok(serde_yaml_ng::from_str(text)?)
}
