//! Declarative, path-addressed validation.
//!
//! A [`Rules<T>`] table is an ordered list of checks. Every check runs, so a
//! single pass reports every problem found at that level. Violations carry
//! the dotted field path they were found at (`.to[0].Email`); whole-object
//! checks report at the path of the object itself (`""` at the top).

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use validator::ValidateEmail;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub path: String,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }
}

/// Ordered violation list. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }

    /// JSON rendering used for structured logs.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_string())
    }

    /// `Ok(())` when empty, otherwise the violations as an error value.
    pub fn into_result(self) -> Result<(), Violations> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(v: Vec<Violation>) -> Self {
        Self(v)
    }
}

impl From<Violation> for Violations {
    fn from(v: Violation) -> Self {
        Self(vec![v])
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if v.path.is_empty() {
                f.write_str(&v.message)?;
            } else {
                write!(f, "{}: {}", v.path, v.message)?;
            }
        }
        Ok(())
    }
}

/// Rules applicable to a string field. Each carries its violation message.
#[derive(Debug, Clone)]
pub enum StrRule {
    /// Non-blank after trimming.
    Required(&'static str),
    /// Syntactically valid email address. Blank is invalid.
    Email(&'static str),
    /// Membership in `allowed`. The violation carries
    /// `{unsupported: <value>, supported: <allowed>}`.
    OneOf {
        allowed: &'static [&'static str],
        message: &'static str,
    },
}

impl StrRule {
    fn check(&self, value: &str, path: &str) -> Option<Violation> {
        match self {
            StrRule::Required(message) => {
                value.trim().is_empty().then(|| Violation::new(path, *message))
            }
            StrRule::Email(message) => {
                (!value.to_owned().validate_email()).then(|| Violation::new(path, *message))
            }
            StrRule::OneOf { allowed, message } => {
                (!allowed.contains(&value)).then(|| {
                    let mut params = Map::new();
                    params.insert("unsupported".into(), json!(value));
                    params.insert("supported".into(), json!(allowed));
                    Violation::new(path, *message).with_params(params)
                })
            }
        }
    }
}

type Check<T> = Box<dyn Fn(&T, &str, &mut Vec<Violation>) + Send + Sync>;

/// Statically typed rule table for `T`.
pub struct Rules<T> {
    checks: Vec<Check<T>>,
}

impl<T: 'static> Default for Rules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Rules<T> {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Apply string rules to a field, in order, all of them.
    pub fn field(mut self, name: &'static str, get: fn(&T) -> &str, rules: &[StrRule]) -> Self {
        let rules = rules.to_vec();
        self.checks.push(Box::new(move |value, prefix, out| {
            let path = format!("{prefix}.{name}");
            let field = get(value);
            out.extend(rules.iter().filter_map(|rule| rule.check(field, &path)));
        }));
        self
    }

    /// Apply a nested table to a struct-valued field.
    pub fn nested<U: 'static>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &U,
        rules: &'static Rules<U>,
    ) -> Self {
        self.checks.push(Box::new(move |value, prefix, out| {
            rules.collect(get(value), &format!("{prefix}.{name}"), out);
        }));
        self
    }

    /// Apply a nested table to every element of a sequence field, suffixing
    /// the element index to the path.
    pub fn each<U: 'static>(
        mut self,
        name: &'static str,
        get: fn(&T) -> &[U],
        rules: &'static Rules<U>,
    ) -> Self {
        self.checks.push(Box::new(move |value, prefix, out| {
            for (i, item) in get(value).iter().enumerate() {
                rules.collect(item, &format!("{prefix}.{name}[{i}]"), out);
            }
        }));
        self
    }

    /// Whole-object rule: returns the violation message when the check fails.
    pub fn object(mut self, check: fn(&T) -> Option<&'static str>) -> Self {
        self.checks.push(Box::new(move |value, prefix, out| {
            if let Some(message) = check(value) {
                out.push(Violation::new(prefix, message));
            }
        }));
        self
    }

    pub fn validate(&self, value: &T) -> Violations {
        let mut out = Vec::new();
        self.collect(value, "", &mut out);
        Violations(out)
    }

    fn collect(&self, value: &T, prefix: &str, out: &mut Vec<Violation>) {
        for check in &self.checks {
            check(value, prefix, out);
        }
    }
}
