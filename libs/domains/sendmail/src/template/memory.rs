use super::{TemplateError, TemplateSource};
use async_trait::async_trait;
use std::collections::HashMap;

/// Fixed set of templates held in memory, keyed by `(lang, name)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateSource {
    templates: HashMap<(String, String), String>,
}

impl InMemoryTemplateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a template.
    pub fn with_template(
        mut self,
        lang: impl Into<String>,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.templates.insert((lang.into(), name.into()), text.into());
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[async_trait]
impl TemplateSource for InMemoryTemplateSource {
    async fn load(&self, lang: &str, name: &str) -> Result<String, TemplateError> {
        self.templates
            .get(&(lang.to_string(), name.to_string()))
            .cloned()
            .ok_or(TemplateError::NotFound)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
