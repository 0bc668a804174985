//! Template sources.
//!
//! A source resolves a `(lang, name)` pair to raw template text. Concrete
//! backends are selected at startup through [`crate::registry::TemplateSources`].

mod fs;
mod memory;

pub use fs::FsTemplateSource;
pub use memory::InMemoryTemplateSource;

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by template sources.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found")]
    NotFound,

    /// Language or name would escape the template root.
    #[error("invalid template reference {0:?}")]
    InvalidName(String),

    #[error("template read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves templates by language and name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Load the raw template text.
    async fn load(&self, lang: &str, name: &str) -> Result<String, TemplateError>;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}
