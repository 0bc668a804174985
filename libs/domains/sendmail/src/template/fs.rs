//! Filesystem template source: `<root>/<lang>/<name>.msg`.

use super::{TemplateError, TemplateSource};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

const EXTENSION: &str = "msg";

/// Loads templates from a directory tree.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the file for a template, refusing anything that is not a
    /// single plain path segment.
    fn resolve(&self, lang: &str, name: &str) -> Result<PathBuf, TemplateError> {
        for segment in [lang, name] {
            if !is_plain_segment(segment) {
                return Err(TemplateError::InvalidName(segment.to_string()));
            }
        }
        Ok(self.root.join(lang).join(format!("{name}.{EXTENSION}")))
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn load(&self, lang: &str, name: &str) -> Result<String, TemplateError> {
        let path = self.resolve(lang, name)?;
        debug!(path = %path.display(), "Loading template");

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TemplateError::NotFound),
            Err(e) => Err(TemplateError::Io(e)),
        }
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with(lang: &str, name: &str, text: &str) -> (tempfile::TempDir, FsTemplateSource) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(lang)).unwrap();
        std::fs::write(dir.path().join(lang).join(format!("{name}.msg")), text).unwrap();
        let source = FsTemplateSource::new(dir.path());
        (dir, source)
    }

    #[tokio::test]
    async fn test_loads_template_by_lang_and_name() {
        let (_dir, source) = source_with("en", "welcome", "Subject: Hi\n");
        assert_eq!(source.load("en", "welcome").await.unwrap(), "Subject: Hi\n");
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let (_dir, source) = source_with("en", "welcome", "x");
        let err = source.load("en", "xxx").await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound));
        assert_eq!(err.to_string(), "template not found");

        let err = source.load("de", "welcome").await.unwrap_err();
        assert!(matches!(err, TemplateError::NotFound));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (_dir, source) = source_with("en", "welcome", "x");
        for (lang, name) in [("..", "welcome"), ("en", "../en/welcome"), ("en", ""), ("en/..", "x")] {
            let err = source.load(lang, name).await.unwrap_err();
            assert!(matches!(err, TemplateError::InvalidName(_)), "{lang}/{name}");
        }
    }
}
