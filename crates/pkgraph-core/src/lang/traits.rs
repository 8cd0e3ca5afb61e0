//! Core normalizer trait for language-agnostic definition extraction.

use thiserror::Error;

use super::outline::SourceOutline;

/// A single file failed to parse.
#[derive(Debug, Clone, Error)]
#[error("{message} | File: {file_path} | Language: {language}")]
pub struct ParseFailure {
    pub message: String,
    pub file_path: String,
    pub language: String,
}

impl ParseFailure {
    pub fn new(
        message: impl Into<String>,
        file_path: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            file_path: file_path.into(),
            language: language.into(),
        }
    }
}

/// Language-agnostic normalizer.
///
/// One implementation per language turns raw source into a [`SourceOutline`]:
/// imports, functions, classes with methods and inheritance, interfaces,
/// call sites and variables. Normalizers never panic on malformed input;
/// unparseable sources surface as `Err(ParseFailure)`.
pub trait Normalizer: Send + Sync {
    /// Extract the definition outline of one file.
    ///
    /// `path` is the repo-relative path (used in failure reports only);
    /// `source` is the file content.
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure>;

    /// Canonical lowercase language name (`python`, `typescript`, ...).
    fn language(&self) -> &'static str;

    /// File extensions this normalizer handles, without the leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Check if this normalizer handles the given file extension.
    fn can_handle(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
