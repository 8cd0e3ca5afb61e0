//! Error types for PKG generation, validation, storage and querying.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or querying a project knowledge graph.
#[derive(Debug, Error)]
pub enum PkgError {
    /// Graph store connection or query error.
    #[error("Store error: {0}")]
    Store(String),

    /// File parsing error.
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// IO error.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The assembled document failed structural validation.
    #[error("Schema validation failed: {}", errors.join("; "))]
    SchemaValidation { errors: Vec<String> },

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested repository root does not exist or is not a directory.
    #[error("Invalid repository root: {}", .0.display())]
    InvalidRoot(PathBuf),
}

impl PkgError {
    /// IO error tagged with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PkgError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for PkgError {
    fn from(err: std::io::Error) -> Self {
        PkgError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<surrealdb::Error> for PkgError {
    fn from(err: surrealdb::Error) -> Self {
        PkgError::Store(err.to_string())
    }
}
