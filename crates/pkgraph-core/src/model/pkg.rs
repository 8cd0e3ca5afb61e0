//! The PKG root document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PkgError;

use super::edge::Edge;
use super::endpoint::Endpoint;
use super::feature::Feature;
use super::module::Module;
use super::project::ProjectInfo;
use super::symbol::Symbol;

/// Category of a collected generation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FileNotFound,
    IoError,
    ParseError,
    ModuleBuildError,
    EndpointExtractionError,
    IncrementalParseError,
    SchemaValidationError,
}

/// Category of a collected generation warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    NoDefinitions,
    UnresolvedImport,
}

/// A non-fatal failure collected during generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub file_path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// A diagnostic collected during generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningRecord {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub file_path: String,
    pub message: String,
}

/// Complete project knowledge graph document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pkg {
    /// Schema version, currently "1.0.0".
    pub version: String,

    /// UTC ISO-8601 timestamp with a trailing `Z`.
    pub generated_at: String,

    /// HEAD commit at generation time, when available.
    pub git_sha: Option<String>,

    pub project: ProjectInfo,
    pub modules: Vec<Module>,
    pub symbols: Vec<Symbol>,
    pub endpoints: Vec<Endpoint>,
    pub edges: Vec<Edge>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Feature>>,
}

impl Pkg {
    /// Pretty-printed JSON form (the on-disk format).
    pub fn to_json_pretty(&self) -> Result<String, PkgError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, PkgError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read a document from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PkgError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| PkgError::io(path, e))?;
        Self::from_json(&raw)
    }

    /// Write the document as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PkgError> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| PkgError::io(path, e))?;
        Ok(())
    }

    pub fn module_by_id(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn symbol_by_id(&self, id: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    pub fn endpoint_by_id(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == id)
    }
}
