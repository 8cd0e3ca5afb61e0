//! Module entity: one analyzed source file.

use serde::{Deserialize, Serialize};

/// A source file in the analyzed repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// `mod:<repo-relative-path>`
    pub id: String,

    /// Repo-relative path with forward slashes.
    pub path: String,

    /// Role tags: `controller`, `service`, `entity`, `route`, `component`,
    /// `module`, `util`, `test`.
    pub kind: Vec<String>,

    /// Non-blank line count.
    pub loc: usize,

    /// Hex sha256 of the file bytes. Empty when hashing failed; the failure
    /// is collected as a generation error.
    pub hash: String,

    /// Symbol ids exported by this module.
    pub exports: Vec<String>,

    /// Module ids this module imports. Backfilled from `imports` edges.
    pub imports: Vec<String>,

    /// Verbatim import/include statements as written in the source. Kept on
    /// the record so edge resolution can rerun without reparsing the file.
    #[serde(default)]
    pub raw_imports: Vec<String>,

    /// Detected framework for this file, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Detection confidence: 0.9 for marker evidence, 0.6 for filename-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_confidence: Option<f64>,

    /// Reserved for summaries; serialized as an explicit `null` when absent.
    pub module_summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippets: Option<CodeSnippets>,
}

/// Representative source excerpts attached to a module.
///
/// Every snippet is capped at 200 characters; `common_methods` keeps at most
/// the first five method signatures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_decorator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_signature: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_methods: Vec<String>,
}

impl CodeSnippets {
    pub fn is_empty(&self) -> bool {
        self.imports.is_none()
            && self.component_decorator.is_none()
            && self.class_signature.is_none()
            && self.common_methods.is_empty()
    }
}
