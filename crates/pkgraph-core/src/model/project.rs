//! Project-level metadata.

use serde::{Deserialize, Serialize};

/// Repository-wide facts gathered before any per-file analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    /// Repository directory name.
    pub id: String,

    /// Same as `id`; manifest package names live in `metadata`.
    pub name: String,

    /// Absolute path of the analyzed root.
    pub root_path: String,

    /// Sorted, de-duplicated set of detected languages.
    pub languages: Vec<String>,

    /// Detected frameworks, manifest hits first.
    pub frameworks: Vec<String>,

    /// Build tooling inferred from manifest files (npm, maven, gradle, ...).
    pub build_tools: Vec<String>,

    /// `git rev-parse HEAD`, absent outside a repository.
    pub git_sha: Option<String>,

    /// Free-form facts: package manager fields, maven coordinates, and the
    /// generation error/warning report.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
