//! Feature entity: a folder-level grouping of modules.

use serde::{Deserialize, Serialize};

/// One folder on the path from the repo root to a module. Every feature
/// lists all modules at or beneath its folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// `feat:<repo-relative-folder-path>`
    pub id: String,

    /// Last path component of the folder.
    pub name: String,

    /// Repo-relative folder path with forward slashes.
    pub path: String,

    pub module_ids: Vec<String>,
}
