//! Repository analysis: framework detection, endpoint extraction, import
//! resolution and relationship edges.

pub mod endpoints;
pub mod frameworks;
pub mod imports;
pub mod project;
pub mod relations;

pub use endpoints::extract_endpoints;
pub use frameworks::{detect_frameworks, detect_module_framework, detect_module_kind};
pub use imports::{ImportResolver, ResolvedImport};
pub use project::extract_project_info;
pub use relations::{extract_relationships, FanStats};
