//! PKG document model: entities, edges and identifiers.

pub mod edge;
pub mod endpoint;
pub mod feature;
pub mod ids;
pub mod module;
pub mod pkg;
pub mod project;
pub mod symbol;

pub use edge::{Edge, EdgeKind};
pub use endpoint::{Endpoint, HttpMethod};
pub use feature::Feature;
pub use module::{CodeSnippets, Module};
pub use pkg::{ErrorKind, ErrorRecord, Pkg, WarningKind, WarningRecord};
pub use project::ProjectInfo;
pub use symbol::{Symbol, SymbolKind};
