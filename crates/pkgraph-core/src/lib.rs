//! Core library for pkgraph: multi-language project knowledge graphs.
//!
//! A generation run walks one repository, normalizes every supported source
//! file into modules and symbols, extracts endpoints and relationship edges,
//! and assembles a validated [`Pkg`] document. The document can be written
//! to disk, persisted into an embedded graph database, and queried through
//! either engine behind [`query::GraphQueries`].

pub mod analyze;
pub mod config;
pub mod error;
pub mod generator;
pub mod lang;
pub mod model;
pub mod query;
pub mod store;
pub mod validate;

pub use config::{Config, GeneratorConfig, StoreConfig};
pub use error::PkgError;
pub use generator::PkgGenerator;
pub use model::{Edge, EdgeKind, Endpoint, Feature, Module, Pkg, ProjectInfo, Symbol};
pub use query::{GraphQueries, MemoryQueryEngine, StoreQueryEngine};
pub use store::GraphStore;
pub use validate::{validate_pkg, ValidationReport};
