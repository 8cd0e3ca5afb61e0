//! Typed relationship edges between graph entities.

use serde::{Deserialize, Serialize};

/// Relationship type carried by an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
    /// Module imports module.
    Imports,
    /// Module calls a symbol by name.
    Calls,
    /// Class extends a base class symbol.
    Extends,
    /// Class implements an interface symbol.
    Implements,
    /// Module contains symbol.
    Contains,
    /// Endpoint routes to its handler symbol.
    RoutesTo,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imports => "imports",
            Self::Calls => "calls",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::Contains => "contains",
            Self::RoutesTo => "routes-to",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two entity ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub weight: u32,
}

impl Edge {
    /// Edge with the default weight of 1.
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            weight: 1,
        }
    }
}
