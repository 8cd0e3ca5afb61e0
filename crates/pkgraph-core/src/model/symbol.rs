//! Symbol entity: a named definition inside a module.

use serde::{Deserialize, Serialize};

/// Kind of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Interface,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Method => "method",
            Self::Interface => "interface",
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function, class, method or interface definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    /// `sym:<moduleId>:<qualifiedName>`
    pub id: String,

    /// Owning module.
    pub module_id: String,

    /// Qualified name; methods read `Class.method`.
    pub name: String,

    pub kind: SymbolKind,

    /// Functions, classes and interfaces default to exported; methods do not.
    pub is_exported: bool,

    /// `name(params)` or `name(params) -> ret`; classes and interfaces use
    /// their bare name.
    pub signature: String,

    pub visibility: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_async: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorators: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,

    /// Docstring. For classes this is only present when the owning module's
    /// fan-in reaches the configured threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}
