//! Endpoint entity: an HTTP route discovered in a module.

use serde::{Deserialize, Serialize};

/// HTTP method of a discovered route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    /// Express `app.all(...)` catch-all registrations.
    All,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::All => "ALL",
        }
    }

    /// Parse a method token case-insensitively.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "patch" => Some(Self::Patch),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP route. Duplicate ids may appear when a route is registered more
/// than once; consumers de-duplicate as needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// `ep:<METHOD>:<path>`
    pub id: String,

    pub method: HttpMethod,

    /// Route path with a leading `/`.
    pub path: String,

    /// Module that registers the route.
    pub handler_module_id: String,

    /// Resolved handler symbol; explicit `null` when the handler name could
    /// not be matched to a symbol in the handler module.
    pub handler_symbol_id: Option<String>,

    /// `"<METHOD> <path>"`
    pub summary: String,
}
