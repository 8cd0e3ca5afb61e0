//! Language detection and per-language source normalization.
//!
//! Each supported language gets a [`Normalizer`] that turns raw source into
//! a [`SourceOutline`]: imports, functions, classes, interfaces, calls, and
//! variable bindings in a language-neutral shape. Tree-sitter grammars back
//! every language except Classic ASP, which falls back to regex scans.

pub mod asp;
pub mod c;
pub mod cpp;
pub mod csharp;
pub mod java;
pub mod javascript;
pub mod outline;
pub mod python;
pub mod registry;
pub mod traits;
pub mod treesitter;
pub mod typescript;

use std::path::Path;

pub use outline::{CallSite, ClassDef, FunctionDef, InterfaceDef, SourceOutline, VariableDef};
pub use registry::NormalizerRegistry;
pub use traits::{Normalizer, ParseFailure};

/// Maps a file path to its language name by extension, case-insensitively.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    let language = match extension.as_str() {
        "py" => "python",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp",
        "cs" => "csharp",
        "asp" => "asp",
        "aspx" => "aspx",
        _ => return None,
    };
    Some(language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("src/main.py")), Some("python"));
        assert_eq!(detect_language(Path::new("app.controller.ts")), Some("typescript"));
        assert_eq!(detect_language(Path::new("View.TSX")), Some("typescript"));
        assert_eq!(detect_language(Path::new("routes.js")), Some("javascript"));
        assert_eq!(detect_language(Path::new("Main.java")), Some("java"));
        assert_eq!(detect_language(Path::new("util.h")), Some("c"));
        assert_eq!(detect_language(Path::new("shape.hpp")), Some("cpp"));
        assert_eq!(detect_language(Path::new("Program.cs")), Some("csharp"));
        assert_eq!(detect_language(Path::new("legacy.asp")), Some("asp"));
        assert_eq!(detect_language(Path::new("page.aspx")), Some("aspx"));
        assert_eq!(detect_language(Path::new("README.md")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }
}
