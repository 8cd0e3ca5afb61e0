//! Classic ASP normalizer.
//!
//! No tree-sitter grammar exists for VBScript-era ASP, so definitions are
//! recovered with case-insensitive regex scans.

use regex::Regex;

use super::outline::{FunctionDef, SourceOutline};
use super::traits::{Normalizer, ParseFailure};

const FUNCTION_PATTERN: &str = r"(?i)Function\s+(\w+)\s*\([^)]*\)";
const SUB_PATTERN: &str = r"(?i)Sub\s+(\w+)\s*\([^)]*\)";
const INCLUDE_PATTERN: &str = r#"(?i)<!--\s*#include\s+(?:file|virtual)=["']([^"']+)["']\s*-->"#;

pub struct AspNormalizer {
    language: &'static str,
    extensions: &'static [&'static str],
}

impl AspNormalizer {
    pub fn asp() -> Self {
        Self {
            language: "asp",
            extensions: &["asp"],
        }
    }

    pub fn aspx() -> Self {
        Self {
            language: "aspx",
            extensions: &["aspx"],
        }
    }

    fn collect_definitions(pattern: &str, source: &str, outline: &mut SourceOutline) {
        let re = match Regex::new(pattern) {
            Ok(r) => r,
            Err(_) => return,
        };
        for cap in re.captures_iter(source) {
            if let Some(name) = cap.get(1) {
                outline.functions.push(FunctionDef {
                    name: name.as_str().to_string(),
                    parameters: Vec::new(),
                    return_type: None,
                    docstring: None,
                    is_async: false,
                    decorators: Vec::new(),
                    is_exported: true,
                });
            }
        }
    }

    fn collect_includes(source: &str, outline: &mut SourceOutline) {
        let re = match Regex::new(INCLUDE_PATTERN) {
            Ok(r) => r,
            Err(_) => return,
        };
        for cap in re.captures_iter(source) {
            if let Some(path) = cap.get(1) {
                let text = path.as_str().to_string();
                outline.imports.push(text.clone());
                outline.includes.push(text);
            }
        }
    }
}

impl Normalizer for AspNormalizer {
    fn normalize(&self, _path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let mut outline = SourceOutline::default();
        Self::collect_definitions(FUNCTION_PATTERN, source, &mut outline);
        Self::collect_definitions(SUB_PATTERN, source, &mut outline);
        Self::collect_includes(source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        self.language
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }
}
