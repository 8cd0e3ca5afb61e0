//! Representative source excerpts attached to each module record.
//!
//! Snippets give downstream consumers a glance at a file without shipping its
//! full text: the import block, a framework decorator, the primary class or
//! function signature and up to five method signatures.

use crate::lang::{FunctionDef, SourceOutline};
use crate::model::CodeSnippets;

const SNIPPET_CHAR_LIMIT: usize = 200;
const IMPORT_SCAN_LINES: usize = 20;
const MAX_COMMON_METHODS: usize = 5;

/// Builds the snippet block for one file, or `None` when nothing useful was
/// found.
pub fn extract_snippets(source: &str, outline: &SourceOutline) -> Option<CodeSnippets> {
    let snippets = CodeSnippets {
        imports: import_block(source),
        component_decorator: component_decorator(outline),
        class_signature: class_signature(outline),
        common_methods: common_methods(outline),
    };
    if snippets.is_empty() {
        None
    } else {
        Some(snippets)
    }
}

/// Import statements among the first twenty lines, joined verbatim.
fn import_block(source: &str) -> Option<String> {
    let lines: Vec<&str> = source
        .lines()
        .take(IMPORT_SCAN_LINES)
        .filter(|line| {
            let trimmed = line.trim_start();
            trimmed.starts_with("import ") || trimmed.starts_with("from ")
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(cap(lines.join("\n")))
    }
}

/// First Angular-style component or module decorator, if any.
fn component_decorator(outline: &SourceOutline) -> Option<String> {
    outline
        .all_decorators()
        .find(|decorator| {
            let lower = decorator.to_lowercase();
            lower.contains("@component") || lower.contains("@ngmodule")
        })
        .map(|decorator| cap(decorator.to_string()))
}

/// Signature of the first class, falling back to the first function.
fn class_signature(outline: &SourceOutline) -> Option<String> {
    if let Some(class) = outline.classes.first() {
        let signature = match class.bases.first() {
            Some(base) => format!("class {} extends {}", class.name, base),
            None => format!("class {}", class.name),
        };
        return Some(cap(signature));
    }
    outline.functions.first().map(|func| {
        let params = func.parameters.join(", ");
        let signature = if func.is_exported {
            format!("export function {}({})", func.name, params)
        } else {
            format!("function {}({})", func.name, params)
        };
        cap(signature)
    })
}

/// Method signatures class by class, then top-level functions, capped at
/// five.
fn common_methods(outline: &SourceOutline) -> Vec<String> {
    let mut methods = Vec::new();
    for class in &outline.classes {
        for method in &class.methods {
            if methods.len() >= MAX_COMMON_METHODS {
                return methods;
            }
            methods.push(cap(method_signature(method)));
        }
    }
    for func in &outline.functions {
        if methods.len() >= MAX_COMMON_METHODS {
            break;
        }
        methods.push(cap(format!(
            "{}({})",
            func.name,
            func.parameters.join(", ")
        )));
    }
    methods
}

fn method_signature(method: &FunctionDef) -> String {
    let params = method.parameters.join(", ");
    match &method.return_type {
        Some(ret) if !ret.is_empty() => format!("{}({}): {}", method.name, params, ret),
        _ => format!("{}({})", method.name, params),
    }
}

/// Truncates to the display limit, counted in characters.
fn cap(text: String) -> String {
    if text.chars().count() > SNIPPET_CHAR_LIMIT {
        let mut truncated: String = text.chars().take(SNIPPET_CHAR_LIMIT - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        text
    }
}
