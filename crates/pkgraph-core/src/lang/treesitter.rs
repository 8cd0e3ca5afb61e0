//! Tree-sitter parsing utilities shared across language normalizers.

use tree_sitter::{Language, Node, Parser as TsParser, Tree};

use super::traits::ParseFailure;

/// Base tree-sitter wrapper owned by each language normalizer.
pub struct TreeSitterNormalizer {
    language: Language,
    language_name: &'static str,
}

impl TreeSitterNormalizer {
    pub fn new(language: Language, language_name: &'static str) -> Self {
        Self {
            language,
            language_name,
        }
    }

    /// Parse source into a tree-sitter tree.
    pub fn parse_tree(&self, path: &str, content: &str) -> Result<Tree, ParseFailure> {
        let mut parser = TsParser::new();
        parser.set_language(&self.language).map_err(|e| {
            ParseFailure::new(
                format!("Failed to set language: {}", e),
                path,
                self.language_name,
            )
        })?;

        parser.parse(content, None).ok_or_else(|| {
            ParseFailure::new("Failed to parse content", path, self.language_name)
        })
    }

    pub fn language_name(&self) -> &'static str {
        self.language_name
    }

    /// Get text for a node from source content.
    pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
        content.get(node.byte_range()).unwrap_or("")
    }

    /// Text of a named field child, if present.
    pub fn field_text<'a>(node: &Node, field: &str, content: &'a str) -> Option<&'a str> {
        node.child_by_field_name(field)
            .map(|n| Self::node_text(&n, content))
    }

    /// Individual parameter texts from a parameter-list node, parentheses and
    /// commas dropped.
    pub fn parameter_texts(params_node: &Node, content: &str) -> Vec<String> {
        let mut cursor = params_node.walk();
        params_node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .map(|c| Self::node_text(&c, content).to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Argument texts from a call argument-list node.
    pub fn argument_texts(args_node: &Node, content: &str) -> Vec<String> {
        let mut cursor = args_node.walk();
        args_node
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .map(|c| Self::node_text(&c, content).to_string())
            .collect()
    }
}

/// JSDoc-style doc comment immediately preceding a node, when it starts
/// with `/**`. Exported declarations sit inside an `export_statement`, so
/// the comment precedes the wrapper rather than the declaration itself.
pub fn preceding_doc_comment(node: &Node, content: &str) -> Option<String> {
    let prev = match node.prev_sibling() {
        Some(prev) if prev.kind() != "export" && prev.kind() != "default" => prev,
        _ => {
            let parent = node.parent()?;
            if parent.kind() != "export_statement" {
                return None;
            }
            parent.prev_sibling()?
        }
    };
    if prev.kind() != "comment" {
        return None;
    }
    let text = TreeSitterNormalizer::node_text(&prev, content);
    if !text.starts_with("/**") {
        return None;
    }
    let cleaned = text
        .trim_start_matches("/**")
        .trim_end_matches("*/")
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Strip triple or single string quotes from a docstring literal.
pub fn strip_string_quotes(text: &str) -> String {
    text.trim()
        .trim_start_matches("\"\"\"")
        .trim_end_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("'''")
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim_start_matches('\'')
        .trim_end_matches('\'')
        .trim()
        .to_string()
}
