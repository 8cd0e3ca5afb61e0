//! JavaScript normalizer using tree-sitter.

use tree_sitter::Node;

use super::outline::{CallSite, ClassDef, FunctionDef, SourceOutline, VariableDef};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::{preceding_doc_comment, TreeSitterNormalizer};

pub struct JavaScriptNormalizer {
    base: TreeSitterNormalizer,
    extensions: &'static [&'static str],
}

impl JavaScriptNormalizer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterNormalizer::new(
                tree_sitter_javascript::LANGUAGE.into(),
                "javascript",
            ),
            extensions: &["js", "jsx", "mjs", "cjs"],
        }
    }

    fn extract_function(node: &Node, content: &str) -> Option<FunctionDef> {
        let name_node = node.child_by_field_name("name")?;
        let name = TreeSitterNormalizer::node_text(&name_node, content).to_string();

        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .unwrap_or_default();

        let is_async = {
            let mut cursor = node.walk();
            node.children(&mut cursor).any(|c| c.kind() == "async")
        };

        Some(FunctionDef {
            name,
            parameters,
            return_type: None,
            docstring: preceding_doc_comment(node, content),
            is_async,
            decorators: Vec::new(),
            is_exported: true,
        })
    }

    /// Arrow functions only produce a definition when bound to a name,
    /// `const handler = async (req) => ...`.
    fn extract_arrow_function(node: &Node, content: &str) -> Option<FunctionDef> {
        let declarator = node.parent().filter(|p| p.kind() == "variable_declarator")?;
        let name_node = declarator.child_by_field_name("name")?;

        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .or_else(|| {
                node.child_by_field_name("parameter")
                    .map(|p| vec![TreeSitterNormalizer::node_text(&p, content).to_string()])
            })
            .unwrap_or_default();

        let is_async = {
            let mut cursor = node.walk();
            node.children(&mut cursor).any(|c| c.kind() == "async")
        };

        Some(FunctionDef {
            name: TreeSitterNormalizer::node_text(&name_node, content).to_string(),
            parameters,
            return_type: None,
            docstring: None,
            is_async,
            decorators: Vec::new(),
            is_exported: true,
        })
    }

    fn extract_class(node: &Node, content: &str) -> Option<ClassDef> {
        let name_node = node.child_by_field_name("name")?;
        let mut class = ClassDef::named(TreeSitterNormalizer::node_text(&name_node, content));
        class.docstring = preceding_doc_comment(node, content);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "class_heritage" {
                // `class A extends B` puts the superclass expression after
                // the extends keyword.
                let mut c = child.walk();
                for value in child.named_children(&mut c) {
                    class
                        .bases
                        .push(TreeSitterNormalizer::node_text(&value, content).to_string());
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            for member in body.children(&mut body_cursor) {
                if member.kind() == "method_definition" {
                    if let Some(method) = Self::extract_function(&member, content) {
                        class.methods.push(FunctionDef {
                            is_exported: false,
                            ..method
                        });
                    }
                }
            }
        }

        Some(class)
    }

    fn extract_variable(node: &Node, content: &str, outline: &mut SourceOutline) {
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            // Arrow function bindings are reported as functions instead.
            if declarator
                .child_by_field_name("value")
                .is_some_and(|v| v.kind() == "arrow_function")
            {
                continue;
            }
            let Some(name) = TreeSitterNormalizer::field_text(&declarator, "name", content) else {
                continue;
            };
            let mut value = TreeSitterNormalizer::field_text(&declarator, "value", content)
                .unwrap_or_default()
                .to_string();
            value.truncate(200);
            outline.variables.push(VariableDef {
                target: name.to_string(),
                value,
            });
        }
    }

    fn process_node(node: Node, content: &str, outline: &mut SourceOutline) {
        match node.kind() {
            "import_statement" => {
                outline
                    .imports
                    .push(TreeSitterNormalizer::node_text(&node, content).to_string());
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(func) = Self::extract_function(&node, content) {
                    outline.functions.push(func);
                }
            }
            "arrow_function" => {
                if let Some(func) = Self::extract_arrow_function(&node, content) {
                    outline.functions.push(func);
                }
            }
            "class_declaration" => {
                if let Some(class) = Self::extract_class(&node, content) {
                    outline.classes.push(class);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                Self::extract_variable(&node, content, outline);
            }
            "call_expression" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let callee = TreeSitterNormalizer::node_text(&func, content).to_string();
                    let arguments = node
                        .child_by_field_name("arguments")
                        .map(|a| TreeSitterNormalizer::argument_texts(&a, content))
                        .unwrap_or_default();
                    outline.calls.push(CallSite { callee, arguments });
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            Self::process_node(child, content, outline);
        }
    }
}

impl Default for JavaScriptNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for JavaScriptNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        Self::process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }
}
