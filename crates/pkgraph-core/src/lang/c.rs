//! C normalizer using tree-sitter.

use tree_sitter::Node;

use super::outline::{CallSite, ClassDef, FunctionDef, SourceOutline};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::TreeSitterNormalizer;

pub struct CNormalizer {
    base: TreeSitterNormalizer,
}

impl CNormalizer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterNormalizer::new(tree_sitter_c::LANGUAGE.into(), "c"),
        }
    }

    /// Unwraps pointer declarators down to the `function_declarator`,
    /// returning the function name and its parameter list node.
    pub(crate) fn unwrap_declarator<'a>(node: &Node<'a>) -> Option<Node<'a>> {
        let mut current = *node;
        loop {
            match current.kind() {
                "function_declarator" => return Some(current),
                "pointer_declarator" | "reference_declarator" => {
                    current = current.child_by_field_name("declarator")?;
                }
                _ => return None,
            }
        }
    }

    pub(crate) fn extract_function(node: &Node, content: &str) -> Option<FunctionDef> {
        let declarator = node.child_by_field_name("declarator")?;
        let function_declarator = Self::unwrap_declarator(&declarator)?;
        let name_node = function_declarator.child_by_field_name("declarator")?;
        let parameters = function_declarator
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("type")
            .map(|t| TreeSitterNormalizer::node_text(&t, content).to_string());

        Some(FunctionDef {
            name: TreeSitterNormalizer::node_text(&name_node, content).to_string(),
            parameters,
            return_type,
            docstring: None,
            is_async: false,
            decorators: Vec::new(),
            is_exported: true,
        })
    }

    fn process_node(node: Node, content: &str, outline: &mut SourceOutline) {
        match node.kind() {
            "preproc_include" => {
                let text = TreeSitterNormalizer::node_text(&node, content).trim().to_string();
                outline.imports.push(text.clone());
                outline.includes.push(text);
            }
            "function_definition" => {
                if let Some(func) = Self::extract_function(&node, content) {
                    outline.functions.push(func);
                }
            }
            "struct_specifier" => {
                // Only named struct definitions, not bare references.
                if node.child_by_field_name("body").is_some() {
                    if let Some(name) = node.child_by_field_name("name") {
                        outline.classes.push(ClassDef::named(
                            TreeSitterNormalizer::node_text(&name, content),
                        ));
                    }
                }
            }
            "type_definition" => {
                if let Some(declarator) = node.child_by_field_name("declarator") {
                    if declarator.kind() == "type_identifier" {
                        outline.classes.push(ClassDef::named(
                            TreeSitterNormalizer::node_text(&declarator, content),
                        ));
                    }
                }
            }
            "call_expression" => {
                if let Some(func) = node.child_by_field_name("function") {
                    let callee = TreeSitterNormalizer::node_text(&func, content).to_string();
                    let arguments = node
                        .child_by_field_name("arguments")
                        .map(|args| TreeSitterNormalizer::argument_texts(&args, content))
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

impl Default for CNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for CNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        Self::process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["c", "h"]
    }
}
