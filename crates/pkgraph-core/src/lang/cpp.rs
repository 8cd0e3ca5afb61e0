//! C++ normalizer using tree-sitter.

use tree_sitter::Node;

use super::c::CNormalizer;
use super::outline::{CallSite, ClassDef, FunctionDef, SourceOutline};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::TreeSitterNormalizer;

pub struct CppNormalizer {
    base: TreeSitterNormalizer,
}

impl CppNormalizer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterNormalizer::new(tree_sitter_cpp::LANGUAGE.into(), "cpp"),
        }
    }

    fn extract_class(node: &Node, content: &str) -> Option<ClassDef> {
        node.child_by_field_name("body")?;
        let name_node = node.child_by_field_name("name")?;
        let mut class = ClassDef::named(TreeSitterNormalizer::node_text(&name_node, content));

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "base_class_clause" {
                let mut c = child.walk();
                for base in child.named_children(&mut c) {
                    if base.kind() == "type_identifier" || base.kind() == "qualified_identifier" {
                        class
                            .bases
                            .push(TreeSitterNormalizer::node_text(&base, content).to_string());
                    }
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "function_definition" => {
                        if let Some(method) = Self::extract_method(&member, content) {
                            class.methods.push(method);
                        }
                    }
                    "declaration" | "field_declaration" => {
                        // Method declarations without a body still carry a
                        // function_declarator.
                        if let Some(declarator) = member.child_by_field_name("declarator") {
                            if let Some(method) = Self::method_from_declarator(
                                &member,
                                &declarator,
                                content,
                            ) {
                                class.methods.push(method);
                            } else if member.kind() == "field_declaration" {
                                class.fields.push(
                                    TreeSitterNormalizer::node_text(&member, content).to_string(),
                                );
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(class)
    }

    fn extract_method(node: &Node, content: &str) -> Option<FunctionDef> {
        let mut func = CNormalizer::extract_function(node, content)?;
        func.is_exported = false;
        Some(func)
    }

    fn method_from_declarator(
        member: &Node,
        declarator: &Node,
        content: &str,
    ) -> Option<FunctionDef> {
        let function_declarator = CNormalizer::unwrap_declarator(declarator)?;
        let name_node = function_declarator.child_by_field_name("declarator")?;
        let parameters = function_declarator
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .unwrap_or_default();
        let return_type = member
            .child_by_field_name("type")
            .map(|t| TreeSitterNormalizer::node_text(&t, content).to_string());

        Some(FunctionDef {
            name: TreeSitterNormalizer::node_text(&name_node, content).to_string(),
            parameters,
            return_type,
            docstring: None,
            is_async: false,
            decorators: Vec::new(),
            is_exported: false,
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
                // Methods inside class bodies are collected by the class
                // extraction above.
                let inside_class = {
                    let mut parent = node.parent();
                    let mut found = false;
                    while let Some(p) = parent {
                        if p.kind() == "field_declaration_list" {
                            found = true;
                            break;
                        }
                        parent = p.parent();
                    }
                    found
                };
                if !inside_class {
                    if let Some(func) = CNormalizer::extract_function(&node, content) {
                        outline.functions.push(func);
                    }
                }
            }
            "class_specifier" | "struct_specifier" => {
                if let Some(class) = Self::extract_class(&node, content) {
                    outline.classes.push(class);
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

impl Default for CppNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for CppNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        Self::process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "cpp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hxx"]
    }
}
