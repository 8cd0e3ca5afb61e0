//! C# normalizer using tree-sitter.

use tree_sitter::Node;

use super::outline::{CallSite, ClassDef, FunctionDef, InterfaceDef, SourceOutline};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::TreeSitterNormalizer;

pub struct CSharpNormalizer {
    base: TreeSitterNormalizer,
}

impl CSharpNormalizer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterNormalizer::new(tree_sitter_c_sharp::LANGUAGE.into(), "csharp"),
        }
    }

    fn attributes_of(node: &Node, content: &str) -> Vec<String> {
        let mut attributes = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "attribute_list" {
                attributes.push(TreeSitterNormalizer::node_text(&child, content).to_string());
            }
        }
        attributes
    }

    fn extract_method(node: &Node, content: &str) -> Option<FunctionDef> {
        let name_node = node.child_by_field_name("name")?;
        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .unwrap_or_default();

        // The return type is the first type-shaped child before the name.
        let mut return_type = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "predefined_type" | "identifier" | "generic_name" | "qualified_name"
                | "nullable_type" | "array_type" => {
                    return_type =
                        Some(TreeSitterNormalizer::node_text(&child, content).to_string());
                    break;
                }
                _ => {}
            }
        }

        Some(FunctionDef {
            name: TreeSitterNormalizer::node_text(&name_node, content).to_string(),
            parameters,
            return_type,
            docstring: None,
            is_async: false,
            decorators: Self::attributes_of(node, content),
            is_exported: false,
        })
    }

    fn extract_class(node: &Node, content: &str) -> Option<ClassDef> {
        let name_node = node.child_by_field_name("name")?;
        let mut class = ClassDef::named(TreeSitterNormalizer::node_text(&name_node, content));
        class.annotations = Self::attributes_of(node, content);
        class.decorators = class.annotations.clone();

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "method_declaration" | "constructor_declaration" => {
                        if let Some(method) = Self::extract_method(&member, content) {
                            class.methods.push(method);
                        }
                    }
                    "property_declaration" => {
                        if let Some(name) = member.child_by_field_name("name") {
                            class
                                .fields
                                .push(TreeSitterNormalizer::node_text(&name, content).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(class)
    }

    fn extract_interface(node: &Node, content: &str) -> Option<InterfaceDef> {
        let name_node = node.child_by_field_name("name")?;
        let mut interface = InterfaceDef {
            name: TreeSitterNormalizer::node_text(&name_node, content).to_string(),
            methods: Vec::new(),
        };

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                if member.kind() == "method_declaration" {
                    if let Some(name) = member.child_by_field_name("name") {
                        interface
                            .methods
                            .push(TreeSitterNormalizer::node_text(&name, content).to_string());
                    }
                }
            }
        }

        Some(interface)
    }

    fn process_node(node: Node, content: &str, outline: &mut SourceOutline) {
        match node.kind() {
            "using_directive" => {
                outline
                    .imports
                    .push(TreeSitterNormalizer::node_text(&node, content).to_string());
            }
            "class_declaration" => {
                if let Some(class) = Self::extract_class(&node, content) {
                    outline.classes.push(class);
                }
            }
            "interface_declaration" => {
                if let Some(interface) = Self::extract_interface(&node, content) {
                    outline.interfaces.push(interface);
                }
            }
            "invocation_expression" => {
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

impl Default for CSharpNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for CSharpNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        Self::process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cs"]
    }
}
