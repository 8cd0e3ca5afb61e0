//! TypeScript normalizer using tree-sitter.
//!
//! Two grammar variants share the extraction logic: plain TypeScript for
//! `.ts` and the TSX grammar for `.tsx`.

use tree_sitter::Node;

use super::outline::{CallSite, ClassDef, FunctionDef, InterfaceDef, SourceOutline, VariableDef};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::{preceding_doc_comment, TreeSitterNormalizer};

pub struct TypeScriptNormalizer {
    base: TreeSitterNormalizer,
    extensions: &'static [&'static str],
}

impl TypeScriptNormalizer {
    /// Normalizer for `.ts` sources.
    pub fn typescript() -> Self {
        Self {
            base: TreeSitterNormalizer::new(
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                "typescript",
            ),
            extensions: &["ts"],
        }
    }

    /// Normalizer for `.tsx` sources.
    pub fn tsx() -> Self {
        Self {
            base: TreeSitterNormalizer::new(
                tree_sitter_typescript::LANGUAGE_TSX.into(),
                "typescript",
            ),
            extensions: &["tsx"],
        }
    }

    fn extract_function(node: &Node, content: &str) -> Option<FunctionDef> {
        let name_node = node.child_by_field_name("name")?;
        let name = TreeSitterNormalizer::node_text(&name_node, content).to_string();

        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .unwrap_or_default();

        let return_type = node.child_by_field_name("return_type").map(|n| {
            TreeSitterNormalizer::node_text(&n, content)
                .trim_start_matches(':')
                .trim()
                .to_string()
        });

        let is_async = {
            let mut cursor = node.walk();
            node.children(&mut cursor).any(|c| c.kind() == "async")
        };

        let mut decorators = Self::sibling_decorators(node, content);
        Self::collect_decorators(node, content, &mut decorators);

        Some(FunctionDef {
            name,
            parameters,
            return_type,
            docstring: preceding_doc_comment(node, content),
            is_async,
            decorators,
            is_exported: true,
        })
    }

    fn extract_class(node: &Node, content: &str) -> Option<ClassDef> {
        let name_node = node.child_by_field_name("name")?;
        let mut class = ClassDef::named(TreeSitterNormalizer::node_text(&name_node, content));
        class.docstring = preceding_doc_comment(node, content);

        // `@Dec export class` hangs the decorators off the export statement,
        // `@Dec class` off the declaration itself.
        if let Some(parent) = node.parent() {
            if parent.kind() == "export_statement" {
                Self::collect_decorators(&parent, content, &mut class.decorators);
            }
        }
        Self::collect_decorators(node, content, &mut class.decorators);

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "class_heritage" {
                Self::extract_heritage(&child, content, &mut class);
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut body_cursor = body.walk();
            for member in body.children(&mut body_cursor) {
                match member.kind() {
                    "method_definition" => {
                        if let Some(method) = Self::extract_function(&member, content) {
                            class.methods.push(FunctionDef {
                                is_exported: false,
                                ..method
                            });
                        }
                    }
                    "public_field_definition" | "property_signature" => {
                        class
                            .fields
                            .push(TreeSitterNormalizer::node_text(&member, content).to_string());
                    }
                    _ => {}
                }
            }
        }

        Some(class)
    }

    fn extract_heritage(heritage: &Node, content: &str, class: &mut ClassDef) {
        let mut cursor = heritage.walk();
        for clause in heritage.children(&mut cursor) {
            match clause.kind() {
                "extends_clause" => {
                    let mut c = clause.walk();
                    for value in clause.named_children(&mut c) {
                        if value.kind() == "identifier"
                            || value.kind() == "member_expression"
                            || value.kind() == "generic_type"
                        {
                            class
                                .bases
                                .push(TreeSitterNormalizer::node_text(&value, content).to_string());
                        }
                    }
                }
                "implements_clause" => {
                    let mut c = clause.walk();
                    for value in clause.named_children(&mut c) {
                        class
                            .implements
                            .push(TreeSitterNormalizer::node_text(&value, content).to_string());
                    }
                }
                _ => {}
            }
        }
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
                if member.kind() == "method_signature" {
                    if let Some(method_name) = member.child_by_field_name("name") {
                        interface
                            .methods
                            .push(TreeSitterNormalizer::node_text(&method_name, content).to_string());
                    }
                }
            }
        }

        Some(interface)
    }

    fn collect_decorators(owner: &Node, content: &str, out: &mut Vec<String>) {
        let mut cursor = owner.walk();
        for child in owner.children(&mut cursor) {
            if child.kind() == "decorator" {
                out.push(TreeSitterNormalizer::node_text(&child, content).to_string());
            }
        }
    }

    /// Decorators written as preceding siblings of a declaration.
    fn sibling_decorators(node: &Node, content: &str) -> Vec<String> {
        let mut decorators = Vec::new();
        let mut sibling = node.prev_sibling();
        while let Some(s) = sibling {
            if s.kind() == "decorator" {
                decorators.push(TreeSitterNormalizer::node_text(&s, content).to_string());
            } else {
                break;
            }
            sibling = s.prev_sibling();
        }
        decorators.reverse();
        decorators
    }

    fn extract_variable(node: &Node, content: &str, outline: &mut SourceOutline) {
        let mut cursor = node.walk();
        for declarator in node.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
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

impl Normalizer for TypeScriptNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        Self::process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }
}
