//! Python normalizer using tree-sitter.

use tree_sitter::Node;

use super::outline::{CallSite, ClassDef, FunctionDef, SourceOutline, VariableDef};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::{strip_string_quotes, TreeSitterNormalizer};

pub struct PythonNormalizer {
    base: TreeSitterNormalizer,
}

impl PythonNormalizer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterNormalizer::new(tree_sitter_python::LANGUAGE.into(), "python"),
        }
    }

    fn extract_function(&self, node: &Node, content: &str) -> Option<FunctionDef> {
        let name_node = node.child_by_field_name("name")?;
        let name = TreeSitterNormalizer::node_text(&name_node, content).to_string();

        let parameters = node
            .child_by_field_name("parameters")
            .map(|p| TreeSitterNormalizer::parameter_texts(&p, content))
            .unwrap_or_default();

        let return_type = node
            .child_by_field_name("return_type")
            .map(|n| TreeSitterNormalizer::node_text(&n, content).to_string());

        let is_async = TreeSitterNormalizer::node_text(node, content).starts_with("async ");

        Some(FunctionDef {
            name,
            parameters,
            return_type,
            docstring: self.extract_docstring(node, content),
            is_async,
            decorators: Self::decorators_of(node, content),
            is_exported: true,
        })
    }

    fn extract_class(&self, node: &Node, content: &str) -> Option<ClassDef> {
        let name_node = node.child_by_field_name("name")?;
        let mut class = ClassDef::named(TreeSitterNormalizer::node_text(&name_node, content));
        class.docstring = self.extract_docstring(node, content);
        class.decorators = Self::decorators_of(node, content);

        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            class.bases = superclasses
                .children(&mut cursor)
                .filter(|c| c.kind() == "identifier" || c.kind() == "attribute")
                .map(|c| TreeSitterNormalizer::node_text(&c, content).to_string())
                .collect();
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for stmt in body.children(&mut cursor) {
                // Decorated methods sit one level down.
                let func_node = if stmt.kind() == "decorated_definition" {
                    stmt.child_by_field_name("definition")
                        .filter(|d| d.kind() == "function_definition")
                } else if stmt.kind() == "function_definition" {
                    Some(stmt)
                } else {
                    None
                };

                if let Some(func_node) = func_node {
                    if let Some(method) = self.extract_function(&func_node, content) {
                        class.methods.push(method);
                    }
                }
            }
        }

        Some(class)
    }

    /// First statement of a body that is a bare string literal.
    fn extract_docstring(&self, node: &Node, content: &str) -> Option<String> {
        let body = node.child_by_field_name("body")?;
        let mut cursor = body.walk();
        let first_stmt = body.children(&mut cursor).next()?;
        if first_stmt.kind() != "expression_statement" {
            return None;
        }

        let mut stmt_cursor = first_stmt.walk();
        let string_node = first_stmt
            .children(&mut stmt_cursor)
            .find(|c| c.kind() == "string")?;
        let cleaned = strip_string_quotes(TreeSitterNormalizer::node_text(&string_node, content));
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn decorators_of(node: &Node, content: &str) -> Vec<String> {
        let Some(parent) = node.parent() else {
            return Vec::new();
        };
        if parent.kind() != "decorated_definition" {
            return Vec::new();
        }
        let mut cursor = parent.walk();
        parent
            .children(&mut cursor)
            .filter(|c| c.kind() == "decorator")
            .map(|d| TreeSitterNormalizer::node_text(&d, content).to_string())
            .collect()
    }

    fn has_class_ancestor(node: &Node) -> bool {
        let mut current = node.parent();
        while let Some(p) = current {
            if p.kind() == "class_definition" {
                return true;
            }
            current = p.parent();
        }
        false
    }

    fn process_node(&self, node: Node, content: &str, outline: &mut SourceOutline) {
        match node.kind() {
            "import_statement" | "import_from_statement" => {
                outline
                    .imports
                    .push(TreeSitterNormalizer::node_text(&node, content).to_string());
            }
            "function_definition" => {
                // Methods are collected by their class.
                if !Self::has_class_ancestor(&node) {
                    if let Some(func) = self.extract_function(&node, content) {
                        outline.functions.push(func);
                    }
                }
            }
            "class_definition" => {
                if !Self::has_class_ancestor(&node) {
                    if let Some(class) = self.extract_class(&node, content) {
                        outline.classes.push(class);
                    }
                }
            }
            "assignment" => {
                if let (Some(left), Some(right)) = (
                    TreeSitterNormalizer::field_text(&node, "left", content),
                    TreeSitterNormalizer::field_text(&node, "right", content),
                ) {
                    let mut value = right.to_string();
                    value.truncate(200);
                    outline.variables.push(VariableDef {
                        target: left.to_string(),
                        value,
                    });
                }
            }
            "call" => {
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
            self.process_node(child, content, outline);
        }
    }
}

impl Default for PythonNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for PythonNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        self.process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_functions_and_classes() {
        let source = r#"
import os
from app.services import helper

def top_level(a, b):
    """Adds things."""
    return helper(a) + b

class UserService:
    """Service for users."""

    def find_one(self, user_id):
        """Finds a user."""
        return self.repo.get(user_id)
"#;
        let normalizer = PythonNormalizer::new();
        let outline = normalizer.normalize("src/a.py", source).unwrap();

        assert_eq!(outline.imports.len(), 2);
        assert_eq!(outline.functions.len(), 1);
        assert_eq!(outline.functions[0].name, "top_level");
        assert_eq!(outline.functions[0].parameters, vec!["a", "b"]);
        assert_eq!(
            outline.functions[0].docstring.as_deref(),
            Some("Adds things.")
        );

        assert_eq!(outline.classes.len(), 1);
        let class = &outline.classes[0];
        assert_eq!(class.name, "UserService");
        assert_eq!(class.docstring.as_deref(), Some("Service for users."));
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "find_one");
        assert_eq!(class.methods[0].docstring.as_deref(), Some("Finds a user."));
    }

    #[test]
    fn test_methods_not_duplicated_as_functions() {
        let source = "class A:\n    def m(self):\n        pass\n";
        let outline = PythonNormalizer::new().normalize("a.py", source).unwrap();
        assert!(outline.functions.is_empty());
        assert_eq!(outline.classes[0].methods.len(), 1);
    }

    #[test]
    fn test_decorators_and_async() {
        let source = "@app.route(\"/users\")\nasync def list_users():\n    pass\n";
        let outline = PythonNormalizer::new().normalize("a.py", source).unwrap();
        assert_eq!(outline.functions.len(), 1);
        assert!(outline.functions[0].is_async);
        assert_eq!(outline.functions[0].decorators, vec!["@app.route(\"/users\")"]);
    }

    #[test]
    fn test_superclasses_recorded_as_bases() {
        let source = "class Special(Base):\n    pass\n";
        let outline = PythonNormalizer::new().normalize("a.py", source).unwrap();
        assert_eq!(outline.classes[0].bases, vec!["Base"]);
    }

    #[test]
    fn test_calls_record_raw_callee() {
        let source = "def f():\n    service.run(1)\n    helper()\n";
        let outline = PythonNormalizer::new().normalize("a.py", source).unwrap();
        let callees: Vec<_> = outline.calls.iter().map(|c| c.callee.as_str()).collect();
        assert!(callees.contains(&"service.run"));
        assert!(callees.contains(&"helper"));
    }
}
