//! Java normalizer using tree-sitter.

use tree_sitter::Node;

use super::outline::{CallSite, ClassDef, FunctionDef, InterfaceDef, SourceOutline};
use super::traits::{Normalizer, ParseFailure};
use super::treesitter::{preceding_doc_comment, TreeSitterNormalizer};

pub struct JavaNormalizer {
    base: TreeSitterNormalizer,
}

impl JavaNormalizer {
    pub fn new() -> Self {
        Self {
            base: TreeSitterNormalizer::new(tree_sitter_java::LANGUAGE.into(), "java"),
        }
    }

    /// Annotations live inside the `modifiers` child of a declaration.
    fn annotations_of(node: &Node, content: &str) -> Vec<String> {
        let mut annotations = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "modifiers" {
                let mut m = child.walk();
                for modifier in child.children(&mut m) {
                    if modifier.kind() == "marker_annotation" || modifier.kind() == "annotation" {
                        annotations
                            .push(TreeSitterNormalizer::node_text(&modifier, content).to_string());
                    }
                }
            }
        }
        annotations
    }

    fn extract_method(node: &Node, content: &str) -> Option<FunctionDef> {
        let name_node = node.child_by_field_name("name")?;
        let parameters = node
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
            docstring: preceding_doc_comment(node, content),
            is_async: false,
            decorators: Self::annotations_of(node, content),
            is_exported: false,
        })
    }

    fn extract_class(node: &Node, content: &str) -> Option<ClassDef> {
        let name_node = node.child_by_field_name("name")?;
        let mut class = ClassDef::named(TreeSitterNormalizer::node_text(&name_node, content));
        class.docstring = preceding_doc_comment(node, content);
        class.annotations = Self::annotations_of(node, content);
        class.decorators = class.annotations.clone();

        if let Some(superclass) = node.child_by_field_name("superclass") {
            let mut cursor = superclass.walk();
            for child in superclass.named_children(&mut cursor) {
                class
                    .bases
                    .push(TreeSitterNormalizer::node_text(&child, content).to_string());
            }
        }

        if let Some(interfaces) = node.child_by_field_name("interfaces") {
            let mut cursor = interfaces.walk();
            for type_list in interfaces.named_children(&mut cursor) {
                let mut t = type_list.walk();
                for ty in type_list.named_children(&mut t) {
                    class
                        .implements
                        .push(TreeSitterNormalizer::node_text(&ty, content).to_string());
                }
            }
        }

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "method_declaration" | "constructor_declaration" => {
                        if let Some(method) = Self::extract_method(&member, content) {
                            class.methods.push(method);
                        }
                    }
                    "field_declaration" => {
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
            "import_declaration" => {
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
            "method_invocation" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name_text = TreeSitterNormalizer::node_text(&name, content);
                    let callee = match node.child_by_field_name("object") {
                        Some(object) => format!(
                            "{}.{}",
                            TreeSitterNormalizer::node_text(&object, content),
                            name_text
                        ),
                        None => name_text.to_string(),
                    };
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

impl Default for JavaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer for JavaNormalizer {
    fn normalize(&self, path: &str, source: &str) -> Result<SourceOutline, ParseFailure> {
        let tree = self.base.parse_tree(path, source)?;
        let mut outline = SourceOutline::default();
        Self::process_node(tree.root_node(), source, &mut outline);
        Ok(outline)
    }

    fn language(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_annotated_class() {
        let source = r#"
import org.springframework.web.bind.annotation.RestController;

@RestController
public class UserController extends BaseController implements Versioned {
    @GetMapping("/users")
    public List<User> findAll() {
        return service.findAll();
    }
}
"#;
        let outline = JavaNormalizer::new()
            .normalize("UserController.java", source)
            .unwrap();

        assert_eq!(outline.imports.len(), 1);
        assert_eq!(outline.classes.len(), 1);
        let class = &outline.classes[0];
        assert_eq!(class.name, "UserController");
        assert_eq!(class.annotations, vec!["@RestController"]);
        assert_eq!(class.bases, vec!["BaseController"]);
        assert_eq!(class.implements, vec!["Versioned"]);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].name, "findAll");
        assert_eq!(class.methods[0].decorators, vec!["@GetMapping(\"/users\")"]);
        assert_eq!(class.methods[0].return_type.as_deref(), Some("List<User>"));
        assert_eq!(outline.calls.len(), 1);
        assert_eq!(outline.calls[0].callee, "service.findAll");
    }

    #[test]
    fn test_collects_call_sites() {
        let source = r#"
public class Mailer {
    public void send(String to) {
        validate(to);
        client.deliver(to, "welcome");
    }
}
"#;
        let outline = JavaNormalizer::new().normalize("Mailer.java", source).unwrap();
        let callees: Vec<&str> = outline.calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, vec!["validate", "client.deliver"]);
        assert_eq!(outline.calls[1].arguments, vec!["to", "\"welcome\""]);
    }

    #[test]
    fn test_extracts_interface() {
        let source = "public interface Repository {\n  User findOne(long id);\n  void save(User u);\n}";
        let outline = JavaNormalizer::new().normalize("Repository.java", source).unwrap();
        assert_eq!(outline.interfaces.len(), 1);
        assert_eq!(outline.interfaces[0].methods, vec!["findOne", "save"]);
    }
}
