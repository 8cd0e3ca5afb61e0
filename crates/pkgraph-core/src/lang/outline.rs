//! Normalized definition outline extracted from one source file.

/// A function or method definition.
#[derive(Debug, Clone, Default)]
pub struct FunctionDef {
    pub name: String,
    /// Individual parameter texts without the surrounding parentheses.
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub docstring: Option<String>,
    pub is_async: bool,
    /// Decorator / annotation texts, including their marker character.
    pub decorators: Vec<String>,
    pub is_exported: bool,
}

impl FunctionDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_exported: true,
            ..Default::default()
        }
    }

    /// `name(params)` or `name(params) -> ret`.
    pub fn signature(&self) -> String {
        let params = self.parameters.join(", ");
        match &self.return_type {
            Some(ret) if !ret.is_empty() => format!("{}({}) -> {}", self.name, params, ret),
            _ => format!("{}({})", self.name, params),
        }
    }
}

/// A class (or struct/typedef in C-family languages) definition.
#[derive(Debug, Clone, Default)]
pub struct ClassDef {
    pub name: String,
    pub docstring: Option<String>,
    pub methods: Vec<FunctionDef>,
    /// Base class names from `extends` clauses or superclass lists.
    pub bases: Vec<String>,
    /// Interface names from `implements` clauses.
    pub implements: Vec<String>,
    pub decorators: Vec<String>,
    /// Raw field declaration texts.
    pub fields: Vec<String>,
    /// Class-level annotation / attribute texts (Java, C#).
    pub annotations: Vec<String>,
}

impl ClassDef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// An interface definition.
#[derive(Debug, Clone, Default)]
pub struct InterfaceDef {
    pub name: String,
    pub methods: Vec<String>,
}

/// A call site inside a module.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// Raw callee expression text, e.g. `find_user` or `service.findAll`.
    pub callee: String,
    pub arguments: Vec<String>,
}

/// A top-level variable binding.
#[derive(Debug, Clone)]
pub struct VariableDef {
    pub target: String,
    pub value: String,
}

/// Everything a normalizer extracts from one file.
#[derive(Debug, Clone, Default)]
pub struct SourceOutline {
    /// Verbatim import statement texts.
    pub imports: Vec<String>,
    pub functions: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
    pub interfaces: Vec<InterfaceDef>,
    pub calls: Vec<CallSite>,
    pub variables: Vec<VariableDef>,
    /// Server-side include targets (classic ASP).
    pub includes: Vec<String>,
}

impl SourceOutline {
    /// True when nothing at all was extracted. Such files produce a
    /// `no_definitions` warning and no module.
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.functions.is_empty()
            && self.classes.is_empty()
            && self.interfaces.is_empty()
            && self.calls.is_empty()
            && self.variables.is_empty()
            && self.includes.is_empty()
    }

    /// All decorator texts in the outline, for framework marker scans.
    pub fn all_decorators(&self) -> impl Iterator<Item = &str> {
        self.functions
            .iter()
            .flat_map(|f| f.decorators.iter())
            .chain(self.classes.iter().flat_map(|c| {
                c.decorators
                    .iter()
                    .chain(c.annotations.iter())
                    .chain(c.methods.iter().flat_map(|m| m.decorators.iter()))
            }))
            .map(|s| s.as_str())
    }
}
