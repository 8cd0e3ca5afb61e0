//! Registry mapping file extensions to language normalizers.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::asp::AspNormalizer;
use super::c::CNormalizer;
use super::cpp::CppNormalizer;
use super::csharp::CSharpNormalizer;
use super::java::JavaNormalizer;
use super::javascript::JavaScriptNormalizer;
use super::python::PythonNormalizer;
use super::traits::Normalizer;
use super::typescript::TypeScriptNormalizer;

pub struct NormalizerRegistry {
    normalizers: HashMap<String, Arc<dyn Normalizer>>,
}

impl NormalizerRegistry {
    /// Builds a registry with every built-in language normalizer.
    pub fn new() -> Self {
        let mut registry = Self {
            normalizers: HashMap::new(),
        };

        registry.register(Arc::new(TypeScriptNormalizer::typescript()));
        registry.register(Arc::new(TypeScriptNormalizer::tsx()));
        registry.register(Arc::new(JavaScriptNormalizer::new()));
        registry.register(Arc::new(PythonNormalizer::new()));
        registry.register(Arc::new(JavaNormalizer::new()));
        registry.register(Arc::new(CNormalizer::new()));
        registry.register(Arc::new(CppNormalizer::new()));
        registry.register(Arc::new(CSharpNormalizer::new()));
        registry.register(Arc::new(AspNormalizer::asp()));
        registry.register(Arc::new(AspNormalizer::aspx()));

        registry
    }

    /// Registers a normalizer for each of its extensions.
    pub fn register(&mut self, normalizer: Arc<dyn Normalizer>) {
        for ext in normalizer.extensions() {
            self.normalizers
                .insert(ext.to_lowercase(), Arc::clone(&normalizer));
        }
    }

    pub fn for_extension(&self, extension: &str) -> Option<Arc<dyn Normalizer>> {
        self.normalizers.get(&extension.to_lowercase()).cloned()
    }

    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn Normalizer>> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.for_extension(e))
    }

    pub fn can_handle(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.normalizers.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_languages() {
        let registry = NormalizerRegistry::new();
        for ext in ["ts", "tsx", "js", "py", "java", "c", "cpp", "cs", "asp", "aspx"] {
            assert!(
                registry.for_extension(ext).is_some(),
                "missing normalizer for {ext}"
            );
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = NormalizerRegistry::new();
        assert!(registry.for_extension("PY").is_some());
        assert!(registry.for_extension("Ts").is_some());
    }

    #[test]
    fn test_for_path() {
        let registry = NormalizerRegistry::new();
        assert!(registry.can_handle(Path::new("src/app.controller.ts")));
        assert!(registry.can_handle(Path::new("Main.java")));
        assert!(!registry.can_handle(Path::new("README.md")));
        assert!(!registry.can_handle(Path::new("Makefile")));
    }

    #[test]
    fn test_language_names() {
        let registry = NormalizerRegistry::new();
        let ts = registry.for_extension("tsx").unwrap();
        assert_eq!(ts.language(), "typescript");
        let asp = registry.for_extension("aspx").unwrap();
        assert_eq!(asp.language(), "aspx");
    }

    #[test]
    fn test_supported_extensions_sorted_and_resolvable() {
        let registry = NormalizerRegistry::new();
        let extensions = registry.supported_extensions();
        let mut sorted = extensions.clone();
        sorted.sort();
        assert_eq!(extensions, sorted);
        for ext in &extensions {
            assert!(
                crate::lang::detect_language(Path::new(&format!("x.{ext}"))).is_some(),
                "no language mapping for .{ext}"
            );
        }
    }
}
