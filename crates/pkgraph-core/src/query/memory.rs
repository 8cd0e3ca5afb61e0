//! Query engine over an in-memory document.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::PkgError;
use crate::model::{Endpoint, Module, Pkg, Symbol};

use super::{
    endpoints_matching_path, impact_from_ids, modules_matching_kind, modules_matching_path,
    modules_matching_tag, symbols_matching_name, Dependencies, GraphQueries, ImpactSet,
    ModuleGraph,
};

/// Answers structural queries directly over a loaded [`Pkg`].
///
/// Construction builds the module-level graph projection and the id indexes
/// once; every query afterwards is a pure lookup with no I/O, so this engine
/// stays usable when no graph database is around.
pub struct MemoryQueryEngine {
    pkg: Pkg,
    graph: ModuleGraph,
    modules_by_id: HashMap<String, usize>,
    symbols_by_id: HashMap<String, usize>,
    endpoints_by_id: HashMap<String, usize>,
}

impl MemoryQueryEngine {
    pub fn new(pkg: Pkg) -> Self {
        let graph = ModuleGraph::build(&pkg.modules, &pkg.symbols, &pkg.endpoints, &pkg.edges);
        let modules_by_id = index_first(&pkg.modules, |m: &Module| m.id.as_str());
        let symbols_by_id = index_first(&pkg.symbols, |s: &Symbol| s.id.as_str());
        let endpoints_by_id = index_first(&pkg.endpoints, |e: &Endpoint| e.id.as_str());
        Self {
            pkg,
            graph,
            modules_by_id,
            symbols_by_id,
            endpoints_by_id,
        }
    }

    /// The document this engine answers from.
    pub fn pkg(&self) -> &Pkg {
        &self.pkg
    }
}

/// Position of the first record per id. Duplicate ids (legal for endpoints)
/// keep their first occurrence, matching the document-scan helpers.
fn index_first<T>(items: &[T], id_of: impl Fn(&T) -> &str) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (position, item) in items.iter().enumerate() {
        index.entry(id_of(item).to_string()).or_insert(position);
    }
    index
}

#[async_trait]
impl GraphQueries for MemoryQueryEngine {
    async fn modules_by_tag(&self, tag: &str) -> Result<Vec<Module>, PkgError> {
        Ok(modules_matching_tag(&self.pkg.modules, tag))
    }

    async fn modules_by_kind(&self, kind: &str) -> Result<Vec<Module>, PkgError> {
        Ok(modules_matching_kind(&self.pkg.modules, kind))
    }

    async fn modules_by_path_pattern(&self, pattern: &str) -> Result<Vec<Module>, PkgError> {
        modules_matching_path(&self.pkg.modules, pattern)
    }

    async fn symbols_by_name(&self, pattern: &str) -> Result<Vec<Symbol>, PkgError> {
        symbols_matching_name(&self.pkg.symbols, pattern)
    }

    async fn endpoints_by_path(&self, pattern: &str) -> Result<Vec<Endpoint>, PkgError> {
        endpoints_matching_path(&self.pkg.endpoints, pattern)
    }

    async fn module_by_id(&self, id: &str) -> Result<Option<Module>, PkgError> {
        Ok(self
            .modules_by_id
            .get(id)
            .map(|&position| self.pkg.modules[position].clone()))
    }

    async fn symbol_by_id(&self, id: &str) -> Result<Option<Symbol>, PkgError> {
        Ok(self
            .symbols_by_id
            .get(id)
            .map(|&position| self.pkg.symbols[position].clone()))
    }

    async fn endpoint_by_id(&self, id: &str) -> Result<Option<Endpoint>, PkgError> {
        Ok(self
            .endpoints_by_id
            .get(id)
            .map(|&position| self.pkg.endpoints[position].clone()))
    }

    async fn endpoints_by_module(&self, module_id: &str) -> Result<Vec<Endpoint>, PkgError> {
        Ok(self
            .pkg
            .endpoints
            .iter()
            .filter(|e| e.handler_module_id == module_id)
            .cloned()
            .collect())
    }

    async fn dependencies(&self, module_id: &str) -> Result<Dependencies, PkgError> {
        Ok(self.graph.dependencies(module_id))
    }

    async fn impacted_modules(
        &self,
        seed_ids: &[String],
        depth: usize,
    ) -> Result<ImpactSet, PkgError> {
        let (ids, depth_reached) = self.graph.impact(seed_ids, depth);
        Ok(impact_from_ids(ids, depth_reached, &self.pkg.modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ids, Edge, EdgeKind, HttpMethod, ProjectInfo, SymbolKind};

    fn module(path: &str, kind: &[&str]) -> Module {
        Module {
            id: ids::module_id(path),
            path: path.to_string(),
            kind: kind.iter().map(|k| k.to_string()).collect(),
            loc: 1,
            hash: "h".to_string(),
            exports: Vec::new(),
            imports: Vec::new(),
            raw_imports: Vec::new(),
            framework: None,
            framework_confidence: None,
            module_summary: None,
            code_snippets: None,
        }
    }

    fn symbol(module_path: &str, name: &str) -> Symbol {
        let module_id = ids::module_id(module_path);
        Symbol {
            id: ids::symbol_id(&module_id, name),
            module_id,
            name: name.to_string(),
            kind: SymbolKind::Function,
            is_exported: true,
            signature: format!("{name}()"),
            visibility: "public".to_string(),
            is_async: None,
            decorators: None,
            parameters: None,
            return_type: None,
            summary: None,
        }
    }

    fn endpoint(method: HttpMethod, path: &str, module_path: &str) -> Endpoint {
        Endpoint {
            id: ids::endpoint_id(method.as_str(), path),
            method,
            path: path.to_string(),
            handler_module_id: ids::module_id(module_path),
            handler_symbol_id: None,
            summary: format!("{} {}", method.as_str(), path),
        }
    }

    /// a -> b -> c via imports, with a controller endpoint on b.
    fn test_pkg() -> Pkg {
        Pkg {
            version: "1.0.0".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            git_sha: None,
            project: ProjectInfo {
                id: "demo".to_string(),
                name: "demo".to_string(),
                root_path: "/tmp/demo".to_string(),
                languages: vec!["typescript".to_string()],
                frameworks: Vec::new(),
                build_tools: Vec::new(),
                git_sha: None,
                metadata: serde_json::Map::new(),
            },
            modules: vec![
                module("src/a.ts", &["controller"]),
                module("src/b.ts", &["service"]),
                module("src/c.ts", &["util"]),
            ],
            symbols: vec![symbol("src/b.ts", "helper")],
            endpoints: vec![endpoint(HttpMethod::Get, "/users", "src/b.ts")],
            edges: vec![
                Edge::new("mod:src/a.ts", "mod:src/b.ts", EdgeKind::Imports),
                Edge::new("mod:src/b.ts", "mod:src/c.ts", EdgeKind::Imports),
                Edge::new("mod:src/b.ts", "sym:mod:src/b.ts:helper", EdgeKind::Contains),
            ],
            features: None,
        }
    }

    #[tokio::test]
    async fn test_filter_queries() {
        let engine = MemoryQueryEngine::new(test_pkg());

        let controllers = engine.modules_by_tag("CONTROLLER").await.unwrap();
        assert_eq!(controllers.len(), 1);
        assert_eq!(controllers[0].path, "src/a.ts");

        let by_path = engine.modules_by_path_pattern("src/*.ts").await.unwrap();
        assert_eq!(by_path.len(), 3);

        let symbols = engine.symbols_by_name("help*").await.unwrap();
        assert_eq!(symbols.len(), 1);

        let endpoints = engine.endpoints_by_path("/users*").await.unwrap();
        assert_eq!(endpoints.len(), 1);
    }

    #[tokio::test]
    async fn test_lookups_return_none_for_unknown_ids() {
        let engine = MemoryQueryEngine::new(test_pkg());

        assert!(engine.module_by_id("mod:src/a.ts").await.unwrap().is_some());
        assert!(engine.module_by_id("mod:gone.ts").await.unwrap().is_none());
        assert!(engine
            .symbol_by_id("sym:mod:src/b.ts:helper")
            .await
            .unwrap()
            .is_some());
        assert!(engine.endpoint_by_id("ep:GET:/users").await.unwrap().is_some());
        assert!(engine.endpoint_by_id("ep:GET:/gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_endpoints_by_module() {
        let engine = MemoryQueryEngine::new(test_pkg());
        let hits = engine.endpoints_by_module("mod:src/b.ts").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(engine
            .endpoints_by_module("mod:src/a.ts")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_dependencies_collapse_edges_to_modules() {
        let engine = MemoryQueryEngine::new(test_pkg());

        let deps = engine.dependencies("mod:src/b.ts").await.unwrap();
        assert_eq!(deps.callers, vec!["mod:src/a.ts".to_string()]);
        assert_eq!(deps.callees, vec!["mod:src/c.ts".to_string()]);
        assert_eq!(deps.fan_in_count, 1);
        assert_eq!(deps.fan_out_count, 1);

        let unknown = engine.dependencies("mod:gone.ts").await.unwrap();
        assert!(unknown.callers.is_empty());
        assert_eq!(unknown.fan_in_count, 0);
    }

    #[tokio::test]
    async fn test_impact_depth_zero_is_exactly_seeds() {
        let engine = MemoryQueryEngine::new(test_pkg());
        let seeds = vec!["mod:src/b.ts".to_string()];

        let impact = engine.impacted_modules(&seeds, 0).await.unwrap();
        assert_eq!(impact.impacted_module_ids, seeds);
        assert_eq!(impact.impacted_files, vec!["src/b.ts".to_string()]);
        assert_eq!(impact.depth_reached, 0);

        let impact = engine.impacted_modules(&seeds, 1).await.unwrap();
        assert_eq!(impact.impacted_module_ids.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_endpoint_ids_resolve_to_first() {
        let mut pkg = test_pkg();
        let mut dup = pkg.endpoints[0].clone();
        dup.handler_module_id = "mod:src/c.ts".to_string();
        pkg.endpoints.push(dup);

        let engine = MemoryQueryEngine::new(pkg);
        let hit = engine.endpoint_by_id("ep:GET:/users").await.unwrap().unwrap();
        assert_eq!(hit.handler_module_id, "mod:src/b.ts");
    }
}
