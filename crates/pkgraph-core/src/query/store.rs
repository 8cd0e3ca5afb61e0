//! Query engine over the persisted graph.
//!
//! Shared-surface queries fetch entity lists from the store and run the same
//! matchers and traversals as the in-memory engine. The heavier operations
//! here (paths, cycles, rankings, smells) have no in-memory counterpart and
//! load the edge list once per call.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PkgError;
use crate::model::{Endpoint, Module, Symbol};
use crate::store::{GraphStore, VersionRecord};

use super::{
    endpoints_matching_path, impact_from_ids, modules_matching_kind, modules_matching_path,
    modules_matching_tag, symbols_matching_name, Dependencies, GraphQueries, ImpactSet,
    ModuleGraph,
};

/// Hop cap applied to shortest-path searches.
const SHORTEST_PATH_MAX_HOPS: usize = 10;

/// Default depth bound for all-paths searches.
pub const DEFAULT_PATH_DEPTH: usize = 5;

/// Most paths returned by one all-paths search.
const PATH_LIMIT: usize = 50;

/// Longest reported cycle, in modules.
const CYCLE_MAX_LEN: usize = 10;

/// Most cycles returned by one scan.
const CYCLE_LIMIT: usize = 20;

/// Default result count for the critical-module ranking.
pub const DEFAULT_CRITICAL_LIMIT: usize = 10;

/// Default distinct-dependency threshold for god objects.
pub const DEFAULT_GOD_OBJECT_THRESHOLD: usize = 10;

/// Default fan-in + fan-out threshold for high coupling.
pub const DEFAULT_HIGH_COUPLING_THRESHOLD: usize = 15;

/// A module ranked by its distinct fan-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalModule {
    pub module: Module,
    pub fan_in: usize,
}

/// Distinct-degree counts of one module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCentrality {
    pub module_id: String,
    pub fan_in: usize,
    pub fan_out: usize,
    pub total_degree: usize,
}

/// A module whose caller/callee set exceeds the god-object threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GodObject {
    pub module: Module,
    pub dependency_count: usize,
}

/// A module whose combined fan exceeds the coupling threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouplingScore {
    pub module: Module,
    pub fan_in: usize,
    pub fan_out: usize,
    pub total_coupling: usize,
}

/// Counts per smell category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmellSummary {
    pub god_object_count: usize,
    pub circular_dependency_count: usize,
    pub high_coupling_count: usize,
}

/// Aggregate smell report at the default thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSmellReport {
    pub god_objects: Vec<GodObject>,
    pub circular_dependencies: Vec<Vec<String>>,
    pub high_coupling: Vec<CouplingScore>,
    pub summary: SmellSummary,
}

/// Answers structural and whole-graph queries from a [`GraphStore`].
///
/// Store errors surface as [`PkgError::Store`]; a missing entity is an empty
/// result, never an error.
pub struct StoreQueryEngine {
    store: GraphStore,
}

impl StoreQueryEngine {
    pub fn new(store: GraphStore) -> Self {
        Self { store }
    }

    /// Loads the entity lists and builds the module-level projection.
    async fn projection(&self) -> Result<(Vec<Module>, ModuleGraph), PkgError> {
        let modules = self.store.fetch_modules().await?;
        let symbols = self.store.fetch_symbols().await?;
        let endpoints = self.store.fetch_endpoints().await?;
        let edges = self.store.fetch_edges().await?;
        let graph = ModuleGraph::build(&modules, &symbols, &endpoints, &edges);
        Ok((modules, graph))
    }

    /// Shortest directed module path, bounded at ten hops.
    pub async fn shortest_path(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Option<Vec<String>>, PkgError> {
        let (_, graph) = self.projection().await?;
        Ok(graph.shortest_path(from, to, SHORTEST_PATH_MAX_HOPS))
    }

    /// All simple directed module paths up to `max_depth` hops, capped at
    /// fifty paths.
    pub async fn all_paths(
        &self,
        from: &str,
        to: &str,
        max_depth: usize,
    ) -> Result<Vec<Vec<String>>, PkgError> {
        let (_, graph) = self.projection().await?;
        Ok(graph.all_paths(from, to, max_depth, PATH_LIMIT))
    }

    /// Directed cycles over imports and calls edges, each reported once.
    pub async fn circular_dependencies(&self) -> Result<Vec<Vec<String>>, PkgError> {
        let (_, graph) = self.projection().await?;
        Ok(graph.cycles(CYCLE_MAX_LEN, CYCLE_LIMIT))
    }

    /// Top modules by distinct fan-in.
    pub async fn critical_modules(&self, limit: usize) -> Result<Vec<CriticalModule>, PkgError> {
        let (modules, graph) = self.projection().await?;
        Ok(rank_by_fan_in(&modules, &graph, limit))
    }

    /// Distinct-degree counts of one module; zeroes for unknown ids.
    pub async fn module_centrality(&self, module_id: &str) -> Result<ModuleCentrality, PkgError> {
        let (_, graph) = self.projection().await?;
        let (fan_in, fan_out) = graph.centrality(module_id);
        Ok(ModuleCentrality {
            module_id: module_id.to_string(),
            fan_in,
            fan_out,
            total_degree: fan_in + fan_out,
        })
    }

    /// Modules whose distinct caller/callee set is larger than `threshold`.
    pub async fn god_objects(&self, threshold: usize) -> Result<Vec<GodObject>, PkgError> {
        let (modules, graph) = self.projection().await?;
        Ok(find_god_objects(&modules, &graph, threshold))
    }

    /// Modules whose fan-in + fan-out exceeds `threshold`.
    pub async fn high_coupling(&self, threshold: usize) -> Result<Vec<CouplingScore>, PkgError> {
        let (modules, graph) = self.projection().await?;
        Ok(find_high_coupling(&modules, &graph, threshold))
    }

    /// Smell report at the default thresholds.
    pub async fn code_smells(&self) -> Result<CodeSmellReport, PkgError> {
        let (modules, graph) = self.projection().await?;
        let god_objects = find_god_objects(&modules, &graph, DEFAULT_GOD_OBJECT_THRESHOLD);
        let circular_dependencies = graph.cycles(CYCLE_MAX_LEN, CYCLE_LIMIT);
        let high_coupling =
            find_high_coupling(&modules, &graph, DEFAULT_HIGH_COUPLING_THRESHOLD);
        let summary = SmellSummary {
            god_object_count: god_objects.len(),
            circular_dependency_count: circular_dependencies.len(),
            high_coupling_count: high_coupling.len(),
        };
        Ok(CodeSmellReport {
            god_objects,
            circular_dependencies,
            high_coupling,
            summary,
        })
    }

    /// Impact set seeded with a feature's member modules. An unknown feature
    /// seeds nothing and yields an empty set.
    pub async fn feature_impact(
        &self,
        feature_id: &str,
        depth: usize,
    ) -> Result<ImpactSet, PkgError> {
        let seeds = self
            .store
            .fetch_feature(feature_id)
            .await?
            .map(|f| f.module_ids)
            .unwrap_or_default();
        self.impacted_modules(&seeds, depth).await
    }

    /// Stored document snapshots for a project, newest first.
    pub async fn version_history(&self, project: &str) -> Result<Vec<VersionRecord>, PkgError> {
        self.store.version_history(project).await
    }
}

fn rank_by_fan_in(modules: &[Module], graph: &ModuleGraph, limit: usize) -> Vec<CriticalModule> {
    let mut ranked: Vec<CriticalModule> = modules
        .iter()
        .map(|module| {
            let (fan_in, _) = graph.centrality(&module.id);
            CriticalModule {
                module: module.clone(),
                fan_in,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.fan_in
            .cmp(&a.fan_in)
            .then_with(|| a.module.path.cmp(&b.module.path))
    });
    ranked.truncate(limit);
    ranked
}

fn find_god_objects(modules: &[Module], graph: &ModuleGraph, threshold: usize) -> Vec<GodObject> {
    let mut hits: Vec<GodObject> = modules
        .iter()
        .filter_map(|module| {
            let deps = graph.dependencies(&module.id);
            let neighbors: BTreeSet<&String> =
                deps.callers.iter().chain(deps.callees.iter()).collect();
            (neighbors.len() > threshold).then(|| GodObject {
                module: module.clone(),
                dependency_count: neighbors.len(),
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        b.dependency_count
            .cmp(&a.dependency_count)
            .then_with(|| a.module.path.cmp(&b.module.path))
    });
    hits
}

fn find_high_coupling(
    modules: &[Module],
    graph: &ModuleGraph,
    threshold: usize,
) -> Vec<CouplingScore> {
    let mut hits: Vec<CouplingScore> = modules
        .iter()
        .filter_map(|module| {
            let (fan_in, fan_out) = graph.centrality(&module.id);
            (fan_in + fan_out > threshold).then(|| CouplingScore {
                module: module.clone(),
                fan_in,
                fan_out,
                total_coupling: fan_in + fan_out,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        b.total_coupling
            .cmp(&a.total_coupling)
            .then_with(|| a.module.path.cmp(&b.module.path))
    });
    hits
}

fn sort_modules(mut modules: Vec<Module>) -> Vec<Module> {
    modules.sort_by(|a, b| a.path.cmp(&b.path));
    modules
}

#[async_trait]
impl GraphQueries for StoreQueryEngine {
    async fn modules_by_tag(&self, tag: &str) -> Result<Vec<Module>, PkgError> {
        let modules = self.store.fetch_modules().await?;
        Ok(sort_modules(modules_matching_tag(&modules, tag)))
    }

    async fn modules_by_kind(&self, kind: &str) -> Result<Vec<Module>, PkgError> {
        let modules = self.store.fetch_modules().await?;
        Ok(sort_modules(modules_matching_kind(&modules, kind)))
    }

    async fn modules_by_path_pattern(&self, pattern: &str) -> Result<Vec<Module>, PkgError> {
        let modules = self.store.fetch_modules().await?;
        Ok(sort_modules(modules_matching_path(&modules, pattern)?))
    }

    async fn symbols_by_name(&self, pattern: &str) -> Result<Vec<Symbol>, PkgError> {
        let symbols = self.store.fetch_symbols().await?;
        let mut hits = symbols_matching_name(&symbols, pattern)?;
        hits.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn endpoints_by_path(&self, pattern: &str) -> Result<Vec<Endpoint>, PkgError> {
        let endpoints = self.store.fetch_endpoints().await?;
        let mut hits = endpoints_matching_path(&endpoints, pattern)?;
        hits.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn module_by_id(&self, id: &str) -> Result<Option<Module>, PkgError> {
        self.store.fetch_module(id).await
    }

    async fn symbol_by_id(&self, id: &str) -> Result<Option<Symbol>, PkgError> {
        self.store.fetch_symbol(id).await
    }

    async fn endpoint_by_id(&self, id: &str) -> Result<Option<Endpoint>, PkgError> {
        self.store.fetch_endpoint(id).await
    }

    async fn endpoints_by_module(&self, module_id: &str) -> Result<Vec<Endpoint>, PkgError> {
        let mut hits = self.store.fetch_endpoints_by_module(module_id).await?;
        hits.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.id.cmp(&b.id)));
        Ok(hits)
    }

    async fn dependencies(&self, module_id: &str) -> Result<Dependencies, PkgError> {
        let (_, graph) = self.projection().await?;
        Ok(graph.dependencies(module_id))
    }

    async fn impacted_modules(
        &self,
        seed_ids: &[String],
        depth: usize,
    ) -> Result<ImpactSet, PkgError> {
        let (modules, graph) = self.projection().await?;
        let (ids, depth_reached) = graph.impact(seed_ids, depth);
        Ok(impact_from_ids(ids, depth_reached, &modules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ids, Edge, EdgeKind};

    fn module(path: &str) -> Module {
        Module {
            id: ids::module_id(path),
            path: path.to_string(),
            kind: Vec::new(),
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

    /// hub is imported by three modules and imports two more.
    fn hub_fixture() -> (Vec<Module>, ModuleGraph) {
        let modules = vec![
            module("src/hub.ts"),
            module("src/a.ts"),
            module("src/b.ts"),
            module("src/c.ts"),
            module("src/x.ts"),
            module("src/y.ts"),
        ];
        let edges = vec![
            Edge::new("mod:src/a.ts", "mod:src/hub.ts", EdgeKind::Imports),
            Edge::new("mod:src/b.ts", "mod:src/hub.ts", EdgeKind::Imports),
            Edge::new("mod:src/c.ts", "mod:src/hub.ts", EdgeKind::Imports),
            Edge::new("mod:src/hub.ts", "mod:src/x.ts", EdgeKind::Imports),
            Edge::new("mod:src/hub.ts", "mod:src/y.ts", EdgeKind::Imports),
        ];
        let graph = ModuleGraph::build(&modules, &[], &[], &edges);
        (modules, graph)
    }

    #[test]
    fn test_rank_by_fan_in() {
        let (modules, graph) = hub_fixture();
        let ranked = rank_by_fan_in(&modules, &graph, 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].module.path, "src/hub.ts");
        assert_eq!(ranked[0].fan_in, 3);
        // Ties resolve by path.
        assert_eq!(ranked[1].module.path, "src/x.ts");
        assert_eq!(ranked[1].fan_in, 1);
    }

    #[test]
    fn test_god_objects_count_distinct_neighbors() {
        let (modules, graph) = hub_fixture();
        let hits = find_god_objects(&modules, &graph, 4);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].module.path, "src/hub.ts");
        assert_eq!(hits[0].dependency_count, 5);

        assert!(find_god_objects(&modules, &graph, 5).is_empty());
    }

    #[test]
    fn test_high_coupling_threshold() {
        let (modules, graph) = hub_fixture();
        let hits = find_high_coupling(&modules, &graph, 4);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].module.path, "src/hub.ts");
        assert_eq!(hits[0].fan_in, 3);
        assert_eq!(hits[0].fan_out, 2);
        assert_eq!(hits[0].total_coupling, 5);

        assert!(find_high_coupling(&modules, &graph, 5).is_empty());
    }
}
