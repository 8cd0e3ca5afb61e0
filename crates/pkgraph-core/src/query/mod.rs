//! Graph query surface shared by the in-memory and store-backed engines.
//!
//! Filter matching and traversal both live here so the two engines cannot
//! drift apart: the store engine fetches entity lists with SurrealQL, the
//! memory engine reads them off the document, and both hand the same slices
//! to the same functions.

pub mod memory;
pub mod store;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PkgError;
use crate::model::ids::{self, IdKind};
use crate::model::{Edge, EdgeKind, Endpoint, Module, Symbol};

pub use memory::MemoryQueryEngine;
pub use store::{
    CodeSmellReport, CouplingScore, CriticalModule, GodObject, ModuleCentrality, SmellSummary,
    StoreQueryEngine,
};

/// Caller/callee module sets of one module, distinct over all edge kinds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependencies {
    pub callers: Vec<String>,
    pub callees: Vec<String>,
    pub fan_in_count: usize,
    pub fan_out_count: usize,
}

/// Result of a bounded impact traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImpactSet {
    pub impacted_modules: Vec<Module>,
    pub impacted_module_ids: Vec<String>,
    pub impacted_files: Vec<String>,
    pub depth_reached: usize,
}

/// Query operations available on both engines.
///
/// Not-found is an empty result everywhere; engines only error when the
/// backend itself fails.
#[async_trait]
pub trait GraphQueries {
    /// Modules whose kind tags contain `tag`, case-insensitively.
    async fn modules_by_tag(&self, tag: &str) -> Result<Vec<Module>, PkgError>;

    /// Modules with an exact (case-insensitive) kind tag.
    async fn modules_by_kind(&self, kind: &str) -> Result<Vec<Module>, PkgError>;

    /// Modules whose path matches a `*` wildcard pattern.
    async fn modules_by_path_pattern(&self, pattern: &str) -> Result<Vec<Module>, PkgError>;

    /// Symbols whose name matches a `*` wildcard pattern.
    async fn symbols_by_name(&self, pattern: &str) -> Result<Vec<Symbol>, PkgError>;

    /// Endpoints whose route matches a `*` wildcard pattern.
    async fn endpoints_by_path(&self, pattern: &str) -> Result<Vec<Endpoint>, PkgError>;

    async fn module_by_id(&self, id: &str) -> Result<Option<Module>, PkgError>;
    async fn symbol_by_id(&self, id: &str) -> Result<Option<Symbol>, PkgError>;
    async fn endpoint_by_id(&self, id: &str) -> Result<Option<Endpoint>, PkgError>;

    /// Endpoints handled by one module.
    async fn endpoints_by_module(&self, module_id: &str) -> Result<Vec<Endpoint>, PkgError>;

    /// Distinct caller/callee module sets over all edge kinds.
    async fn dependencies(&self, module_id: &str) -> Result<Dependencies, PkgError>;

    /// Bidirectional breadth-first impact from the seeds, bounded by `depth`.
    /// Seeds are always part of the result, known or not.
    async fn impacted_modules(
        &self,
        seed_ids: &[String],
        depth: usize,
    ) -> Result<ImpactSet, PkgError>;
}

/// Compiles a `*` wildcard pattern into a case-insensitive, unanchored
/// regex. All other characters match literally.
pub(crate) fn wildcard_regex(pattern: &str) -> Result<Regex, PkgError> {
    let translated = regex::escape(pattern).replace(r"\*", ".*");
    RegexBuilder::new(&translated)
        .case_insensitive(true)
        .build()
        .map_err(|e| PkgError::Config(format!("Invalid pattern '{pattern}': {e}")))
}

pub(crate) fn modules_matching_tag(modules: &[Module], tag: &str) -> Vec<Module> {
    let needle = tag.to_lowercase();
    modules
        .iter()
        .filter(|m| m.kind.iter().any(|k| k.to_lowercase().contains(&needle)))
        .cloned()
        .collect()
}

pub(crate) fn modules_matching_kind(modules: &[Module], kind: &str) -> Vec<Module> {
    modules
        .iter()
        .filter(|m| m.kind.iter().any(|k| k.eq_ignore_ascii_case(kind)))
        .cloned()
        .collect()
}

pub(crate) fn modules_matching_path(
    modules: &[Module],
    pattern: &str,
) -> Result<Vec<Module>, PkgError> {
    let regex = wildcard_regex(pattern)?;
    Ok(modules
        .iter()
        .filter(|m| regex.is_match(&m.path))
        .cloned()
        .collect())
}

pub(crate) fn symbols_matching_name(
    symbols: &[Symbol],
    pattern: &str,
) -> Result<Vec<Symbol>, PkgError> {
    let regex = wildcard_regex(pattern)?;
    Ok(symbols
        .iter()
        .filter(|s| regex.is_match(&s.name))
        .cloned()
        .collect())
}

pub(crate) fn endpoints_matching_path(
    endpoints: &[Endpoint],
    pattern: &str,
) -> Result<Vec<Endpoint>, PkgError> {
    let regex = wildcard_regex(pattern)?;
    Ok(endpoints
        .iter()
        .filter(|e| regex.is_match(&e.path))
        .cloned()
        .collect())
}

/// Assembles an [`ImpactSet`] from traversal output. Unknown ids stay in
/// `impacted_module_ids` but contribute no module record or file.
pub(crate) fn impact_from_ids(
    impacted_ids: Vec<String>,
    depth_reached: usize,
    modules: &[Module],
) -> ImpactSet {
    let by_id: HashMap<&str, &Module> = modules.iter().map(|m| (m.id.as_str(), m)).collect();
    let impacted_modules: Vec<Module> = impacted_ids
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|&m| m.clone()))
        .collect();
    let impacted_files = impacted_modules.iter().map(|m| m.path.clone()).collect();
    ImpactSet {
        impacted_modules,
        impacted_module_ids: impacted_ids,
        impacted_files,
        depth_reached,
    }
}

/// Module-level projection of the entity graph.
///
/// Symbol endpoints collapse to their owning module and endpoints to their
/// handler module; self-loops are dropped. Traversals for both engines run
/// on this projection.
pub(crate) struct ModuleGraph {
    graph: DiGraph<String, EdgeKind>,
    node_of: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub(crate) fn build(
        modules: &[Module],
        symbols: &[Symbol],
        endpoints: &[Endpoint],
        edges: &[Edge],
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut node_of = HashMap::new();
        for module in modules {
            let index = graph.add_node(module.id.clone());
            node_of.insert(module.id.clone(), index);
        }

        let symbol_owner: HashMap<&str, &str> = symbols
            .iter()
            .map(|s| (s.id.as_str(), s.module_id.as_str()))
            .collect();
        let endpoint_owner: HashMap<&str, &str> = endpoints
            .iter()
            .map(|e| (e.id.as_str(), e.handler_module_id.as_str()))
            .collect();
        let to_module = |id: &str| -> Option<String> {
            match ids::id_kind(id)? {
                IdKind::Module => Some(id.to_string()),
                IdKind::Symbol => symbol_owner
                    .get(id)
                    .map(|m| m.to_string())
                    .or_else(|| ids::module_of_symbol(id).map(String::from)),
                IdKind::Endpoint => endpoint_owner.get(id).map(|m| m.to_string()),
                IdKind::Feature => None,
            }
        };

        for edge in edges {
            let (Some(from), Some(to)) = (to_module(&edge.from), to_module(&edge.to)) else {
                continue;
            };
            if from == to {
                continue;
            }
            let (Some(&a), Some(&b)) = (node_of.get(&from), node_of.get(&to)) else {
                continue;
            };
            graph.add_edge(a, b, edge.kind);
        }

        Self { graph, node_of }
    }

    fn node(&self, module_id: &str) -> Option<NodeIndex> {
        self.node_of.get(module_id).copied()
    }

    pub(crate) fn dependencies(&self, module_id: &str) -> Dependencies {
        let Some(node) = self.node(module_id) else {
            return Dependencies::default();
        };
        let callers: BTreeSet<String> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        let callees: BTreeSet<String> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        Dependencies {
            fan_in_count: callers.len(),
            fan_out_count: callees.len(),
            callers: callers.into_iter().collect(),
            callees: callees.into_iter().collect(),
        }
    }

    /// Distinct (fan_in, fan_out) neighbor counts of one module.
    pub(crate) fn centrality(&self, module_id: &str) -> (usize, usize) {
        let deps = self.dependencies(module_id);
        (deps.fan_in_count, deps.fan_out_count)
    }

    /// Bidirectional BFS from the seeds. Returns the sorted set of reached
    /// module ids (seeds always included, known or not) and the deepest
    /// level actually visited.
    pub(crate) fn impact(&self, seeds: &[String], depth: usize) -> (Vec<String>, usize) {
        let mut reached: BTreeSet<String> = seeds.iter().cloned().collect();
        let mut queue: VecDeque<(NodeIndex, usize)> = seeds
            .iter()
            .filter_map(|s| self.node(s))
            .map(|n| (n, 0))
            .collect();
        let mut seen: HashSet<NodeIndex> = queue.iter().map(|(n, _)| *n).collect();
        let mut depth_reached = 0;

        while let Some((node, level)) = queue.pop_front() {
            depth_reached = depth_reached.max(level);
            if level == depth {
                continue;
            }
            for next in self.graph.neighbors_undirected(node) {
                if seen.insert(next) {
                    reached.insert(self.graph[next].clone());
                    queue.push_back((next, level + 1));
                }
            }
        }
        (reached.into_iter().collect(), depth_reached)
    }

    /// Shortest directed path between two modules, bounded by `max_hops`.
    pub(crate) fn shortest_path(
        &self,
        from: &str,
        to: &str,
        max_hops: usize,
    ) -> Option<Vec<String>> {
        let start = self.node(from)?;
        let goal = self.node(to)?;
        if start == goal {
            return Some(vec![from.to_string()]);
        }

        let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut seen = HashSet::from([start]);

        while let Some((node, hops)) = queue.pop_front() {
            if hops == max_hops {
                continue;
            }
            for next in self.neighbors_sorted(node) {
                if !seen.insert(next) {
                    continue;
                }
                prev.insert(next, node);
                if next == goal {
                    let mut path = vec![goal];
                    let mut current = goal;
                    while let Some(&p) = prev.get(&current) {
                        path.push(p);
                        current = p;
                    }
                    path.reverse();
                    return Some(path.into_iter().map(|n| self.graph[n].clone()).collect());
                }
                queue.push_back((next, hops + 1));
            }
        }
        None
    }

    /// All simple directed paths between two distinct modules, up to
    /// `max_depth` hops and at most `limit` paths, in deterministic order.
    pub(crate) fn all_paths(
        &self,
        from: &str,
        to: &str,
        max_depth: usize,
        limit: usize,
    ) -> Vec<Vec<String>> {
        if from == to {
            return Vec::new();
        }
        let (Some(start), Some(goal)) = (self.node(from), self.node(to)) else {
            return Vec::new();
        };

        let mut paths = Vec::new();
        let mut stack = vec![start];
        let mut on_path = HashSet::from([start]);
        self.paths_dfs(start, goal, max_depth, limit, &mut stack, &mut on_path, &mut paths);
        paths
    }

    #[allow(clippy::too_many_arguments)]
    fn paths_dfs(
        &self,
        node: NodeIndex,
        goal: NodeIndex,
        max_depth: usize,
        limit: usize,
        stack: &mut Vec<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
        paths: &mut Vec<Vec<String>>,
    ) {
        if paths.len() >= limit {
            return;
        }
        if node == goal && stack.len() > 1 {
            paths.push(stack.iter().map(|&n| self.graph[n].clone()).collect());
            return;
        }
        if stack.len() > max_depth {
            return;
        }
        for next in self.neighbors_sorted(node) {
            if paths.len() >= limit {
                return;
            }
            if !on_path.insert(next) {
                continue;
            }
            stack.push(next);
            self.paths_dfs(next, goal, max_depth, limit, stack, on_path, paths);
            stack.pop();
            on_path.remove(&next);
        }
    }

    /// Directed cycles over `imports` and `calls` edges, node count in
    /// `2..=max_len`, at most `limit`, each reported once starting from its
    /// smallest module id.
    pub(crate) fn cycles(&self, max_len: usize, limit: usize) -> Vec<Vec<String>> {
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for edge in self.graph.edge_references() {
            if matches!(edge.weight(), EdgeKind::Imports | EdgeKind::Calls) {
                adjacency
                    .entry(self.graph[edge.source()].as_str())
                    .or_default()
                    .insert(self.graph[edge.target()].as_str());
            }
        }

        let mut cycles = Vec::new();
        let starts: Vec<&str> = adjacency.keys().copied().collect();
        for start in starts {
            if cycles.len() >= limit {
                break;
            }
            let mut path = vec![start];
            let mut on_path = BTreeSet::from([start]);
            cycle_dfs(
                &adjacency, start, start, max_len, limit, &mut path, &mut on_path, &mut cycles,
            );
        }
        cycles
    }

    /// Distinct outgoing neighbors in module-id order.
    fn neighbors_sorted(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        next.dedup();
        next
    }
}

#[allow(clippy::too_many_arguments)]
fn cycle_dfs<'a>(
    adjacency: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    start: &'a str,
    node: &'a str,
    max_len: usize,
    limit: usize,
    path: &mut Vec<&'a str>,
    on_path: &mut BTreeSet<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    if cycles.len() >= limit {
        return;
    }
    let Some(targets) = adjacency.get(node) else {
        return;
    };
    for &next in targets {
        if cycles.len() >= limit {
            return;
        }
        if next == start {
            if path.len() >= 2 {
                cycles.push(path.iter().map(|s| s.to_string()).collect());
            }
            continue;
        }
        // Visiting only ids above the start makes the smallest id of every
        // cycle its unique enumeration point.
        if next < start || on_path.contains(next) || path.len() >= max_len {
            continue;
        }
        path.push(next);
        on_path.insert(next);
        cycle_dfs(adjacency, start, next, max_len, limit, path, on_path, cycles);
        path.pop();
        on_path.remove(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SymbolKind;

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

    fn chain_graph() -> ModuleGraph {
        // a -> b -> c, with d isolated.
        let modules = vec![
            module("src/a.ts", &[]),
            module("src/b.ts", &[]),
            module("src/c.ts", &[]),
            module("src/d.ts", &[]),
        ];
        let edges = vec![
            Edge::new("mod:src/a.ts", "mod:src/b.ts", EdgeKind::Imports),
            Edge::new("mod:src/b.ts", "mod:src/c.ts", EdgeKind::Imports),
        ];
        ModuleGraph::build(&modules, &[], &[], &edges)
    }

    #[test]
    fn test_wildcard_regex_translation() {
        let regex = wildcard_regex("*.service.*").unwrap();
        assert!(regex.is_match("src/user.service.ts"));
        assert!(regex.is_match("SRC/USER.SERVICE.TS"));
        assert!(!regex.is_match("src/user.controller.ts"));

        // Dots are literal, not regex wildcards.
        let regex = wildcard_regex("a.ts").unwrap();
        assert!(!regex.is_match("abts"));
        assert!(regex.is_match("src/a.ts"));
    }

    #[test]
    fn test_tag_match_is_substring_insensitive() {
        let modules = vec![
            module("src/user.service.ts", &["service"]),
            module("src/user.controller.ts", &["controller"]),
        ];
        let hits = modules_matching_tag(&modules, "SERV");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "src/user.service.ts");

        let exact = modules_matching_kind(&modules, "Service");
        assert_eq!(exact.len(), 1);
        let none = modules_matching_kind(&modules, "serv");
        assert!(none.is_empty());
    }

    #[test]
    fn test_symbol_edges_collapse_to_modules() {
        let modules = vec![module("src/a.ts", &[]), module("src/b.ts", &[])];
        let symbols = vec![symbol("src/b.ts", "helper")];
        let edges = vec![Edge::new(
            "mod:src/a.ts",
            "sym:mod:src/b.ts:helper",
            EdgeKind::Calls,
        )];
        let graph = ModuleGraph::build(&modules, &symbols, &[], &edges);

        let deps = graph.dependencies("mod:src/a.ts");
        assert_eq!(deps.callees, vec!["mod:src/b.ts".to_string()]);
        assert_eq!(deps.fan_out_count, 1);

        let deps = graph.dependencies("mod:src/b.ts");
        assert_eq!(deps.callers, vec!["mod:src/a.ts".to_string()]);
    }

    #[test]
    fn test_contains_self_loops_dropped() {
        let modules = vec![module("src/a.ts", &[])];
        let symbols = vec![symbol("src/a.ts", "run")];
        let edges = vec![Edge::new(
            "mod:src/a.ts",
            "sym:mod:src/a.ts:run",
            EdgeKind::Contains,
        )];
        let graph = ModuleGraph::build(&modules, &symbols, &[], &edges);
        let deps = graph.dependencies("mod:src/a.ts");
        assert!(deps.callers.is_empty());
        assert!(deps.callees.is_empty());
    }

    #[test]
    fn test_impact_depths() {
        let graph = chain_graph();
        let seeds = vec!["mod:src/a.ts".to_string()];

        let (ids, reached) = graph.impact(&seeds, 0);
        assert_eq!(ids, vec!["mod:src/a.ts".to_string()]);
        assert_eq!(reached, 0);

        let (ids, reached) = graph.impact(&seeds, 1);
        assert_eq!(
            ids,
            vec!["mod:src/a.ts".to_string(), "mod:src/b.ts".to_string()]
        );
        assert_eq!(reached, 1);

        let (ids, reached) = graph.impact(&seeds, 2);
        assert_eq!(ids.len(), 3);
        assert_eq!(reached, 2);
    }

    #[test]
    fn test_impact_is_bidirectional_and_keeps_unknown_seeds() {
        let graph = chain_graph();
        let seeds = vec!["mod:src/c.ts".to_string(), "mod:gone.ts".to_string()];
        let (ids, _) = graph.impact(&seeds, 1);
        assert!(ids.contains(&"mod:src/b.ts".to_string()));
        assert!(ids.contains(&"mod:gone.ts".to_string()));
    }

    #[test]
    fn test_shortest_path_and_cap() {
        let graph = chain_graph();
        let path = graph
            .shortest_path("mod:src/a.ts", "mod:src/c.ts", 10)
            .unwrap();
        assert_eq!(
            path,
            vec![
                "mod:src/a.ts".to_string(),
                "mod:src/b.ts".to_string(),
                "mod:src/c.ts".to_string()
            ]
        );

        assert!(graph.shortest_path("mod:src/a.ts", "mod:src/c.ts", 1).is_none());
        assert!(graph.shortest_path("mod:src/a.ts", "mod:src/d.ts", 10).is_none());
    }

    #[test]
    fn test_all_paths_bounded() {
        // a -> b -> c and a -> c.
        let modules = vec![
            module("src/a.ts", &[]),
            module("src/b.ts", &[]),
            module("src/c.ts", &[]),
        ];
        let edges = vec![
            Edge::new("mod:src/a.ts", "mod:src/b.ts", EdgeKind::Imports),
            Edge::new("mod:src/b.ts", "mod:src/c.ts", EdgeKind::Imports),
            Edge::new("mod:src/a.ts", "mod:src/c.ts", EdgeKind::Imports),
        ];
        let graph = ModuleGraph::build(&modules, &[], &[], &edges);

        let paths = graph.all_paths("mod:src/a.ts", "mod:src/c.ts", 5, 50);
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&vec![
            "mod:src/a.ts".to_string(),
            "mod:src/c.ts".to_string()
        ]));

        let short = graph.all_paths("mod:src/a.ts", "mod:src/c.ts", 1, 50);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn test_cycles_normalized() {
        let modules = vec![
            module("src/a.ts", &[]),
            module("src/b.ts", &[]),
            module("src/c.ts", &[]),
        ];
        let edges = vec![
            Edge::new("mod:src/a.ts", "mod:src/b.ts", EdgeKind::Imports),
            Edge::new("mod:src/b.ts", "mod:src/a.ts", EdgeKind::Imports),
            Edge::new("mod:src/b.ts", "mod:src/c.ts", EdgeKind::Calls),
            Edge::new("mod:src/c.ts", "mod:src/b.ts", EdgeKind::Calls),
        ];
        let graph = ModuleGraph::build(&modules, &[], &[], &edges);

        let cycles = graph.cycles(10, 20);
        assert_eq!(cycles.len(), 2);
        assert!(cycles.contains(&vec![
            "mod:src/a.ts".to_string(),
            "mod:src/b.ts".to_string()
        ]));
        assert!(cycles.contains(&vec![
            "mod:src/b.ts".to_string(),
            "mod:src/c.ts".to_string()
        ]));
    }

    #[test]
    fn test_cycles_ignore_contains_edges() {
        let modules = vec![module("src/a.ts", &[]), module("src/b.ts", &[])];
        let edges = vec![
            Edge::new("mod:src/a.ts", "mod:src/b.ts", EdgeKind::Extends),
            Edge::new("mod:src/b.ts", "mod:src/a.ts", EdgeKind::Extends),
        ];
        let graph = ModuleGraph::build(&modules, &[], &[], &edges);
        assert!(graph.cycles(10, 20).is_empty());
    }
}
