//! Edge extraction across modules, symbols and endpoints.
//!
//! Phases run in a fixed order (imports, calls, inheritance, containment,
//! routing) so the edge list is deterministic for a given entity set. A
//! lookup that fails produces no edge; extraction itself never fails.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::lang::{detect_language, SourceOutline};
use crate::model::{ids, Edge, EdgeKind, Endpoint, Module, Symbol, SymbolKind};
use crate::model::{WarningKind, WarningRecord};

use super::imports::{ImportResolver, ResolvedImport};

/// Fan-in / fan-out counts per module, derived from `imports` edges only.
///
/// Counts are by occurrence: a module importing the same target twice
/// contributes two to its fan-out and two to the target's fan-in.
#[derive(Debug, Clone, Default)]
pub struct FanStats {
    counts: HashMap<String, (u32, u32)>,
}

impl FanStats {
    pub(crate) fn from_edges(modules: &[Module], edges: &[Edge]) -> Self {
        let mut counts: HashMap<String, (u32, u32)> = modules
            .iter()
            .map(|m| (m.id.clone(), (0u32, 0u32)))
            .collect();
        for edge in edges {
            if edge.kind != EdgeKind::Imports {
                continue;
            }
            if let Some(stats) = counts.get_mut(&edge.from) {
                stats.1 += 1;
            }
            if let Some(stats) = counts.get_mut(&edge.to) {
                stats.0 += 1;
            }
        }
        Self { counts }
    }

    /// Incoming imports-edge count; 0 for unknown modules.
    pub fn fan_in(&self, module_id: &str) -> u32 {
        self.counts.get(module_id).map(|s| s.0).unwrap_or(0)
    }

    /// Outgoing imports-edge count; 0 for unknown modules.
    pub fn fan_out(&self, module_id: &str) -> u32 {
        self.counts.get(module_id).map(|s| s.1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Derives the complete edge list plus fan statistics.
///
/// `outlines` maps module id to the parsed outline of its file; modules
/// without an entry (not re-parsed during an incremental run) still get
/// import and containment edges but contribute no call or inheritance
/// edges. Unresolvable project-local imports land in `warnings`.
pub fn extract_relationships(
    modules: &[Module],
    symbols: &[Symbol],
    endpoints: &[Endpoint],
    outlines: &HashMap<String, SourceOutline>,
    resolver: &ImportResolver,
    warnings: &mut Vec<WarningRecord>,
) -> (Vec<Edge>, FanStats) {
    let mut edges = import_edges(modules, resolver, warnings);
    edges.extend(call_edges(modules, symbols, outlines));
    edges.extend(inheritance_edges(modules, symbols, outlines));
    edges.extend(contains_edges(modules, symbols));
    edges.extend(routes_to_edges(endpoints, symbols));

    let fan_stats = FanStats::from_edges(modules, &edges);
    (edges, fan_stats)
}

/// `module -> module` edges from each module's verbatim import statements.
///
/// Only targets present in the module set produce an edge; a specifier that
/// looked project-local but resolved nowhere becomes a warning instead.
fn import_edges(
    modules: &[Module],
    resolver: &ImportResolver,
    warnings: &mut Vec<WarningRecord>,
) -> Vec<Edge> {
    let known: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();
    let mut edges = Vec::new();

    for module in modules {
        let Some(language) = detect_language(Path::new(&module.path)) else {
            continue;
        };
        for raw in &module.raw_imports {
            for resolved in resolver.resolve_line(raw, &module.path, language) {
                match resolved {
                    ResolvedImport::Internal { module_id, .. } => {
                        if known.contains(module_id.as_str()) {
                            edges.push(Edge::new(module.id.clone(), module_id, EdgeKind::Imports));
                        }
                    }
                    ResolvedImport::Unresolved { specifier } => {
                        warnings.push(WarningRecord {
                            kind: WarningKind::UnresolvedImport,
                            file_path: module.path.clone(),
                            message: format!("Could not resolve import '{specifier}'"),
                        });
                    }
                }
            }
        }
    }

    edges
}

/// `module -> symbol` edges from call sites.
///
/// Matching is by name only: the callee's trailing segment is looked up in
/// an index of symbol names plus bare method names, and every hit gets an
/// edge. A shared name fans out to each symbol carrying it.
fn call_edges(
    modules: &[Module],
    symbols: &[Symbol],
    outlines: &HashMap<String, SourceOutline>,
) -> Vec<Edge> {
    let mut by_name: HashMap<&str, Vec<&str>> = HashMap::new();
    for symbol in symbols {
        by_name
            .entry(symbol.name.as_str())
            .or_default()
            .push(symbol.id.as_str());
        if symbol.kind == SymbolKind::Method {
            if let Some((_, bare)) = symbol.name.rsplit_once('.') {
                by_name.entry(bare).or_default().push(symbol.id.as_str());
            }
        }
    }

    let mut edges = Vec::new();
    for module in modules {
        let Some(outline) = outlines.get(&module.id) else {
            continue;
        };
        for call in &outline.calls {
            let Some(name) = callee_name(&call.callee) else {
                continue;
            };
            let targets = by_name
                .get(call.callee.as_str())
                .or_else(|| by_name.get(name));
            let Some(targets) = targets else {
                continue;
            };
            for target in targets {
                edges.push(Edge::new(module.id.clone(), *target, EdgeKind::Calls));
            }
        }
    }

    edges
}

/// Trailing identifier of a callee expression: `svc.findAll` -> `findAll`.
fn callee_name(callee: &str) -> Option<&str> {
    let name = callee.rsplit('.').next().unwrap_or(callee).trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// `extends` / `implements` edges from class symbols to their parents.
///
/// Bases match the first symbol with that name regardless of kind;
/// implemented interfaces additionally require kind `interface`.
fn inheritance_edges(
    modules: &[Module],
    symbols: &[Symbol],
    outlines: &HashMap<String, SourceOutline>,
) -> Vec<Edge> {
    let mut edges = Vec::new();

    for module in modules {
        let Some(outline) = outlines.get(&module.id) else {
            continue;
        };
        for class in &outline.classes {
            let class_symbol_id = ids::symbol_id(&module.id, &class.name);
            for base in &class.bases {
                let parent = symbols.iter().find(|s| s.name == *base);
                if let Some(parent) = parent {
                    edges.push(Edge::new(
                        class_symbol_id.clone(),
                        parent.id.clone(),
                        EdgeKind::Extends,
                    ));
                }
            }
            for interface in &class.implements {
                let parent = symbols
                    .iter()
                    .find(|s| s.name == *interface && s.kind == SymbolKind::Interface);
                if let Some(parent) = parent {
                    edges.push(Edge::new(
                        class_symbol_id.clone(),
                        parent.id.clone(),
                        EdgeKind::Implements,
                    ));
                }
            }
        }
    }

    edges
}

/// One `contains` edge per symbol from its owning module.
fn contains_edges(modules: &[Module], symbols: &[Symbol]) -> Vec<Edge> {
    let known: HashSet<&str> = modules.iter().map(|m| m.id.as_str()).collect();
    symbols
        .iter()
        .filter(|s| known.contains(s.module_id.as_str()))
        .map(|s| Edge::new(s.module_id.clone(), s.id.clone(), EdgeKind::Contains))
        .collect()
}

/// `endpoint -> handler symbol` edges for resolved handlers.
fn routes_to_edges(endpoints: &[Endpoint], symbols: &[Symbol]) -> Vec<Edge> {
    let known: HashSet<&str> = symbols.iter().map(|s| s.id.as_str()).collect();
    endpoints
        .iter()
        .filter_map(|e| {
            let handler = e.handler_symbol_id.as_deref()?;
            if known.contains(handler) {
                Some(Edge::new(e.id.clone(), handler, EdgeKind::RoutesTo))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::outline::{CallSite, ClassDef};
    use crate::model::HttpMethod;
    use std::collections::BTreeSet;

    fn module(path: &str, raw_imports: &[&str]) -> Module {
        Module {
            id: ids::module_id(path),
            path: path.to_string(),
            kind: Vec::new(),
            loc: 1,
            hash: String::new(),
            exports: Vec::new(),
            imports: Vec::new(),
            raw_imports: raw_imports.iter().map(|s| s.to_string()).collect(),
            framework: None,
            framework_confidence: None,
            module_summary: None,
            code_snippets: None,
        }
    }

    fn symbol(module_id: &str, name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            id: ids::symbol_id(module_id, name),
            module_id: module_id.to_string(),
            name: name.to_string(),
            kind,
            is_exported: true,
            signature: name.to_string(),
            visibility: "public".to_string(),
            is_async: None,
            decorators: None,
            parameters: None,
            return_type: None,
            summary: None,
        }
    }

    fn resolver_for(files: &[&str]) -> ImportResolver {
        let set: BTreeSet<String> = files.iter().map(|f| f.to_string()).collect();
        ImportResolver::new(Path::new("/nonexistent-root"), set)
    }

    #[test]
    fn test_import_edge_between_sibling_files() {
        let modules = vec![
            module("src/a.ts", &["import { x } from './b';"]),
            module("src/b.ts", &[]),
        ];
        let resolver = resolver_for(&["src/a.ts", "src/b.ts"]);
        let mut warnings = Vec::new();

        let (edges, fan) = extract_relationships(
            &modules,
            &[],
            &[],
            &HashMap::new(),
            &resolver,
            &mut warnings,
        );

        let imports: Vec<&Edge> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Imports)
            .collect();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].from, "mod:src/a.ts");
        assert_eq!(imports[0].to, "mod:src/b.ts");
        assert!(warnings.is_empty());
        assert_eq!(fan.fan_out("mod:src/a.ts"), 1);
        assert_eq!(fan.fan_in("mod:src/b.ts"), 1);
    }

    #[test]
    fn test_unresolved_local_import_becomes_warning() {
        let modules = vec![module("src/a.ts", &["import { x } from './missing';"])];
        let resolver = resolver_for(&["src/a.ts"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &[],
            &[],
            &HashMap::new(),
            &resolver,
            &mut warnings,
        );

        assert!(edges.iter().all(|e| e.kind != EdgeKind::Imports));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnresolvedImport);
        assert!(warnings[0].message.contains("./missing"));
    }

    #[test]
    fn test_third_party_import_is_silent() {
        let modules = vec![module("src/a.ts", &["import express from 'express';"])];
        let resolver = resolver_for(&["src/a.ts"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &[],
            &[],
            &HashMap::new(),
            &resolver,
            &mut warnings,
        );

        assert!(edges.iter().all(|e| e.kind != EdgeKind::Imports));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_call_edge_fans_out_to_every_match() {
        let modules = vec![module("src/app.py", &[]), module("src/util.py", &[])];
        let symbols = vec![
            symbol("mod:src/app.py", "helper", SymbolKind::Function),
            symbol("mod:src/util.py", "helper", SymbolKind::Function),
        ];
        let mut outlines = HashMap::new();
        let mut outline = SourceOutline::default();
        outline.calls.push(CallSite {
            callee: "helper".to_string(),
            arguments: Vec::new(),
        });
        outlines.insert("mod:src/app.py".to_string(), outline);
        let resolver = resolver_for(&["src/app.py", "src/util.py"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &symbols,
            &[],
            &outlines,
            &resolver,
            &mut warnings,
        );

        let calls: Vec<&Edge> = edges.iter().filter(|e| e.kind == EdgeKind::Calls).collect();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|e| e.from == "mod:src/app.py"));
    }

    #[test]
    fn test_method_call_matches_bare_name() {
        let modules = vec![module("src/app.ts", &[]), module("src/svc.ts", &[])];
        let symbols = vec![
            symbol("mod:src/svc.ts", "UserService", SymbolKind::Class),
            symbol("mod:src/svc.ts", "UserService.findAll", SymbolKind::Method),
        ];
        let mut outlines = HashMap::new();
        let mut outline = SourceOutline::default();
        outline.calls.push(CallSite {
            callee: "this.service.findAll".to_string(),
            arguments: Vec::new(),
        });
        outlines.insert("mod:src/app.ts".to_string(), outline);
        let resolver = resolver_for(&["src/app.ts", "src/svc.ts"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &symbols,
            &[],
            &outlines,
            &resolver,
            &mut warnings,
        );

        let calls: Vec<&Edge> = edges.iter().filter(|e| e.kind == EdgeKind::Calls).collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to, "sym:mod:src/svc.ts:UserService.findAll");
    }

    #[test]
    fn test_extends_and_implements_edges() {
        let modules = vec![module("src/models.ts", &[])];
        let symbols = vec![
            symbol("mod:src/models.ts", "Base", SymbolKind::Class),
            symbol("mod:src/models.ts", "Auditable", SymbolKind::Interface),
            symbol("mod:src/models.ts", "User", SymbolKind::Class),
        ];
        let mut outlines = HashMap::new();
        let mut outline = SourceOutline::default();
        let mut class = ClassDef::named("User");
        class.bases.push("Base".to_string());
        class.implements.push("Auditable".to_string());
        outline.classes.push(class);
        outlines.insert("mod:src/models.ts".to_string(), outline);
        let resolver = resolver_for(&["src/models.ts"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &symbols,
            &[],
            &outlines,
            &resolver,
            &mut warnings,
        );

        let extends: Vec<&Edge> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Extends)
            .collect();
        assert_eq!(extends.len(), 1);
        assert_eq!(extends[0].from, "sym:mod:src/models.ts:User");
        assert_eq!(extends[0].to, "sym:mod:src/models.ts:Base");

        let implements: Vec<&Edge> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Implements)
            .collect();
        assert_eq!(implements.len(), 1);
        assert_eq!(implements[0].to, "sym:mod:src/models.ts:Auditable");
    }

    #[test]
    fn test_implements_requires_interface_kind() {
        let modules = vec![module("src/models.ts", &[])];
        // Same name exists only as a class, so no implements edge.
        let symbols = vec![
            symbol("mod:src/models.ts", "Auditable", SymbolKind::Class),
            symbol("mod:src/models.ts", "User", SymbolKind::Class),
        ];
        let mut outlines = HashMap::new();
        let mut outline = SourceOutline::default();
        let mut class = ClassDef::named("User");
        class.implements.push("Auditable".to_string());
        outline.classes.push(class);
        outlines.insert("mod:src/models.ts".to_string(), outline);
        let resolver = resolver_for(&["src/models.ts"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &symbols,
            &[],
            &outlines,
            &resolver,
            &mut warnings,
        );

        assert!(edges.iter().all(|e| e.kind != EdgeKind::Implements));
    }

    #[test]
    fn test_contains_edge_per_symbol() {
        let modules = vec![module("src/a.py", &[])];
        let symbols = vec![
            symbol("mod:src/a.py", "f", SymbolKind::Function),
            symbol("mod:src/a.py", "g", SymbolKind::Function),
        ];
        let resolver = resolver_for(&["src/a.py"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &symbols,
            &[],
            &HashMap::new(),
            &resolver,
            &mut warnings,
        );

        let contains: Vec<&Edge> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Contains)
            .collect();
        assert_eq!(contains.len(), 2);
        assert!(contains.iter().all(|e| e.from == "mod:src/a.py"));
    }

    #[test]
    fn test_routes_to_edge_for_resolved_handler() {
        let modules = vec![module("src/users.controller.ts", &[])];
        let symbols = vec![symbol(
            "mod:src/users.controller.ts",
            "UsersController.findAll",
            SymbolKind::Method,
        )];
        let endpoints = vec![
            Endpoint {
                id: "ep:GET:/users".to_string(),
                method: HttpMethod::Get,
                path: "/users".to_string(),
                handler_module_id: "mod:src/users.controller.ts".to_string(),
                handler_symbol_id: Some(
                    "sym:mod:src/users.controller.ts:UsersController.findAll".to_string(),
                ),
                summary: "GET /users".to_string(),
            },
            Endpoint {
                id: "ep:POST:/users".to_string(),
                method: HttpMethod::Post,
                path: "/users".to_string(),
                handler_module_id: "mod:src/users.controller.ts".to_string(),
                handler_symbol_id: None,
                summary: "POST /users".to_string(),
            },
        ];
        let resolver = resolver_for(&["src/users.controller.ts"]);
        let mut warnings = Vec::new();

        let (edges, _) = extract_relationships(
            &modules,
            &symbols,
            &endpoints,
            &HashMap::new(),
            &resolver,
            &mut warnings,
        );

        let routes: Vec<&Edge> = edges
            .iter()
            .filter(|e| e.kind == EdgeKind::RoutesTo)
            .collect();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].from, "ep:GET:/users");
    }

    #[test]
    fn test_fan_counts_by_occurrence() {
        let modules = vec![
            module("src/p.ts", &["import { s } from './s';"]),
            module("src/q.ts", &["import { s } from './s';"]),
            module(
                "src/r.ts",
                &["import { s } from './s';", "import s2 from './s';"],
            ),
            module("src/s.ts", &[]),
        ];
        let resolver = resolver_for(&["src/p.ts", "src/q.ts", "src/r.ts", "src/s.ts"]);
        let mut warnings = Vec::new();

        let (_, fan) = extract_relationships(
            &modules,
            &[],
            &[],
            &HashMap::new(),
            &resolver,
            &mut warnings,
        );

        assert_eq!(fan.fan_in("mod:src/s.ts"), 4);
        assert_eq!(fan.fan_out("mod:src/r.ts"), 2);
        assert_eq!(fan.fan_out("mod:src/s.ts"), 0);
        assert_eq!(fan.len(), 4);
    }
}
