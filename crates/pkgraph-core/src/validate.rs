//! Structural validation of an assembled document.
//!
//! Validation is terminal: identifier-format and referential failures are
//! fatal to generation, everything softer stays a warning on the project
//! record.

use std::collections::HashSet;

use crate::model::{ids, Pkg};

/// Outcome of validating one document.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Checks required fields, identifier formats and referential integrity.
pub fn validate_pkg(pkg: &Pkg) -> ValidationReport {
    let mut errors = Vec::new();

    if pkg.version.is_empty() {
        errors.push("Missing required field: version".to_string());
    }
    if pkg.generated_at.is_empty() {
        errors.push("Missing required field: generatedAt".to_string());
    }
    if pkg.project.id.is_empty() {
        errors.push("Missing required field: project.id".to_string());
    }

    validate_modules(pkg, &mut errors);
    validate_symbols(pkg, &mut errors);
    validate_endpoints(pkg, &mut errors);
    validate_edges(pkg, &mut errors);
    validate_features(pkg, &mut errors);

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn validate_modules(pkg: &Pkg, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for module in &pkg.modules {
        if module.path.is_empty() {
            errors.push(format!("Module {} has an empty path", module.id));
        }
        if module.id != ids::module_id(&module.path) {
            errors.push(format!("Invalid ID format: {}", module.id));
        }
        if !seen.insert(module.id.as_str()) {
            errors.push(format!("Duplicate module id: {}", module.id));
        }
    }
}

fn validate_symbols(pkg: &Pkg, errors: &mut Vec<String>) {
    let modules: HashSet<&str> = pkg.modules.iter().map(|m| m.id.as_str()).collect();
    for symbol in &pkg.symbols {
        match ids::module_of_symbol(&symbol.id) {
            Some(owner) if owner == symbol.module_id => {
                if !modules.contains(symbol.module_id.as_str()) {
                    errors.push(format!(
                        "Module {} not found for symbol {}",
                        symbol.module_id, symbol.id
                    ));
                }
            }
            _ => errors.push(format!("Invalid ID format: {}", symbol.id)),
        }
    }
}

fn validate_endpoints(pkg: &Pkg, errors: &mut Vec<String>) {
    let modules: HashSet<&str> = pkg.modules.iter().map(|m| m.id.as_str()).collect();
    let symbols: HashSet<&str> = pkg.symbols.iter().map(|s| s.id.as_str()).collect();
    for endpoint in &pkg.endpoints {
        if endpoint.id != ids::endpoint_id(endpoint.method.as_str(), &endpoint.path) {
            errors.push(format!("Invalid ID format: {}", endpoint.id));
        }
        if !modules.contains(endpoint.handler_module_id.as_str()) {
            errors.push(format!(
                "Module {} not found for endpoint {}",
                endpoint.handler_module_id, endpoint.id
            ));
        }
        if let Some(handler) = &endpoint.handler_symbol_id {
            if !symbols.contains(handler.as_str()) {
                errors.push(format!(
                    "Symbol {} not found for endpoint {}",
                    handler, endpoint.id
                ));
            }
        }
    }
}

fn validate_edges(pkg: &Pkg, errors: &mut Vec<String>) {
    let mut entities: HashSet<&str> = pkg.modules.iter().map(|m| m.id.as_str()).collect();
    entities.extend(pkg.symbols.iter().map(|s| s.id.as_str()));
    entities.extend(pkg.endpoints.iter().map(|e| e.id.as_str()));

    for edge in &pkg.edges {
        if !entities.contains(edge.from.as_str()) {
            errors.push(format!("Edge source {} not found", edge.from));
        }
        if !entities.contains(edge.to.as_str()) {
            errors.push(format!("Edge target {} not found", edge.to));
        }
    }
}

fn validate_features(pkg: &Pkg, errors: &mut Vec<String>) {
    let Some(features) = &pkg.features else {
        return;
    };
    let modules: HashSet<&str> = pkg.modules.iter().map(|m| m.id.as_str()).collect();
    for feature in features {
        if feature.id != ids::feature_id(&feature.path) {
            errors.push(format!("Invalid ID format: {}", feature.id));
        }
        for module_id in &feature.module_ids {
            if !modules.contains(module_id.as_str()) {
                errors.push(format!(
                    "Module {} not found for feature {}",
                    module_id, feature.id
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Edge, EdgeKind, Endpoint, HttpMethod, Module, ProjectInfo, Symbol, SymbolKind,
    };

    fn test_pkg() -> Pkg {
        Pkg {
            version: "1.0.0".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            git_sha: None,
            project: ProjectInfo {
                id: "demo".to_string(),
                name: "demo".to_string(),
                root_path: "/tmp/demo".to_string(),
                languages: vec!["python".to_string()],
                frameworks: Vec::new(),
                build_tools: Vec::new(),
                git_sha: None,
                metadata: serde_json::Map::new(),
            },
            modules: vec![Module {
                id: "mod:src/a.py".to_string(),
                path: "src/a.py".to_string(),
                kind: Vec::new(),
                loc: 10,
                hash: "abc".to_string(),
                exports: Vec::new(),
                imports: Vec::new(),
                raw_imports: Vec::new(),
                framework: None,
                framework_confidence: None,
                module_summary: None,
                code_snippets: None,
            }],
            symbols: vec![Symbol {
                id: "sym:mod:src/a.py:run".to_string(),
                module_id: "mod:src/a.py".to_string(),
                name: "run".to_string(),
                kind: SymbolKind::Function,
                is_exported: true,
                signature: "run()".to_string(),
                visibility: "public".to_string(),
                is_async: None,
                decorators: None,
                parameters: None,
                return_type: None,
                summary: None,
            }],
            endpoints: Vec::new(),
            edges: vec![Edge::new(
                "mod:src/a.py",
                "sym:mod:src/a.py:run",
                EdgeKind::Contains,
            )],
            features: None,
        }
    }

    #[test]
    fn test_valid_document_passes() {
        let report = validate_pkg(&test_pkg());
        assert!(report.valid, "unexpected errors: {:?}", report.errors);
    }

    #[test]
    fn test_bad_module_id_reported() {
        let mut pkg = test_pkg();
        pkg.modules[0].id = "module-src-a".to_string();
        let report = validate_pkg(&pkg);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Invalid ID format: module-src-a")));
    }

    #[test]
    fn test_symbol_with_missing_module() {
        let mut pkg = test_pkg();
        pkg.symbols[0].id = "sym:mod:src/gone.py:run".to_string();
        pkg.symbols[0].module_id = "mod:src/gone.py".to_string();
        let report = validate_pkg(&pkg);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Module mod:src/gone.py not found for symbol")));
    }

    #[test]
    fn test_symbol_id_must_embed_module() {
        let mut pkg = test_pkg();
        pkg.symbols[0].id = "sym:mod:src/other.py:run".to_string();
        let report = validate_pkg(&pkg);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Invalid ID format: sym:mod:src/other.py:run")));
    }

    #[test]
    fn test_dangling_edge_reported() {
        let mut pkg = test_pkg();
        pkg.edges.push(Edge::new(
            "mod:src/a.py",
            "mod:src/missing.py",
            EdgeKind::Imports,
        ));
        let report = validate_pkg(&pkg);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Edge target mod:src/missing.py not found")));
    }

    #[test]
    fn test_endpoint_checks() {
        let mut pkg = test_pkg();
        pkg.endpoints.push(Endpoint {
            id: "ep:GET:/users".to_string(),
            method: HttpMethod::Get,
            path: "/users".to_string(),
            handler_module_id: "mod:src/a.py".to_string(),
            handler_symbol_id: Some("sym:mod:src/a.py:run".to_string()),
            summary: "GET /users".to_string(),
        });
        assert!(validate_pkg(&pkg).valid);

        pkg.endpoints[0].handler_symbol_id = Some("sym:mod:src/a.py:gone".to_string());
        let report = validate_pkg(&pkg);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Symbol sym:mod:src/a.py:gone not found for endpoint")));
    }

    #[test]
    fn test_duplicate_module_ids_reported() {
        let mut pkg = test_pkg();
        let dup = pkg.modules[0].clone();
        pkg.modules.push(dup);
        let report = validate_pkg(&pkg);
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Duplicate module id: mod:src/a.py")));
    }
}
