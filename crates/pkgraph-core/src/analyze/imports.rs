//! Import specifier resolution against the walked file set.
//!
//! Resolution never touches the filesystem: candidates are checked against
//! the set of files the generator walked, which keeps results deterministic
//! and automatically excludes anything outside the walk.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;

use crate::model::ids;

const TS_IMPORT_SPECIFIER: &str =
    r#"from\s+['"]([^'"]+)['"]|import\(\s*['"]([^'"]+)['"]|require\(\s*['"]([^'"]+)['"]"#;
const PY_FROM_TARGET: &str = r"from\s+([.\w]+)\s+import\s+(.+)";
const JAVA_IMPORT: &str = r"import\s+(?:static\s+)?([\w.]+)";
const C_INCLUDE: &str = r#"#include\s*"([^"]+)""#;

const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Outcome of resolving one import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImport {
    /// The specifier mapped to a module inside the repository.
    Internal { specifier: String, module_id: String },
    /// The specifier looked project-local but no walked file matched.
    Unresolved { specifier: String },
}

pub struct ImportResolver {
    /// Path alias prefixes from tsconfig/jsconfig `compilerOptions.paths`,
    /// longest key first.
    aliases: Vec<(String, String)>,
    /// Normalized relative paths of every walked file.
    files: BTreeSet<String>,
}

impl ImportResolver {
    pub fn new(root: &Path, files: BTreeSet<String>) -> Self {
        let mut aliases = Vec::new();
        for config in ["tsconfig.json", "jsconfig.json"] {
            aliases.extend(load_path_aliases(&root.join(config)));
        }
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { aliases, files }
    }

    /// Resolves every specifier found in one verbatim import statement.
    ///
    /// Third-party specifiers produce no entry at all; project-local
    /// specifiers that fail to resolve come back as `Unresolved` so the
    /// caller can surface a warning.
    pub fn resolve_line(&self, raw: &str, importer: &str, language: &str) -> Vec<ResolvedImport> {
        let mut results = Vec::new();
        for specifier in parse_specifiers(raw, language) {
            match self.resolve(&specifier, importer, language) {
                Some(module_id) => results.push(ResolvedImport::Internal {
                    specifier,
                    module_id,
                }),
                None => {
                    if self.looks_local(&specifier, language) {
                        results.push(ResolvedImport::Unresolved { specifier });
                    }
                }
            }
        }
        results
    }

    /// Resolves a single specifier to a module ID.
    pub fn resolve(&self, specifier: &str, importer: &str, language: &str) -> Option<String> {
        let importer_dir = parent_dir(importer);

        match language {
            "typescript" | "javascript" => {
                if let Some(path) = self.resolve_alias(specifier) {
                    return Some(path);
                }
                if specifier.starts_with('.') {
                    let joined = join_path(importer_dir, specifier);
                    return self.try_ts_candidates(&joined);
                }
                // Bare specifiers with a path component may be baseUrl-style
                // absolute imports; everything else is a package name.
                let trimmed = specifier.trim_start_matches('/');
                if specifier.starts_with('/') || trimmed.contains('/') || self.is_top_level(trimmed)
                {
                    return self.try_ts_candidates(trimmed);
                }
                None
            }
            "python" => self.resolve_python(specifier, importer_dir),
            "java" => {
                let path = format!("{}.java", specifier.replace('.', "/"));
                self.lookup(&path)
            }
            "c" | "cpp" => {
                let local = join_path(importer_dir, specifier);
                self.lookup(&local)
                    .or_else(|| self.lookup(specifier.trim_start_matches('/')))
            }
            "asp" | "aspx" => {
                // Virtual includes are rooted; file includes are relative.
                if let Some(rooted) = specifier.strip_prefix('/') {
                    return self.lookup(rooted);
                }
                let local = join_path(importer_dir, specifier);
                self.lookup(&local)
                    .or_else(|| self.lookup(specifier))
            }
            _ => None,
        }
    }

    fn resolve_alias(&self, specifier: &str) -> Option<String> {
        for (key, target) in &self.aliases {
            let rest = if specifier == key {
                ""
            } else if let Some(rest) = specifier.strip_prefix(&format!("{key}/")) {
                rest
            } else {
                continue;
            };
            let substituted = join_path(target, rest);
            if let Some(resolved) = self.try_ts_candidates(&substituted) {
                return Some(resolved);
            }
        }
        None
    }

    fn resolve_python(&self, specifier: &str, importer_dir: &str) -> Option<String> {
        let dots = specifier.chars().take_while(|c| *c == '.').count();
        let rest = specifier[dots..].replace('.', "/");

        if dots > 0 {
            // One dot anchors at the importing package, each further dot
            // walks one level up.
            let mut base = importer_dir.to_string();
            for _ in 1..dots {
                base = parent_dir(&base).to_string();
            }
            let path = join_path(&base, &rest);
            return self.try_python_candidates(&path);
        }

        let local = join_path(importer_dir, &rest);
        self.try_python_candidates(&local)
            .or_else(|| self.try_python_candidates(&rest))
    }

    fn try_ts_candidates(&self, path: &str) -> Option<String> {
        let normalized = normalize_path(path)?;
        if let Some(hit) = self.lookup(&normalized) {
            return Some(hit);
        }
        for ext in TS_EXTENSIONS {
            if let Some(hit) = self.lookup(&format!("{normalized}{ext}")) {
                return Some(hit);
            }
        }
        for ext in TS_EXTENSIONS {
            if let Some(hit) = self.lookup(&format!("{normalized}/index{ext}")) {
                return Some(hit);
            }
        }
        None
    }

    fn try_python_candidates(&self, path: &str) -> Option<String> {
        let normalized = normalize_path(path)?;
        if normalized.is_empty() {
            return None;
        }
        self.lookup(&format!("{normalized}.py"))
            .or_else(|| self.lookup(&format!("{normalized}/__init__.py")))
    }

    fn lookup(&self, path: &str) -> Option<String> {
        let normalized = normalize_path(path)?;
        if self.files.contains(&normalized) {
            Some(ids::module_id(&normalized))
        } else {
            None
        }
    }

    fn is_top_level(&self, segment: &str) -> bool {
        let prefix = format!("{segment}/");
        self.files.contains(segment) || self.files.iter().any(|f| f.starts_with(&prefix))
    }

    /// Whether a failed specifier deserves an unresolved-import warning.
    fn looks_local(&self, specifier: &str, language: &str) -> bool {
        match language {
            "typescript" | "javascript" => {
                specifier.starts_with('.')
                    || specifier.starts_with('/')
                    || self
                        .aliases
                        .iter()
                        .any(|(key, _)| specifier == key || specifier.starts_with(&format!("{key}/")))
            }
            "python" | "java" => {
                if specifier.starts_with('.') {
                    return true;
                }
                let first = specifier.split('.').next().unwrap_or("");
                !first.is_empty() && self.is_top_level(first)
            }
            "c" | "cpp" | "asp" | "aspx" => true,
            _ => false,
        }
    }
}

/// Pulls the import specifiers out of one verbatim import statement.
pub fn parse_specifiers(raw: &str, language: &str) -> Vec<String> {
    let raw = raw.trim();
    match language {
        "typescript" | "javascript" => {
            let re = match Regex::new(TS_IMPORT_SPECIFIER) {
                Ok(r) => r,
                Err(_) => return Vec::new(),
            };
            re.captures_iter(raw)
                .filter_map(|c| {
                    c.get(1)
                        .or_else(|| c.get(2))
                        .or_else(|| c.get(3))
                        .map(|m| m.as_str().to_string())
                })
                .collect()
        }
        "python" => {
            if raw.starts_with("from ") {
                let re = match Regex::new(PY_FROM_TARGET) {
                    Ok(r) => r,
                    Err(_) => return Vec::new(),
                };
                let Some(cap) = re.captures(raw) else {
                    return Vec::new();
                };
                let target = cap.get(1).map(|m| m.as_str()).unwrap_or("");
                if !target.is_empty() && target.chars().all(|c| c == '.') {
                    // `from . import a, b` names sibling modules directly.
                    let names = cap.get(2).map(|m| m.as_str()).unwrap_or("");
                    return names
                        .split(',')
                        .map(|n| n.trim())
                        .filter(|n| !n.is_empty() && *n != "*")
                        .map(|n| {
                            let name = n.split_whitespace().next().unwrap_or(n);
                            format!("{target}{name}")
                        })
                        .collect();
                }
                if target.is_empty() {
                    return Vec::new();
                }
                return vec![target.to_string()];
            }
            if let Some(rest) = raw.strip_prefix("import ") {
                return rest
                    .split(',')
                    .filter_map(|part| part.trim().split_whitespace().next())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect();
            }
            Vec::new()
        }
        "java" => {
            let re = match Regex::new(JAVA_IMPORT) {
                Ok(r) => r,
                Err(_) => return Vec::new(),
            };
            re.captures(raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str())
                // Wildcard imports name a package, not a file.
                .filter(|s| !s.is_empty() && !s.ends_with('.'))
                .map(|s| s.to_string())
                .into_iter()
                .collect()
        }
        "c" | "cpp" => {
            let re = match Regex::new(C_INCLUDE) {
                Ok(r) => r,
                Err(_) => return Vec::new(),
            };
            re.captures(raw)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .into_iter()
                .collect()
        }
        // ASP include directives are stored as bare paths already.
        "asp" | "aspx" => vec![raw.to_string()],
        _ => Vec::new(),
    }
}

/// Collapses `.` and `..` segments; `..` past the root fails.
fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for comp in path.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            c => parts.push(c),
        }
    }
    Some(parts.join("/"))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn join_path(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else if rest.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

fn load_path_aliases(config: &Path) -> Vec<(String, String)> {
    let Ok(content) = std::fs::read_to_string(config) else {
        return Vec::new();
    };
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) else {
        return Vec::new();
    };

    let options = json.get("compilerOptions");
    let base_url = options
        .and_then(|o| o.get("baseUrl"))
        .and_then(|b| b.as_str())
        .map(|b| b.trim_start_matches("./").trim_matches('/').to_string())
        .unwrap_or_default();

    let Some(paths) = options
        .and_then(|o| o.get("paths"))
        .and_then(|p| p.as_object())
    else {
        return Vec::new();
    };

    let mut aliases = Vec::new();
    for (key, targets) in paths {
        let Some(first) = targets.as_array().and_then(|a| a.first()).and_then(|t| t.as_str())
        else {
            continue;
        };
        let key = key.trim_end_matches("/*").to_string();
        let target = first.trim_end_matches("/*").trim_start_matches("./");
        let target = if base_url.is_empty() || base_url == "." {
            target.to_string()
        } else {
            join_path(&base_url, target)
        };
        if !key.is_empty() {
            aliases.push((key, target));
        }
    }
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver_with(files: &[&str]) -> ImportResolver {
        let set = files.iter().map(|f| f.to_string()).collect();
        ImportResolver {
            aliases: Vec::new(),
            files: set,
        }
    }

    #[test]
    fn test_relative_ts_import() {
        let resolver = resolver_with(&["src/a.ts", "src/b.ts"]);
        assert_eq!(
            resolver.resolve("./b", "src/a.ts", "typescript"),
            Some("mod:src/b.ts".to_string())
        );
        assert_eq!(resolver.resolve("./missing", "src/a.ts", "typescript"), None);
    }

    #[test]
    fn test_directory_index_fallback() {
        let resolver = resolver_with(&["src/app.ts", "src/users/index.ts"]);
        assert_eq!(
            resolver.resolve("./users", "src/app.ts", "typescript"),
            Some("mod:src/users/index.ts".to_string())
        );
    }

    #[test]
    fn test_parent_relative_import() {
        let resolver = resolver_with(&["src/api/users.ts", "src/util.ts"]);
        assert_eq!(
            resolver.resolve("../util", "src/api/users.ts", "typescript"),
            Some("mod:src/util.ts".to_string())
        );
    }

    #[test]
    fn test_alias_resolution() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"compilerOptions": {"paths": {"@app/*": ["src/app/*"]}}}"#,
        )
        .unwrap();
        let files: BTreeSet<String> = ["src/app/users.service.ts"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let resolver = ImportResolver::new(dir.path(), files);

        assert_eq!(
            resolver.resolve("@app/users.service", "src/main.ts", "typescript"),
            Some("mod:src/app/users.service.ts".to_string())
        );
    }

    #[test]
    fn test_python_dotted_and_package_init() {
        let resolver = resolver_with(&[
            "app/main.py",
            "app/services/user.py",
            "app/services/__init__.py",
        ]);
        assert_eq!(
            resolver.resolve("app.services.user", "app/main.py", "python"),
            Some("mod:app/services/user.py".to_string())
        );
        assert_eq!(
            resolver.resolve("app.services", "app/main.py", "python"),
            Some("mod:app/services/__init__.py".to_string())
        );
        // Leading-dot form anchors at the importing package.
        assert_eq!(
            resolver.resolve(".services.user", "app/main.py", "python"),
            Some("mod:app/services/user.py".to_string())
        );
    }

    #[test]
    fn test_java_import() {
        let resolver = resolver_with(&["com/acme/UserService.java"]);
        assert_eq!(
            resolver.resolve("com.acme.UserService", "com/acme/Main.java", "java"),
            Some("mod:com/acme/UserService.java".to_string())
        );
        assert_eq!(resolver.resolve("java.util.List", "com/acme/Main.java", "java"), None);
    }

    #[test]
    fn test_c_include() {
        let resolver = resolver_with(&["src/main.c", "src/util.h"]);
        assert_eq!(
            resolver.resolve("util.h", "src/main.c", "c"),
            Some("mod:src/util.h".to_string())
        );
    }

    #[test]
    fn test_parse_specifiers() {
        assert_eq!(
            parse_specifiers("import { A } from './a';", "typescript"),
            vec!["./a"]
        );
        assert_eq!(
            parse_specifiers("const x = require('./x');", "javascript"),
            vec!["./x"]
        );
        assert_eq!(
            parse_specifiers("from app.services import user", "python"),
            vec!["app.services"]
        );
        assert_eq!(
            parse_specifiers("from . import db, models", "python"),
            vec![".db", ".models"]
        );
        assert_eq!(
            parse_specifiers("import os, sys", "python"),
            vec!["os", "sys"]
        );
        assert_eq!(
            parse_specifiers("import com.acme.UserService;", "java"),
            vec!["com.acme.UserService"]
        );
        assert_eq!(
            parse_specifiers("#include \"util.h\"", "c"),
            vec!["util.h"]
        );
        assert!(parse_specifiers("#include <stdio.h>", "c").is_empty());
        assert_eq!(
            parse_specifiers("helpers/db.asp", "asp"),
            vec!["helpers/db.asp"]
        );
    }

    #[test]
    fn test_resolve_line_warns_only_for_local() {
        let resolver = resolver_with(&["src/a.ts"]);
        let results = resolver.resolve_line(
            "import express from 'express';",
            "src/a.ts",
            "typescript",
        );
        assert!(results.is_empty());

        let results = resolver.resolve_line(
            "import { b } from './missing';",
            "src/a.ts",
            "typescript",
        );
        assert_eq!(
            results,
            vec![ResolvedImport::Unresolved {
                specifier: "./missing".to_string()
            }]
        );
    }

    #[test]
    fn test_normalize_path_escape() {
        assert_eq!(normalize_path("a/b/../c"), Some("a/c".to_string()));
        assert_eq!(normalize_path("./a"), Some("a".to_string()));
        assert_eq!(normalize_path("../outside"), None);
    }
}
