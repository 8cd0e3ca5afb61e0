//! Document generation: repository walk, per-file analysis, assembly.
//!
//! [`PkgGenerator`] owns one generation run. Per-file failures are collected
//! as error records on the document instead of aborting; only a failed
//! structural validation of the finished document is fatal.

pub mod snippets;
pub mod symbols;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::analyze::project::git_sha;
use crate::analyze::{
    detect_frameworks, detect_module_framework, detect_module_kind, extract_endpoints,
    extract_project_info, extract_relationships, ImportResolver,
};
use crate::config::{GeneratorConfig, PKG_VERSION};
use crate::error::PkgError;
use crate::lang::{detect_language, NormalizerRegistry, ParseFailure, SourceOutline};
use crate::model::{
    ids, Edge, EdgeKind, Endpoint, ErrorKind, ErrorRecord, Feature, Module, Pkg, Symbol,
    WarningKind, WarningRecord,
};
use crate::store::GraphStore;
use crate::validate::validate_pkg;

pub use snippets::extract_snippets;
pub use symbols::build_symbols;

/// Module IDs that must be re-analyzed for a set of changed files: the
/// changed modules themselves plus the opposite endpoint of every `imports`
/// edge touching one of them.
pub fn affected_modules(changed_files: &[String], edges: &[Edge]) -> BTreeSet<String> {
    let changed: BTreeSet<String> = changed_files
        .iter()
        .map(|f| ids::module_id(f))
        .collect();
    let mut affected = changed.clone();
    for edge in edges {
        if edge.kind != EdgeKind::Imports {
            continue;
        }
        if changed.contains(&edge.from) {
            affected.insert(edge.to.clone());
        } else if changed.contains(&edge.to) {
            affected.insert(edge.from.clone());
        }
    }
    affected
}

enum AnalyzeFileError {
    Missing(std::io::Error),
    Read(std::io::Error),
    Parse(ParseFailure),
    NoNormalizer,
}

/// Generates a complete knowledge-graph document for one repository.
pub struct PkgGenerator {
    root: PathBuf,
    config: GeneratorConfig,
    registry: NormalizerRegistry,
    store: Option<GraphStore>,
    errors: Vec<ErrorRecord>,
    warnings: Vec<WarningRecord>,
}

impl PkgGenerator {
    pub fn new(root: impl AsRef<Path>, config: GeneratorConfig) -> Result<Self, PkgError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(PkgError::InvalidRoot(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            config,
            registry: NormalizerRegistry::new(),
            store: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        })
    }

    /// Attaches a graph store; generated documents are persisted into it.
    pub fn with_store(mut self, store: GraphStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Runs a full analysis of the repository.
    ///
    /// Collected per-file errors and warnings land in `project.metadata`;
    /// the document is optionally written to `output` and persisted to the
    /// attached store.
    pub async fn generate(&mut self, output: Option<&Path>) -> Result<Pkg, PkgError> {
        self.errors.clear();
        self.warnings.clear();

        info!(root = %self.root.display(), "analyzing repository");
        let files = self.collect_files();
        info!(files = files.len(), "collected source files");

        let frameworks = detect_frameworks(&self.root);
        let project = extract_project_info(&self.root, &files, frameworks.clone());

        let (mut modules, outlines) = self.build_modules(&files, &frameworks);
        let symbols = build_symbols(&mut modules, &outlines, None, self.fan_threshold());

        let endpoints = self
            .build_endpoints(&modules, &symbols, &frameworks)
            .await;

        let resolver = ImportResolver::new(&self.root, files);
        let (edges, fan) = extract_relationships(
            &modules,
            &symbols,
            &endpoints,
            &outlines,
            &resolver,
            &mut self.warnings,
        );
        backfill_imports(&mut modules, &edges);

        let symbols = build_symbols(&mut modules, &outlines, Some(&fan), self.fan_threshold());
        let features = self
            .config
            .include_features
            .then(|| build_features(&modules));

        info!(
            modules = modules.len(),
            symbols = symbols.len(),
            endpoints = endpoints.len(),
            edges = edges.len(),
            "document assembled"
        );

        let mut pkg = Pkg {
            version: PKG_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            git_sha: git_sha(&self.root),
            project,
            modules,
            symbols,
            endpoints,
            edges,
            features,
        };
        self.attach_diagnostics(&mut pkg)?;

        self.finish(&pkg, output).await?;
        Ok(pkg)
    }

    /// Regenerates a document after a known set of file changes.
    ///
    /// Re-parses the changed modules plus every module one `imports` hop
    /// away, replaces their entries, and recomputes the full edge set over
    /// the merged entity sets. Modules whose file disappeared drop out.
    pub async fn generate_incremental(
        &mut self,
        changed_files: &[String],
        base: &Pkg,
        output: Option<&Path>,
    ) -> Result<Pkg, PkgError> {
        self.errors.clear();
        self.warnings.clear();

        let changed: Vec<String> = changed_files
            .iter()
            .map(|f| ids::normalize_path(f))
            .filter(|f| self.analyzable(f))
            .collect();
        let affected = affected_modules(&changed, &base.edges);
        info!(
            changed = changed.len(),
            affected = affected.len(),
            "incremental regeneration"
        );

        // Module id -> repo-relative path for everything to re-parse.
        let mut candidates: BTreeMap<String, String> = changed
            .iter()
            .map(|f| (ids::module_id(f), f.clone()))
            .collect();
        for id in &affected {
            if let Some(module) = base.module_by_id(id) {
                candidates.entry(id.clone()).or_insert(module.path.clone());
            }
        }

        let frameworks = base.project.frameworks.clone();
        let mut reparsed: Vec<Module> = Vec::new();
        let mut outlines: HashMap<String, SourceOutline> = HashMap::new();
        for (id, rel) in &candidates {
            match self.analyze_file(rel, &frameworks) {
                Ok(Some((module, outline))) => {
                    outlines.insert(id.clone(), outline);
                    reparsed.push(module);
                }
                Ok(None) => {}
                Err(AnalyzeFileError::Missing(_)) => {}
                Err(AnalyzeFileError::Parse(failure)) => {
                    self.record_error(ErrorKind::ParseError, rel, failure.to_string());
                }
                Err(AnalyzeFileError::Read(e)) => {
                    self.record_error(ErrorKind::IncrementalParseError, rel, e.to_string());
                }
                Err(AnalyzeFileError::NoNormalizer) => {}
            }
        }
        reparsed.sort_by(|a, b| a.path.cmp(&b.path));

        let replaced: BTreeSet<&str> = candidates.keys().map(String::as_str).collect();
        let untouched: Vec<Module> = base
            .modules
            .iter()
            .filter(|m| !replaced.contains(m.id.as_str()))
            .cloned()
            .collect();

        let fresh_symbols = build_symbols(&mut reparsed, &outlines, None, self.fan_threshold());
        let fresh_endpoints = self
            .build_endpoints(&reparsed, &fresh_symbols, &frameworks)
            .await;

        let mut modules: Vec<Module> = untouched
            .iter()
            .cloned()
            .chain(reparsed.iter().cloned())
            .collect();
        modules.sort_by(|a, b| a.path.cmp(&b.path));

        let untouched_ids: BTreeSet<&str> = untouched.iter().map(|m| m.id.as_str()).collect();
        let symbols = merge_by_module(&modules, &untouched_ids, &base.symbols, &fresh_symbols, |s| {
            &s.module_id
        });
        let endpoints = merge_by_module(
            &modules,
            &untouched_ids,
            &base.endpoints,
            &fresh_endpoints,
            |e| &e.handler_module_id,
        );

        let files: BTreeSet<String> = modules.iter().map(|m| m.path.clone()).collect();
        let resolver = ImportResolver::new(&self.root, files);
        let (edges, fan) = extract_relationships(
            &modules,
            &symbols,
            &endpoints,
            &outlines,
            &resolver,
            &mut self.warnings,
        );
        backfill_imports(&mut modules, &edges);

        // Second symbol pass for re-parsed modules now that fan stats exist.
        let fresh_symbols =
            build_symbols(&mut reparsed, &outlines, Some(&fan), self.fan_threshold());
        for module in &reparsed {
            if let Some(slot) = modules.iter_mut().find(|m| m.id == module.id) {
                slot.exports = module.exports.clone();
            }
        }
        let symbols = merge_by_module(&modules, &untouched_ids, &base.symbols, &fresh_symbols, |s| {
            &s.module_id
        });

        let features = self
            .config
            .include_features
            .then(|| build_features(&modules));

        let mut pkg = Pkg {
            version: PKG_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            git_sha: git_sha(&self.root),
            project: base.project.clone(),
            modules,
            symbols,
            endpoints,
            edges,
            features,
        };
        self.attach_diagnostics(&mut pkg)?;

        self.finish(&pkg, output).await?;
        Ok(pkg)
    }

    /// Validation, optional JSON write, optional store persistence.
    async fn finish(&self, pkg: &Pkg, output: Option<&Path>) -> Result<(), PkgError> {
        let report = validate_pkg(pkg);
        if !report.valid {
            return Err(PkgError::SchemaValidation {
                errors: report.errors,
            });
        }
        if let Some(path) = output {
            pkg.save(path)?;
            info!(path = %path.display(), "document written");
        }
        if let Some(store) = &self.store {
            store.store_pkg(pkg).await?;
        }
        Ok(())
    }

    fn fan_threshold(&self) -> u32 {
        self.config.fan_threshold as u32
    }

    fn analyzable(&self, rel: &str) -> bool {
        detect_language(Path::new(rel))
            .is_some_and(|lang| self.config.languages.iter().any(|l| l == lang))
    }

    /// Walks the repository and returns sorted repo-relative paths of every
    /// analyzable source file.
    fn collect_files(&self) -> BTreeSet<String> {
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .max_filesize(Some(self.config.max_file_size));

        let exclude = self.config.exclude_dirs.clone();
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .map_or(true, |name| !exclude.iter().any(|d| d == name))
        });

        let mut files = BTreeSet::new();
        for result in builder.build() {
            let Ok(entry) = result else {
                continue;
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = ids::normalize_path(&rel.to_string_lossy());
            if self.analyzable(&rel) {
                files.insert(rel);
            }
        }
        files
    }

    /// Builds module records plus their outlines for every collected file.
    fn build_modules(
        &mut self,
        files: &BTreeSet<String>,
        frameworks: &[String],
    ) -> (Vec<Module>, HashMap<String, SourceOutline>) {
        let mut modules = Vec::new();
        let mut outlines = HashMap::new();

        for rel in files {
            match self.analyze_file(rel, frameworks) {
                Ok(Some((module, outline))) => {
                    outlines.insert(module.id.clone(), outline);
                    modules.push(module);
                }
                Ok(None) => {}
                Err(AnalyzeFileError::Missing(e)) => {
                    self.record_error(ErrorKind::FileNotFound, rel, e.to_string());
                }
                Err(AnalyzeFileError::Read(e)) => {
                    self.record_error(ErrorKind::IoError, rel, e.to_string());
                }
                Err(AnalyzeFileError::Parse(failure)) => {
                    self.record_error(ErrorKind::ParseError, rel, failure.to_string());
                }
                Err(AnalyzeFileError::NoNormalizer) => {
                    self.record_error(
                        ErrorKind::ModuleBuildError,
                        rel,
                        format!("No normalizer registered for {rel}"),
                    );
                }
            }
        }

        info!(modules = modules.len(), "built module records");
        (modules, outlines)
    }

    /// Analyzes one file into a module record and its outline.
    ///
    /// `Ok(None)` means the file parsed but held no definitions; the
    /// `no_definitions` warning is recorded here.
    fn analyze_file(
        &mut self,
        rel: &str,
        frameworks: &[String],
    ) -> Result<Option<(Module, SourceOutline)>, AnalyzeFileError> {
        let abs = self.root.join(rel);
        let bytes = fs::read(&abs).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalyzeFileError::Missing(e)
            } else {
                AnalyzeFileError::Read(e)
            }
        })?;
        let source = String::from_utf8_lossy(&bytes).into_owned();

        let path = Path::new(rel);
        let normalizer = self
            .registry
            .for_path(path)
            .ok_or(AnalyzeFileError::NoNormalizer)?;
        let outline = normalizer
            .normalize(rel, &source)
            .map_err(AnalyzeFileError::Parse)?;

        if outline.is_empty() {
            self.warnings.push(WarningRecord {
                kind: WarningKind::NoDefinitions,
                file_path: rel.to_string(),
                message: format!("No definitions found in {rel}"),
            });
            return Ok(None);
        }

        let hash = hex::encode(Sha256::digest(&bytes));
        let loc = source.lines().filter(|l| !l.trim().is_empty()).count();
        let kind = detect_module_kind(path, &outline, frameworks);
        let (framework, framework_confidence) =
            detect_module_framework(path, &outline, frameworks);
        let code_snippets = extract_snippets(&source, &outline);

        let module = Module {
            id: ids::module_id(rel),
            path: rel.to_string(),
            kind,
            loc,
            hash,
            exports: Vec::new(),
            imports: Vec::new(),
            raw_imports: outline.imports.clone(),
            framework,
            framework_confidence,
            module_summary: None,
            code_snippets,
        };
        Ok(Some((module, outline)))
    }

    /// Extracts endpoints module by module, re-reading each file with retry.
    async fn build_endpoints(
        &mut self,
        modules: &[Module],
        symbols: &[Symbol],
        frameworks: &[String],
    ) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();

        for module in modules {
            let abs = self.root.join(&module.path);
            let source = match self.read_with_retry(&abs).await {
                Ok(source) => source,
                Err(e) => {
                    self.record_error(
                        ErrorKind::EndpointExtractionError,
                        &module.path,
                        e.to_string(),
                    );
                    continue;
                }
            };

            let mut applicable = frameworks.to_vec();
            if let Some(fw) = &module.framework {
                if !applicable.contains(fw) {
                    applicable.push(fw.clone());
                }
            }
            let module_symbols: Vec<Symbol> = symbols
                .iter()
                .filter(|s| s.module_id == module.id)
                .cloned()
                .collect();

            endpoints.extend(extract_endpoints(
                Path::new(&module.path),
                &source,
                &module.id,
                &applicable,
                &module_symbols,
            ));
        }

        info!(endpoints = endpoints.len(), "extracted endpoints");
        endpoints
    }

    /// Reads a file, retrying transient I/O failures with doubling delay.
    /// Missing files fail immediately.
    async fn read_with_retry(&self, path: &Path) -> Result<String, std::io::Error> {
        let mut delay = Duration::from_secs_f64(self.config.retry_delay_secs);
        let mut last_error: Option<std::io::Error> = None;

        for attempt in 1..=self.config.max_retries {
            match fs::read(path) {
                Ok(bytes) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(e),
                Err(e) => {
                    warn!(path = %path.display(), attempt, error = %e, "read failed");
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| std::io::Error::other("read failed")))
    }

    fn record_error(&mut self, kind: ErrorKind, rel: &str, message: String) {
        self.errors.push(ErrorRecord {
            kind,
            file_path: rel.to_string(),
            message,
            stack_trace: None,
        });
    }

    /// Pushes collected errors and warnings into `project.metadata`.
    fn attach_diagnostics(&self, pkg: &mut Pkg) -> Result<(), PkgError> {
        let metadata = &mut pkg.project.metadata;
        metadata.insert("errors".to_string(), serde_json::to_value(&self.errors)?);
        metadata.insert(
            "warnings".to_string(),
            serde_json::to_value(&self.warnings)?,
        );
        metadata.insert("errorCount".to_string(), self.errors.len().into());
        metadata.insert("warningCount".to_string(), self.warnings.len().into());
        Ok(())
    }
}

/// Rewrites each module's `imports` to the sorted distinct targets of its
/// `imports` edges.
fn backfill_imports(modules: &mut [Module], edges: &[Edge]) {
    let mut by_module: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for edge in edges {
        if edge.kind == EdgeKind::Imports {
            by_module
                .entry(edge.from.as_str())
                .or_default()
                .insert(edge.to.as_str());
        }
    }
    for module in modules.iter_mut() {
        module.imports = by_module
            .remove(module.id.as_str())
            .map(|targets| targets.into_iter().map(String::from).collect())
            .unwrap_or_default();
    }
}

/// Folder-derived features: every ancestor folder of a module's path becomes
/// a feature listing all modules at or beneath it, in first-encounter order.
fn build_features(modules: &[Module]) -> Vec<Feature> {
    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<String>> = HashMap::new();

    for module in modules {
        let Some((dirs, _)) = module.path.rsplit_once('/') else {
            continue;
        };
        let mut folder = String::new();
        for part in dirs.split('/') {
            if folder.is_empty() {
                folder.push_str(part);
            } else {
                folder.push('/');
                folder.push_str(part);
            }
            let entry = members.entry(folder.clone()).or_insert_with(|| {
                order.push(folder.clone());
                Vec::new()
            });
            entry.push(module.id.clone());
        }
    }

    order
        .into_iter()
        .map(|path| {
            let name = path
                .rsplit('/')
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| path.clone());
            Feature {
                id: ids::feature_id(&path),
                name,
                module_ids: members.remove(&path).unwrap_or_default(),
                path,
            }
        })
        .collect()
}

/// Stitches per-module records together in module order: untouched modules
/// keep their base records, re-parsed modules take the fresh ones.
fn merge_by_module<T: Clone>(
    modules: &[Module],
    untouched_ids: &BTreeSet<&str>,
    base: &[T],
    fresh: &[T],
    module_of: impl Fn(&T) -> &String,
) -> Vec<T> {
    let mut merged = Vec::new();
    for module in modules {
        let source = if untouched_ids.contains(module.id.as_str()) {
            base
        } else {
            fresh
        };
        merged.extend(
            source
                .iter()
                .filter(|item| module_of(item) == &module.id)
                .cloned(),
        );
    }
    merged
}
