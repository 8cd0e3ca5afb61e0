//! Command handlers for the pkgraph binary.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use pkgraph_core::query::store::DEFAULT_CRITICAL_LIMIT;
use pkgraph_core::{
    validate_pkg, Config, GraphQueries, GraphStore, MemoryQueryEngine, Pkg, PkgError,
    PkgGenerator, StoreQueryEngine,
};

/// Where a query reads its graph from. Exactly one source must be given.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct QuerySource {
    /// Query a document file with the in-memory engine
    #[arg(long, value_name = "FILE")]
    pub pkg: Option<PathBuf>,

    /// Query the embedded graph database at PATH
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum QueryCommand {
    /// Modules whose kind tags contain TAG
    Tag { tag: String },

    /// Modules with an exact kind tag
    Kind { kind: String },

    /// Modules whose path matches a `*` wildcard pattern
    Path { pattern: String },

    /// Symbols whose name matches a `*` wildcard pattern
    Symbol { pattern: String },

    /// Endpoints whose route matches a `*` wildcard pattern
    Endpoint { pattern: String },

    /// Direct caller and callee modules of MODULE_ID
    Deps { module_id: String },

    /// Modules reachable from the seed ids within a depth bound
    Impact {
        /// Seed module ids, comma separated
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Traversal depth bound
        #[arg(long, default_value_t = 2)]
        depth: usize,
    },

    /// Circular import/call chains between modules (needs --db)
    Cycles,

    /// Architectural smell report (needs --db)
    Smells,

    /// Modules ranked by incoming dependency count (needs --db)
    Critical {
        /// Number of modules to report
        #[arg(long, default_value_t = DEFAULT_CRITICAL_LIMIT)]
        limit: usize,
    },

    /// Shortest dependency path between two modules (needs --db)
    PathBetween { from: String, to: String },
}

pub async fn generate(
    config: &Config,
    root: PathBuf,
    output: PathBuf,
    db: Option<PathBuf>,
    incremental: bool,
    base: Option<PathBuf>,
    changed: Vec<String>,
) -> Result<(), PkgError> {
    if incremental && (base.is_none() || changed.is_empty()) {
        return Err(PkgError::Config(
            "--incremental needs --base <FILE> and --changed <FILES>".to_string(),
        ));
    }

    let mut generator = PkgGenerator::new(&root, config.generator.clone())?;
    if let Some(db_path) = &db {
        let store = GraphStore::open(db_path, config.store.clone()).await?;
        generator = generator.with_store(store);
    }

    info!(root = %root.display(), incremental, "starting generation");
    let spinner = progress_spinner(format!("Analyzing {}", root.display()));
    let result = match (incremental, &base) {
        (true, Some(base_path)) => {
            let base_pkg = Pkg::load(base_path)?;
            generator
                .generate_incremental(&changed, &base_pkg, Some(&output))
                .await
        }
        _ => generator.generate(Some(&output)).await,
    };
    spinner.finish_and_clear();
    let pkg = result?;

    println!("Generated knowledge graph for {}", pkg.project.name);
    println!("  Modules:   {}", pkg.modules.len());
    println!("  Symbols:   {}", pkg.symbols.len());
    println!("  Endpoints: {}", pkg.endpoints.len());
    println!("  Edges:     {}", pkg.edges.len());
    let errors = metadata_count(&pkg, "errorCount");
    let warnings = metadata_count(&pkg, "warningCount");
    if errors > 0 || warnings > 0 {
        println!("  Diagnostics: {errors} errors, {warnings} warnings");
    }
    println!("  Wrote {}", output.display());
    if let Some(db_path) = &db {
        println!("  Stored in graph database at {}", db_path.display());
    }
    Ok(())
}

pub fn validate(path: &Path) -> Result<(), PkgError> {
    let pkg = Pkg::load(path)?;
    let report = validate_pkg(&pkg);
    if report.valid {
        println!("{}: valid", path.display());
        Ok(())
    } else {
        eprintln!(
            "{}: {} validation error(s)",
            path.display(),
            report.errors.len()
        );
        for error in &report.errors {
            eprintln!("  - {error}");
        }
        process::exit(1);
    }
}

pub async fn query(
    config: &Config,
    source: QuerySource,
    command: QueryCommand,
) -> Result<(), PkgError> {
    if let Some(db_path) = source.db {
        let store = GraphStore::open(&db_path, config.store.clone()).await?;
        let engine = StoreQueryEngine::new(store);
        let value = match &command {
            QueryCommand::Cycles => serde_json::to_value(engine.circular_dependencies().await?)?,
            QueryCommand::Smells => serde_json::to_value(engine.code_smells().await?)?,
            QueryCommand::Critical { limit } => {
                serde_json::to_value(engine.critical_modules(*limit).await?)?
            }
            QueryCommand::PathBetween { from, to } => {
                serde_json::to_value(engine.shortest_path(from, to).await?)?
            }
            shared => match shared_query(&engine, shared).await? {
                Some(value) => value,
                None => serde_json::Value::Null,
            },
        };
        print_json(&value)
    } else if let Some(pkg_path) = source.pkg {
        let pkg = Pkg::load(&pkg_path)?;
        let engine = MemoryQueryEngine::new(pkg);
        match shared_query(&engine, &command).await? {
            Some(value) => print_json(&value),
            None => {
                eprintln!("this query runs against the graph database; rerun with --db <PATH>");
                process::exit(2);
            }
        }
    } else {
        // unreachable under the clap group constraint
        Err(PkgError::Config(
            "either --pkg or --db is required".to_string(),
        ))
    }
}

/// Runs the operations both engines support. Returns `None` for the
/// database-only subcommands.
async fn shared_query(
    engine: &dyn GraphQueries,
    command: &QueryCommand,
) -> Result<Option<serde_json::Value>, PkgError> {
    let value = match command {
        QueryCommand::Tag { tag } => serde_json::to_value(engine.modules_by_tag(tag).await?)?,
        QueryCommand::Kind { kind } => serde_json::to_value(engine.modules_by_kind(kind).await?)?,
        QueryCommand::Path { pattern } => {
            serde_json::to_value(engine.modules_by_path_pattern(pattern).await?)?
        }
        QueryCommand::Symbol { pattern } => {
            serde_json::to_value(engine.symbols_by_name(pattern).await?)?
        }
        QueryCommand::Endpoint { pattern } => {
            serde_json::to_value(engine.endpoints_by_path(pattern).await?)?
        }
        QueryCommand::Deps { module_id } => {
            serde_json::to_value(engine.dependencies(module_id).await?)?
        }
        QueryCommand::Impact { ids, depth } => {
            serde_json::to_value(engine.impacted_modules(ids, *depth).await?)?
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    project: String,
    version: String,
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age_days: Option<i64>,
    languages: Vec<String>,
    frameworks: Vec<String>,
    modules: usize,
    symbols: usize,
    endpoints: usize,
    edges: usize,
    features: usize,
    errors: u64,
    warnings: u64,
}

pub fn stats(path: &Path) -> Result<(), PkgError> {
    let pkg = Pkg::load(path)?;
    let age_days = DateTime::parse_from_rfc3339(&pkg.generated_at)
        .ok()
        .map(|t| Utc::now().signed_duration_since(t.with_timezone(&Utc)).num_days());
    let report = StatsReport {
        project: pkg.project.name.clone(),
        version: pkg.version.clone(),
        generated_at: pkg.generated_at.clone(),
        git_sha: pkg.git_sha.clone(),
        age_days,
        languages: pkg.project.languages.clone(),
        frameworks: pkg.project.frameworks.clone(),
        modules: pkg.modules.len(),
        symbols: pkg.symbols.len(),
        endpoints: pkg.endpoints.len(),
        edges: pkg.edges.len(),
        features: pkg.features.as_ref().map(Vec::len).unwrap_or(0),
        errors: metadata_count(&pkg, "errorCount"),
        warnings: metadata_count(&pkg, "warningCount"),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn metadata_count(pkg: &Pkg, key: &str) -> u64 {
    pkg.project
        .metadata
        .get(key)
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

fn progress_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn print_json(value: &serde_json::Value) -> Result<(), PkgError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
