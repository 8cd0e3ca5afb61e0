use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use pkgraph_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{QueryCommand, QuerySource};

#[derive(Parser)]
#[command(name = "pkgraph")]
#[command(version)]
#[command(about = "Generate and query project knowledge graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository and write its knowledge graph document
    Generate {
        /// Repository root to analyze
        root: PathBuf,

        /// Where to write the generated document
        #[arg(short, long, default_value = "pkg.json")]
        output: PathBuf,

        /// Also persist the document into the embedded graph database at PATH
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Regenerate only the modules affected by the changed files
        #[arg(long)]
        incremental: bool,

        /// Prior document to regenerate from
        #[arg(long, value_name = "FILE")]
        base: Option<PathBuf>,

        /// Changed files, repository-relative, comma separated
        #[arg(long, value_name = "FILES", value_delimiter = ',')]
        changed: Vec<String>,
    },

    /// Check a document against the schema rules
    Validate {
        /// Document to validate
        pkg: PathBuf,
    },

    /// Run a query against a document file or the graph database
    Query {
        #[command(flatten)]
        source: QuerySource,

        #[command(subcommand)]
        query: QueryCommand,
    },

    /// Print summary statistics for a document
    Stats {
        /// Document to summarize
        pkg: PathBuf,
    },
}

/// RUST_LOG wins when set; the configured level is the fallback. Logs go to
/// stderr so stdout stays parseable.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    init_tracing(&config.logging.level);

    let result = match cli.command {
        Commands::Generate {
            root,
            output,
            db,
            incremental,
            base,
            changed,
        } => commands::generate(&config, root, output, db, incremental, base, changed).await,
        Commands::Validate { pkg } => commands::validate(&pkg),
        Commands::Query { source, query } => commands::query(&config, source, query).await,
        Commands::Stats { pkg } => commands::stats(&pkg),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
