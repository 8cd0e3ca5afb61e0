//! Default values for pkgraph configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Generator Defaults
// ============================================================================

/// Fan-in threshold above which class symbols carry full docstring detail.
pub const DEFAULT_FAN_THRESHOLD: usize = 3;

/// Whether folder-derived features are emitted by default.
pub const DEFAULT_INCLUDE_FEATURES: bool = true;

/// Maximum size of a single source file to analyze (16 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum number of attempts for retryable file reads.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial delay between read retries, in seconds. Doubles per attempt.
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;

/// Languages analyzed by default.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "python",
    "typescript",
    "javascript",
    "java",
    "c",
    "cpp",
    "csharp",
    "asp",
    "aspx",
];

/// Directories excluded from the repository walk.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    "vendor",
    "venv",
    ".venv",
    "env",
    "__pycache__",
    ".pytest_cache",
    // Build outputs
    "target",
    "build",
    "dist",
    "out",
    "bin",
    "obj",
    // IDE/Editor
    ".idea",
    ".vscode",
    ".vs",
    // pkgraph's own data
    ".pkgraph",
    // Other common excludes
    "coverage",
    ".coverage",
    ".next",
    ".nuxt",
    ".cache",
    "cloned_repos",
];

// ============================================================================
// Store Defaults
// ============================================================================

/// Default data directory for the embedded graph database.
pub const DEFAULT_DATA_DIR: &str = ".pkgraph";

/// SurrealDB namespace.
pub const DEFAULT_NAMESPACE: &str = "pkgraph";

/// SurrealDB database name.
pub const DEFAULT_DATABASE: &str = "graph";

/// Records per batched insert when persisting a document.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log filter when RUST_LOG / PKGRAPH_LOG are unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ============================================================================
// Document Defaults
// ============================================================================

/// Schema version written into every generated document.
pub const PKG_VERSION: &str = "1.0.0";
