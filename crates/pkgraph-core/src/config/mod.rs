//! Configuration management for pkgraph.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `pkgraph.toml` file
//! 3. User config `~/.config/pkgraph/config.toml`
//! 4. Built-in defaults (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document generation configuration.
    pub generator: GeneratorConfig,

    /// Graph store configuration.
    pub store: StoreConfig,

    /// Logging configuration.
    pub logging: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            store: StoreConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./pkgraph.toml` (project local)
    /// 2. `~/.config/pkgraph/config.toml` (user config)
    /// 3. Falls back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new("pkgraph.toml").exists() {
            return Self::from_file("pkgraph.toml");
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pkgraph").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(threshold) = std::env::var("PKGRAPH_FAN_THRESHOLD") {
            if let Ok(n) = threshold.parse() {
                self.generator.fan_threshold = n;
            }
        }
        if let Ok(features) = std::env::var("PKGRAPH_INCLUDE_FEATURES") {
            if let Ok(b) = features.parse() {
                self.generator.include_features = b;
            }
        }
        if let Ok(size) = std::env::var("PKGRAPH_MAX_FILE_SIZE") {
            if let Ok(n) = size.parse() {
                self.generator.max_file_size = n;
            }
        }
        if let Ok(retries) = std::env::var("PKGRAPH_MAX_RETRIES") {
            if let Ok(n) = retries.parse() {
                self.generator.max_retries = n;
            }
        }
        if let Ok(delay) = std::env::var("PKGRAPH_RETRY_DELAY") {
            if let Ok(n) = delay.parse() {
                self.generator.retry_delay_secs = n;
            }
        }

        if let Ok(dir) = std::env::var("PKGRAPH_DATA_DIR") {
            self.store.data_dir = dir;
        }
        if let Ok(size) = std::env::var("PKGRAPH_BATCH_SIZE") {
            if let Ok(n) = size.parse() {
                self.store.batch_size = n;
            }
        }

        if let Ok(level) = std::env::var("PKGRAPH_LOG") {
            self.logging.level = level;
        }
    }

    /// Reject values that would make generation misbehave silently.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be positive".into()));
        }
        if self.generator.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be positive".into()));
        }
        if self.generator.retry_delay_secs <= 0.0 {
            return Err(ConfigError::Invalid(
                "retry_delay_secs must be positive".into(),
            ));
        }
        if self.generator.max_file_size == 0 {
            return Err(ConfigError::Invalid(
                "max_file_size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Document generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fan-in threshold above which class symbols carry full docstring detail.
    pub fan_threshold: usize,

    /// Emit folder-derived features.
    pub include_features: bool,

    /// Maximum size of a single source file to analyze (in bytes).
    pub max_file_size: u64,

    /// Maximum attempts for retryable file reads.
    pub max_retries: u32,

    /// Initial delay between read retries, in seconds.
    pub retry_delay_secs: f64,

    /// Languages to analyze.
    pub languages: Vec<String>,

    /// Directories to exclude from the repository walk.
    pub exclude_dirs: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fan_threshold: DEFAULT_FAN_THRESHOLD,
            include_features: DEFAULT_INCLUDE_FEATURES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Graph store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base directory for the embedded graph database (default: ".pkgraph").
    pub data_dir: String,

    /// SurrealDB namespace.
    pub namespace: String,

    /// SurrealDB database name.
    pub database: String,

    /// Records per batched insert when persisting a document.
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: DEFAULT_DATA_DIR.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log filter applied when the environment does not set one.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
