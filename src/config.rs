//! Configuration file and environment overrides.
//!
//! A configuration is optional; every field has a default matching the
//! walker's built-in budgets.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use globset::{Glob, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::walker::WalkerLimits;

/// Config file names looked up in the working directory, in order.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["code-analyzer.yaml", ".code-analyzer.yaml"];

pub const ENV_MAX_FILES: &str = "GIT_ANALYSIS_MAX_FILES";
pub const ENV_MAX_FILE_SIZE: &str = "GIT_ANALYSIS_MAX_FILE_SIZE";
pub const ENV_MAX_TOTAL_SIZE: &str = "GIT_ANALYSIS_MAX_TOTAL_SIZE";
pub const ENV_CONCURRENCY: &str = "GIT_ANALYSIS_CONCURRENCY";

/// Errors from loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub lint: LintConfig,
}

/// Repository walker budgets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Candidate files considered per repository
    pub max_files: usize,
    /// Bytes per file
    pub max_file_size: u64,
    /// Cumulative bytes read per repository
    pub max_total_size: u64,
    /// Files processed concurrently
    pub concurrency: usize,
    /// Glob patterns for paths to leave out of the walk (e.g., "**/node_modules/**")
    pub excluded_paths: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        let limits = WalkerLimits::default();
        Self {
            max_files: limits.max_files,
            max_file_size: limits.max_file_size,
            max_total_size: limits.max_total_size,
            concurrency: limits.concurrency,
            excluded_paths: Vec::new(),
        }
    }
}

/// External lint tool for JavaScript files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LintConfig {
    /// Program and arguments; the file name is appended, source goes to stdin.
    #[serde(default)]
    pub command: Option<Vec<String>>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // An empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find a config file in the working directory or the user config dir.
    pub fn discover() -> Option<PathBuf> {
        for name in DEFAULT_CONFIG_NAMES {
            let path = PathBuf::from(name);
            if path.exists() {
                return Some(path);
            }
        }
        let path = ProjectDirs::from("", "", "code-analyzer")?
            .config_dir()
            .join("config.yaml");
        path.exists().then_some(path)
    }

    /// Load the explicit file, or a discovered one, or defaults; then apply
    /// environment overrides and validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(),
        };
        let mut config = match &path {
            Some(p) => {
                debug!(path = %p.display(), "loading config");
                Self::parse_file(p)?
            }
            None => Config::default(),
        };
        config.apply_env_overrides();
        validate(&config)?;
        Ok(config)
    }

    /// Apply the `GIT_ANALYSIS_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            let raw = lookup(key)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(key, value = %raw, "ignoring unparseable environment override");
                    None
                }
            }
        }

        let walker = &mut self.walker;
        if let Some(v) = parsed(&lookup, ENV_MAX_FILES) {
            walker.max_files = v;
        }
        if let Some(v) = parsed(&lookup, ENV_MAX_FILE_SIZE) {
            walker.max_file_size = v;
        }
        if let Some(v) = parsed(&lookup, ENV_MAX_TOTAL_SIZE) {
            walker.max_total_size = v;
        }
        if let Some(v) = parsed(&lookup, ENV_CONCURRENCY) {
            walker.concurrency = v;
        }
    }
}

impl WalkerConfig {
    /// Compile exclusion globs and produce walker limits.
    pub fn limits(&self) -> Result<WalkerLimits, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|e| {
                ConfigError::Invalid(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
            })?;
            builder.add(glob);
        }
        let excluded = builder
            .build()
            .map_err(|e| ConfigError::Invalid(format!("invalid excluded_paths: {}", e)))?;

        Ok(WalkerLimits {
            max_files: self.max_files,
            max_file_size: self.max_file_size,
            max_total_size: self.max_total_size,
            concurrency: self.concurrency,
            excluded,
        })
    }
}

/// Validate a config for correctness.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let walker = &config.walker;
    if walker.max_files == 0 {
        return Err(ConfigError::Invalid("walker.max_files must be at least 1".into()));
    }
    if walker.concurrency == 0 {
        return Err(ConfigError::Invalid("walker.concurrency must be at least 1".into()));
    }
    if walker.max_file_size == 0 || walker.max_total_size == 0 {
        return Err(ConfigError::Invalid("walker size budgets must be positive".into()));
    }
    for pattern in &walker.excluded_paths {
        Glob::new(pattern).map_err(|e| {
            ConfigError::Invalid(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
        })?;
    }
    if let Some(command) = &config.lint.command {
        if command.is_empty() {
            return Err(ConfigError::Invalid("lint.command must not be empty".into()));
        }
    }
    Ok(())
}
