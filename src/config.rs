//! Configuration file handling for hookgen.
//!
//! Loads configuration from `hookgen.toml` in the working directory or a
//! custom path. Credentials are never read from the config file; they come
//! from the environment only.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default input directory when neither CLI nor config specify one.
pub const DEFAULT_INPUT_DIR: &str = "base-image";

/// Default output directory when neither CLI nor config specify one.
pub const DEFAULT_OUTPUT_DIR: &str = "output-videos";

/// Configuration file structure for hookgen.
/// Loaded from ./hookgen.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct PathsConfig {
    /// Directory scanned for input images.
    pub input_dir: Option<PathBuf>,
    /// Directory generated videos are written to.
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GenerationConfig {
    /// Seconds between status polls.
    pub poll_interval_secs: Option<u64>,
    /// Maximum number of status polls per task.
    pub poll_max_attempts: Option<u32>,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

fn default_path() -> PathBuf {
    PathBuf::from("hookgen.toml")
}

impl Config {
    /// Load configuration from the default path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::parse_file(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from an explicitly requested path.
    /// Unlike [`load`](Self::load), a missing file is an error here.
    pub fn load_from_explicit(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        Self::parse_file(&path)
    }

    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
