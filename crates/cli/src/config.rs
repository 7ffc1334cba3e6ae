//! User configuration for the Arazzo Studio CLI.
//!
//! A small JSON file in the standard configuration directory
//! (`~/.config/arazzo-studio/config.json` on most platforms). Every field is optional;
//! missing fields take their defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use arazzo_engine::{DocumentFormat, EngineConfig};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable allowing callers to override the configuration file path.
pub const CONFIG_PATH_ENV: &str = "ARAZZO_STUDIO_CONFIG";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Log level used when neither `RUST_LOG` nor the configuration sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Error surfaced when reading the configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to parse configuration {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Persisted CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Format used when printing an edited document to stdout.
    pub output_format: DocumentFormat,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub engine: EngineConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            output_format: DocumentFormat::Yaml,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl StudioConfig {
    /// Loads the configuration from `explicit_path`, or from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => load_from(&path),
            None => Ok(Self::default()),
        }
    }
}

/// Resolves the configuration path from the environment override or the config directory.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    config_dir().map(|directory| directory.join("arazzo-studio").join(CONFIG_FILE_NAME))
}

fn load_from(path: &Path) -> Result<StudioConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(data) => serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(StudioConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
