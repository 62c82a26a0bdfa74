//! Bootstrap configuration for the archive tools
//!
//! Configuration is read from `archive.toml` inside the project directory.
//! Every field is optional; a missing file yields the built-in defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (applied by the binaries)
//! 2. TOML configuration file
//! 3. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the configuration file inside a project directory
pub const CONFIG_FILE_NAME: &str = "archive.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative to the project directory or absolute)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Root directory of stored media files
    #[serde(default)]
    pub media_root: Option<PathBuf>,

    /// Import behaviour
    #[serde(default)]
    pub import: ImportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Import behaviour defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Username of the account revisions are recorded against
    #[serde(default = "default_username")]
    pub username: String,

    /// Replace files already attached to items
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            overwrite: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration with all paths made absolute
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub project_dir: PathBuf,
    pub database_path: PathBuf,
    pub media_root: PathBuf,
    pub username: String,
    pub overwrite: bool,
    pub log_level: String,
}

impl TomlConfig {
    /// Load `archive.toml` from a project directory
    ///
    /// A missing file is not an error: defaults are returned instead.
    pub fn load(project_dir: &Path) -> Result<Self> {
        if !project_dir.is_dir() {
            return Err(Error::Config(format!(
                "Project directory not found: {}",
                project_dir.display()
            )));
        }

        let config_path = project_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, project_dir.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: TomlConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Parse {} failed: {}", config_path.display(), e))
        })?;

        info!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    /// Resolve relative paths against the project directory
    pub fn resolve(self, project_dir: &Path) -> ResolvedConfig {
        let anchor = |path: Option<PathBuf>, default: &str| {
            let path = path.unwrap_or_else(|| PathBuf::from(default));
            if path.is_absolute() {
                path
            } else {
                project_dir.join(path)
            }
        };

        ResolvedConfig {
            project_dir: project_dir.to_path_buf(),
            database_path: anchor(self.database_path, "archive.db"),
            media_root: anchor(self.media_root, "media"),
            username: self.import.username,
            overwrite: self.import.overwrite,
            log_level: self.logging.level,
        }
    }
}
