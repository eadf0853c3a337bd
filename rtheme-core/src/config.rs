//! Configuration management for remote themes
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (RTHEME_*)
//! 3. Config file (~/.config/rtheme/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings for the remote fetcher
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Path to the git executable
    pub git_path: String,

    /// Upper bound on a single clone or rev-parse invocation
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Directory scratch checkouts are created under (defaults to the system temp dir)
    pub scratch_root: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            git_path: "git".to_string(),
            timeout: Duration::from_secs(300),
            scratch_root: None,
        }
    }
}

impl FetchConfig {
    /// Directory scratch checkouts are created under
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Settings for theme persistence
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Configured database path, or `~/.local/share/rtheme/themes.db`
    pub fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }

        dirs::data_dir()
            .map(|p| p.join("rtheme").join("themes.db"))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Fetcher configuration
    pub fetch: FetchConfig,

    /// Persistence configuration
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/rtheme/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rtheme").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - RTHEME_GIT_PATH: Path to git executable
    /// - RTHEME_FETCH_TIMEOUT_SECS: Fetch timeout in seconds
    /// - RTHEME_SCRATCH_ROOT: Directory for scratch checkouts
    /// - RTHEME_DB_PATH: Path to the theme database
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(git_path) = std::env::var("RTHEME_GIT_PATH") {
            self.fetch.git_path = git_path;
        }

        if let Ok(secs) = std::env::var("RTHEME_FETCH_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::Config(format!("RTHEME_FETCH_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            self.fetch.timeout = Duration::from_secs(secs);
        }

        if let Ok(root) = std::env::var("RTHEME_SCRATCH_ROOT") {
            self.fetch.scratch_root = Some(PathBuf::from(root));
        }

        if let Ok(path) = std::env::var("RTHEME_DB_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        git_path: Option<String>,
        db_path: Option<PathBuf>,
    ) -> Self {
        if let Some(path) = git_path {
            self.fetch.git_path = path;
        }

        if let Some(path) = db_path {
            self.store.path = Some(path);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(git_path: Option<String>, db_path: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(git_path, db_path))
    }
}
