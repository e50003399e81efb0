//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config <PATH>`)
//! 3. `APOD_*` environment variables (e.g. `APOD_API_KEY`, `APOD_CACHE_DIR`)
//! 4. CLI flags, applied by the caller
//!
//! # Example
//!
//! ```toml
//! api_key = "my-nasa-key"
//! cache_dir = "/home/me/Pictures/apod"
//! timeout_secs = 60
//! set_background = false
//! ```

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::apod::client::{DEFAULT_API_URL, DEMO_API_KEY};
use crate::cache::CacheLocation;

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "APOD_";

/// Name of the cache subdirectory under the platform cache dir.
const CACHE_SUBDIR: &str = "image_cache";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// APOD API endpoint.
    pub api_url: String,
    /// NASA API key.
    pub api_key: String,
    /// Image cache directory. `None` uses the platform cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Per-request network timeout in seconds. `0` disables it.
    pub timeout_secs: u64,
    /// Set the desktop background after a successful fetch.
    pub set_background: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: DEMO_API_KEY.to_string(),
            cache_dir: None,
            timeout_secs: 30,
            set_background: true,
        }
    }
}

impl Config {
    /// Load from the default config file, falling back to defaults on error.
    pub fn load() -> Self {
        match Self::default_config_path() {
            Some(path) => Self::load_from_path(path),
            None => {
                log::debug!("No platform config directory, using defaults");
                Self::from_figment(Self::figment(None)).unwrap_or_default()
            }
        }
    }

    /// Load from `path`, falling back to defaults if the file is invalid.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Ignoring invalid config {}: {:#}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Load from `path`, reporting parse errors.
    pub fn try_load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading config from {}", path.display());
        Self::from_figment(Self::figment(Some(path)))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Network timeout, if enabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Resolve where the image cache lives.
    pub fn cache_location(&self) -> Result<CacheLocation> {
        let dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => project_dirs()
                .map(|dirs| dirs.cache_dir().join(CACHE_SUBDIR))
                .ok_or_else(|| anyhow::anyhow!("Failed to determine platform cache directory"))?,
        };
        CacheLocation::new(&dir)
            .with_context(|| format!("Invalid cache directory: {}", dir.display()))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "apodcache", "apodcache")
}
