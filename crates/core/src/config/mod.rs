//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LOUPE_*)
//! 2. TOML config file (if LOUPE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{DEFAULT_COST_LIMIT, KeyStrategy, StorageRoots};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LOUPE_*)
/// 2. TOML config file (if LOUPE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root for the transient cache location.
    ///
    /// Set via LOUPE_CACHE_DIR. Defaults to `<platform cache dir>/loupe`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Root for the durable document location.
    ///
    /// Set via LOUPE_DOCUMENT_DIR. Defaults to `<platform document dir>/loupe`.
    #[serde(default)]
    pub document_dir: Option<PathBuf>,

    /// Memory tier cost ceiling, in bytes.
    ///
    /// Set via LOUPE_MEMORY_COST_LIMIT environment variable.
    #[serde(default = "default_memory_cost_limit")]
    pub memory_cost_limit: usize,

    /// How cache keys become filenames: "sanitized" or "hashed".
    ///
    /// Set via LOUPE_KEY_STRATEGY environment variable.
    #[serde(default)]
    pub key_strategy: KeyStrategy,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via LOUPE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via LOUPE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LOUPE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    ///
    /// Set via LOUPE_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_memory_cost_limit() -> usize {
    DEFAULT_COST_LIMIT
}

fn default_user_agent() -> String {
    "loupe/0.1".into()
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024 // 20MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            document_dir: None,
            memory_cost_limit: default_memory_cost_limit(),
            key_strategy: KeyStrategy::default(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Storage roots from the configured overrides, falling back to platform directories.
    pub fn storage_roots(&self) -> StorageRoots {
        StorageRoots::with_overrides(self.cache_dir.clone(), self.document_dir.clone())
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LOUPE_`
    /// 2. TOML file from `LOUPE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LOUPE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LOUPE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
