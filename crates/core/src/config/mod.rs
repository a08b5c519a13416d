//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OUTPOST_*)
//! 2. TOML config file (if OUTPOST_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OUTPOST_*)
/// 2. TOML config file (if OUTPOST_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the proxy listens on.
    ///
    /// Set via OUTPOST_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Origin the application is served from; every routed request is
    /// resolved against it.
    ///
    /// Set via OUTPOST_UPSTREAM_ORIGIN environment variable.
    #[serde(default = "default_upstream_origin")]
    pub upstream_origin: String,

    /// Directory holding the generation databases.
    ///
    /// Set via OUTPOST_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Name of the current store generation. Bumping this (together with
    /// the manifest) is the only supported way to trigger a cache
    /// refresh; names must never be reused.
    ///
    /// Set via OUTPOST_GENERATION environment variable.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Resources provisioned into a fresh generation, relative to the
    /// upstream origin unless absolute.
    ///
    /// Set via OUTPOST_MANIFEST environment variable.
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Path substrings marking a request as critical (network-first).
    ///
    /// Set via OUTPOST_CRITICAL_PATHS environment variable.
    #[serde(default = "default_critical_paths")]
    pub critical_paths: Vec<String>,

    /// Path to the task database. Kept outside the cache directory so
    /// task data survives generation reclamation.
    ///
    /// Set via OUTPOST_TASK_DB_PATH environment variable.
    #[serde(default = "default_task_db_path")]
    pub task_db_path: PathBuf,

    /// User-Agent string for upstream requests.
    ///
    /// Set via OUTPOST_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via OUTPOST_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via OUTPOST_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8787".into()
}

fn default_upstream_origin() -> String {
    "http://127.0.0.1:5173".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./outpost-cache")
}

fn default_generation() -> String {
    "task-manager-v1".into()
}

fn default_manifest() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/src/main.jsx",
        "/src/App.jsx",
        "/src/App.css",
        "/src/index.css",
        "/src/components/TaskCard.js",
        "/manifest.json",
        "/icon-192x192.png",
        "/icon-512x512.png",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css",
        "https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/js/bootstrap.bundle.min.js",
    ]
    .map(String::from)
    .to_vec()
}

fn default_critical_paths() -> Vec<String> {
    vec!["index.html".into(), "/api/".into()]
}

fn default_task_db_path() -> PathBuf {
    PathBuf::from("./tasks.db")
}

fn default_user_agent() -> String {
    "outpost/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            upstream_origin: default_upstream_origin(),
            cache_dir: default_cache_dir(),
            generation: default_generation(),
            manifest: default_manifest(),
            critical_paths: default_critical_paths(),
            task_db_path: default_task_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OUTPOST_`
    /// 2. TOML file from `OUTPOST_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("OUTPOST_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OUTPOST_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
