//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use crate::store::generations;
use std::net::SocketAddr;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `listen_addr` is not a socket address
    /// - `upstream_origin` is not an http(s) URL
    /// - `generation` is not a usable generation name
    /// - a critical-path substring is blank
    /// - `task_db_path` sits inside `cache_dir` (reclamation would
    ///   delete it)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "listen_addr".into(),
                reason: format!("{:?} is not a socket address", self.listen_addr),
            });
        }

        if !self.upstream_origin.starts_with("http://") && !self.upstream_origin.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "upstream_origin".into(),
                reason: "must be an http:// or https:// origin".into(),
            });
        }

        generations::validate_name(&self.generation)
            .map_err(|e| ConfigError::Invalid { field: "generation".into(), reason: e.to_string() })?;

        if self.critical_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "critical_paths".into(),
                reason: "substrings must not be blank".into(),
            });
        }

        if self.task_db_path.parent() == Some(self.cache_dir.as_path()) {
            return Err(ConfigError::Invalid {
                field: "task_db_path".into(),
                reason: "must not live inside cache_dir".into(),
            });
        }

        if self.manifest.is_empty() {
            tracing::warn!("manifest is empty; nothing will be provisioned into fresh generations");
        }

        Ok(())
    }
}
