//! Range checks for loaded `AppConfig` values.
//!
//! Fetch limits are bounded so a bad env var cannot disable them; the
//! memory ceiling only has to be non-zero.

use crate::config::AppConfig;
use thiserror::Error;

const MAX_FETCH_BYTES: usize = 200 * 1024 * 1024;

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
    /// - `memory_cost_limit` is 0
    /// - `max_bytes` is 0 or exceeds 200MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_redirects` exceeds 20
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_cost_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "memory_cost_limit".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > MAX_FETCH_BYTES {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 200MB".into() });
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

        if self.max_redirects > 20 {
            return Err(ConfigError::Invalid { field: "max_redirects".into(), reason: "must not exceed 20".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.memory_cost_limit < self.max_bytes {
            tracing::warn!(
                memory_cost_limit = self.memory_cost_limit,
                max_bytes = self.max_bytes,
                "memory_cost_limit is below max_bytes; large resources will only be cached on disk"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_memory_cost_limit_zero() {
        let config = AppConfig { memory_cost_limit: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "memory_cost_limit"));
    }

    #[test]
    fn test_validate_max_bytes_zero() {
        let config = AppConfig { max_bytes: 0, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_max_bytes_exceeds_limit() {
        let config = AppConfig { max_bytes: 201 * 1024 * 1024, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_bytes"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() }; // 5min 1sec
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_too_many_redirects() {
        let config = AppConfig { max_redirects: 21, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "max_redirects"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { memory_cost_limit: 1, max_bytes: 1, timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_values() {
        let config =
            AppConfig { max_bytes: MAX_FETCH_BYTES, timeout_ms: 300_000, max_redirects: 20, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
