//! Configuration validation rules.

use crate::config::AppConfig;
use thiserror::Error;

/// Upper bound on concurrent provider calls in one batch.
pub const MAX_SEARCH_CONCURRENCY: usize = 16;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_ttl_hours` or `pending_grace_hours` is 0
    /// - `search_concurrency` is 0 or above 16
    /// - `max_search_results` or `results_per_query` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl_hours == 0 {
            return Err(invalid("cache_ttl_hours", "must be greater than 0"));
        }
        if self.pending_grace_hours == 0 {
            return Err(invalid("pending_grace_hours", "must be greater than 0"));
        }

        if self.search_concurrency == 0 {
            return Err(invalid("search_concurrency", "must be greater than 0"));
        }
        if self.search_concurrency > MAX_SEARCH_CONCURRENCY {
            return Err(invalid("search_concurrency", "must not exceed 16"));
        }

        if self.max_search_results == 0 {
            return Err(invalid("max_search_results", "must be greater than 0"));
        }
        if self.results_per_query == 0 {
            return Err(invalid("results_per_query", "must be greater than 0"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = AppConfig { cache_ttl_hours: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("cache_ttl_hours"));
    }

    #[test]
    fn test_validate_zero_grace() {
        let config = AppConfig { pending_grace_hours: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("pending_grace_hours"));
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        let config = AppConfig { search_concurrency: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("search_concurrency"));

        let config = AppConfig { search_concurrency: 17, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("search_concurrency"));

        let config = AppConfig { search_concurrency: 16, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_result_limits() {
        let config = AppConfig { max_search_results: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("max_search_results"));

        let config = AppConfig { results_per_query: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("results_per_query"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("timeout_ms"));

        let config = AppConfig { timeout_ms: 301_000, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("timeout_ms"));

        let config = AppConfig { timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
        let config = AppConfig { timeout_ms: 300_000, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: "  ".into(), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("user_agent"));
    }
}
