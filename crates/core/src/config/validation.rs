//! Configuration validation rules.

use crate::config::AppConfig;
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
    /// - `lookup_url` is not an http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `warning_page_url` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.lookup_url.starts_with("https://") || self.lookup_url.starts_with("http://")) {
            return Err(ConfigError::Invalid { field: "lookup_url".into(), reason: "must be an http(s) URL".into() });
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

        if self.warning_page_url.is_empty() {
            return Err(ConfigError::Invalid { field: "warning_page_url".into(), reason: "must not be empty".into() });
        }

        if self.safebrowsing_disabled {
            tracing::warn!("safebrowsing is disabled; lookups will be skipped");
        }

        Ok(())
    }
}
