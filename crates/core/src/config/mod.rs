//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SBGUARD_*)
//! 2. TOML config file (if SBGUARD_CONFIG_FILE set)
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
/// 1. Environment variables (SBGUARD_*)
/// 2. TOML config file (if SBGUARD_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite key-value store holding the result cache and suspend state.
    ///
    /// Set via SBGUARD_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Short-hash lookup endpoint.
    ///
    /// Set via SBGUARD_LOOKUP_URL environment variable.
    #[serde(default = "default_lookup_url")]
    pub lookup_url: String,

    /// User-Agent string for lookup requests.
    ///
    /// Set via SBGUARD_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Lookup request timeout in milliseconds.
    ///
    /// Set via SBGUARD_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Initial value of the "safebrowsing disabled" setting.
    ///
    /// Set via SBGUARD_SAFEBROWSING_DISABLED environment variable.
    #[serde(default)]
    pub safebrowsing_disabled: bool,

    /// Warning page that blocked navigations are diverted to.
    ///
    /// Set via SBGUARD_WARNING_PAGE_URL environment variable.
    #[serde(default = "default_warning_page_url")]
    pub warning_page_url: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./sbguard.sqlite")
}

fn default_lookup_url() -> String {
    "https://sb.adtidy.org/safebrowsing-lookup-short-hash.html".into()
}

fn default_user_agent() -> String {
    "sbguard/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_warning_page_url() -> String {
    "pages/safebrowsing.html".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            lookup_url: default_lookup_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            safebrowsing_disabled: false,
            warning_page_url: default_warning_page_url(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SBGUARD_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SBGUARD_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
