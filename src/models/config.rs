//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root configuration file (`scan.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Engine defaults; run input keys override these
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if !(self.engine.request_timeout_secs > 0.0) {
            return Err(AppError::validation(
                "engine.request_timeout_secs must be > 0",
            ));
        }
        if !(1..=10).contains(&self.engine.concurrency) {
            return Err(AppError::validation(
                "engine.concurrency must be between 1 and 10",
            ));
        }
        if self.engine.snapshot_chars == 0 {
            return Err(AppError::validation("engine.snapshot_chars must be > 0"));
        }
        if self.engine.min_delay_hours < 0.0 {
            return Err(AppError::validation("engine.min_delay_hours must be >= 0"));
        }
        if self.engine.incident_prefix.trim().is_empty() {
            return Err(AppError::validation("engine.incident_prefix is empty"));
        }
        if self.engine.delay_patterns.is_empty() {
            return Err(AppError::validation("No delay patterns defined"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Maximum redirects followed per request
    #[serde(default = "defaults::max_redirects")]
    pub max_redirects: usize,

    /// Idle keep-alive connections kept per host
    #[serde(default = "defaults::pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            max_redirects: defaults::max_redirects(),
            pool_max_idle_per_host: defaults::pool_max_idle_per_host(),
        }
    }
}

/// Engine defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay hours used when neither an explicit value nor timestamps exist
    #[serde(default = "defaults::default_delay_hours")]
    pub default_delay_hours: f64,

    /// Minimum delay hours for an incident to be emitted
    #[serde(default = "defaults::min_delay_hours")]
    pub min_delay_hours: f64,

    /// Character budget of the context snippet
    #[serde(default = "defaults::snapshot_chars")]
    pub snapshot_chars: usize,

    /// Label written into the `source` field of incidents
    #[serde(default = "defaults::source_label")]
    pub source_label: String,

    /// Default carrier status code
    #[serde(default = "defaults::carrier_status_code")]
    pub carrier_status_code: String,

    /// Prefix of derived incident identifiers
    #[serde(default = "defaults::incident_prefix")]
    pub incident_prefix: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::request_timeout_secs")]
    pub request_timeout_secs: f64,

    /// Sources fetched at once
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Patterns indicating an active delay
    #[serde(default = "defaults::delay_patterns")]
    pub delay_patterns: Vec<String>,

    /// Patterns suppressing an incident
    #[serde(default = "defaults::ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub request_headers: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_delay_hours: defaults::default_delay_hours(),
            min_delay_hours: defaults::min_delay_hours(),
            snapshot_chars: defaults::snapshot_chars(),
            source_label: defaults::source_label(),
            carrier_status_code: defaults::carrier_status_code(),
            incident_prefix: defaults::incident_prefix(),
            request_timeout_secs: defaults::request_timeout_secs(),
            concurrency: defaults::concurrency(),
            delay_patterns: defaults::delay_patterns(),
            ignore_patterns: defaults::ignore_patterns(),
            request_headers: BTreeMap::new(),
        }
    }
}

pub(crate) mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; delay-scan/0.1)".into()
    }
    pub fn max_redirects() -> usize {
        10
    }
    pub fn pool_max_idle_per_host() -> usize {
        5
    }

    // Engine defaults
    pub fn default_delay_hours() -> f64 {
        48.0
    }
    pub fn min_delay_hours() -> f64 {
        24.0
    }
    pub fn snapshot_chars() -> usize {
        420
    }
    pub fn source_label() -> String {
        "delay-scan#carrier-delay-scan".into()
    }
    pub fn carrier_status_code() -> String {
        "IN_TRANSIT_DELAYED".into()
    }
    pub fn incident_prefix() -> String {
        "DELAY".into()
    }
    pub fn request_timeout_secs() -> f64 {
        12.0
    }
    pub fn concurrency() -> usize {
        4
    }
    pub fn delay_patterns() -> Vec<String> {
        vec![
            r"\b(delay(ed)?|exception|service alert|operational issue)\b".into(),
            r"\b(weather|storm|backlog)\b".into(),
        ]
    }
    pub fn ignore_patterns() -> Vec<String> {
        vec![
            r"\b(resolved|back to normal|cleared)\b".into(),
            r"\b(delivered|delivery complete)\b".into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_concurrency() {
        let mut config = Config::default();
        config.engine.concurrency = 0;
        assert!(config.validate().is_err());
        config.engine.concurrency = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_timeout() {
        let mut config = Config::default();
        config.engine.request_timeout_secs = 0.0;
        assert!(config.validate().is_err());
        config.engine.request_timeout_secs = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            min_delay_hours = 6.0
            concurrency = 8

            [engine.request_headers]
            Accept = "text/html"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.min_delay_hours, 6.0);
        assert_eq!(config.engine.concurrency, 8);
        assert_eq!(config.engine.snapshot_chars, 420);
        assert_eq!(config.engine.delay_patterns.len(), 2);
        assert_eq!(
            config.engine.request_headers.get("Accept").map(String::as_str),
            Some("text/html")
        );
        assert_eq!(config.http.max_redirects, 10);
    }

    #[test]
    fn load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/scan.toml");
        assert_eq!(config.engine.concurrency, 4);
    }
}
