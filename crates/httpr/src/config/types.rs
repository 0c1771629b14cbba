//! Configuration types
//!
//! Keys are kebab-case in YAML. Every field has a default, so a file only
//! needs the settings it changes.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::{BackoffKind, RetryPolicy, ShouldRetry, StandardRetry, StatusRetry};

/// Complete httpr configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttprConfig {
    /// Retry behavior
    #[serde(default)]
    pub retry: RetryConfig,

    /// Underlying HTTP client settings
    #[serde(default)]
    pub network: NetworkConfig,
}

impl HttprConfig {
    /// Parse a configuration from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.retry.to_policy()?;
        self.network.validate()
    }
}

/// Retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Retry at all; `false` sends every request exactly once
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Lower delay bound in milliseconds
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper delay bound in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Fraction of each delay to randomize, in [0, 1)
    #[serde(default = "default_jitter")]
    pub jitter: f64,

    /// Backoff strategy
    #[serde(default)]
    pub backoff: BackoffKind,

    /// Status codes to retry instead of the standard set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_statuses: Option<Vec<u16>>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_retries: default_max_retries(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
            backoff: BackoffKind::default(),
            retry_statuses: None,
        }
    }
}

impl RetryConfig {
    /// Build the retry policy these settings describe
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        if !self.enabled {
            return Ok(RetryPolicy::never());
        }

        let predicate: Arc<dyn ShouldRetry> = match &self.retry_statuses {
            Some(codes) => Arc::new(StatusRetry::new(codes.clone())),
            None => Arc::new(StandardRetry),
        };

        let policy = RetryPolicy {
            predicate: Some(predicate),
            backoff: Some(self.backoff.strategy()),
            max_retries: self.max_retries,
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        };
        policy.validate()?;

        Ok(policy)
    }
}

fn default_enabled() -> bool {
    true
}
fn default_max_retries() -> u32 {
    3
}
fn default_min_delay_ms() -> u64 {
    500
}
fn default_max_delay_ms() -> u64 {
    5000
}
fn default_jitter() -> f64 {
    0.2
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Whole-request timeout per attempt, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Connection establishment timeout, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.timeout_secs == Some(0) {
            return Err(Error::invalid_config("timeout-secs must be greater than 0"));
        }
        if self.connect_timeout_secs == Some(0) {
            return Err(Error::invalid_config(
                "connect-timeout-secs must be greater than 0",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::invalid_config("user-agent must not be empty"));
        }
        Ok(())
    }
}

fn default_user_agent() -> String {
    format!("httpr/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_standard_policy() {
        let policy = RetryConfig::default().to_policy().unwrap();
        let standard = RetryPolicy::standard();

        assert_eq!(policy.max_retries, standard.max_retries);
        assert_eq!(policy.min_delay, standard.min_delay);
        assert_eq!(policy.max_delay, standard.max_delay);
        assert_eq!(policy.jitter, standard.jitter);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = HttprConfig::from_yaml(
            r#"
retry:
  max-retries: 5
  backoff: linear
network:
  timeout-secs: 30
"#,
        )
        .unwrap();

        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff, BackoffKind::Linear);
        assert_eq!(config.retry.min_delay_ms, 500);
        assert!(config.retry.enabled);
        assert_eq!(config.network.timeout_secs, Some(30));
        assert!(config.network.user_agent.starts_with("httpr/"));
    }

    #[test]
    fn test_disabled_retry_is_never() {
        let config = RetryConfig {
            enabled: false,
            ..Default::default()
        };
        let policy = config.to_policy().unwrap();

        assert_eq!(policy.max_retries, 0);
        assert!(!policy.is_zero());
    }

    #[test]
    fn test_retry_statuses_override_standard_set() {
        let config = RetryConfig {
            retry_statuses: Some(vec![409]),
            ..Default::default()
        };
        let policy = config.to_policy().unwrap();

        let conflict = Ok(crate::Response::new(reqwest::StatusCode::CONFLICT, ""));
        let unavailable = Ok(crate::Response::new(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            "",
        ));
        assert!(policy.should_retry(&conflict));
        assert!(!policy.should_retry(&unavailable));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = HttprConfig::from_yaml("retry:\n  jitter: 1.5\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = HttprConfig::from_yaml("retry:\n  min-delay-ms: 10000\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));

        let err = HttprConfig::from_yaml("network:\n  timeout-secs: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_unknown_backoff_is_parse_error() {
        let err = HttprConfig::from_yaml("retry:\n  backoff: fibonacci\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }
}
