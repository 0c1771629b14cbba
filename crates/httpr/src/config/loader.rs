//! Layered configuration loader
//!
//! Loads configuration with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. YAML file, if one is configured and exists
//! 3. Environment variables (HTTPR_* prefix)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::HttprConfig;
use crate::error::{Error, Result};

/// Configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader using defaults and environment variables only
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader that also reads a YAML file
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Get the configured file path
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load and validate the configuration
    pub fn load(&self) -> Result<HttprConfig> {
        let mut config = HttprConfig::default();

        if let Some(path) = &self.path {
            if path.exists() {
                config = Self::load_yaml_file(path)?;
            } else {
                debug!(path = %path.display(), "Config file not found, using defaults");
            }
        }

        config = Self::apply_env_overrides(config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_yaml_file(path: &Path) -> Result<HttprConfig> {
        let content = fs::read_to_string(path)?;
        let config: HttprConfig = serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn apply_env_overrides(mut config: HttprConfig) -> Result<HttprConfig> {
        // Retry
        if let Ok(val) = env::var("HTTPR_RETRY_ENABLED") {
            config.retry.enabled = val.parse().map_err(|_| {
                Error::invalid_config("HTTPR_RETRY_ENABLED must be true or false")
            })?;
        }

        if let Ok(val) = env::var("HTTPR_MAX_RETRIES") {
            config.retry.max_retries = val
                .parse()
                .map_err(|_| Error::invalid_config("HTTPR_MAX_RETRIES must be a valid number"))?;
        }

        if let Ok(val) = env::var("HTTPR_MIN_DELAY_MS") {
            config.retry.min_delay_ms = val
                .parse()
                .map_err(|_| Error::invalid_config("HTTPR_MIN_DELAY_MS must be a valid number"))?;
        }

        if let Ok(val) = env::var("HTTPR_MAX_DELAY_MS") {
            config.retry.max_delay_ms = val
                .parse()
                .map_err(|_| Error::invalid_config("HTTPR_MAX_DELAY_MS must be a valid number"))?;
        }

        if let Ok(val) = env::var("HTTPR_JITTER") {
            config.retry.jitter = val
                .parse()
                .map_err(|_| Error::invalid_config("HTTPR_JITTER must be a valid number"))?;
        }

        // Network
        if let Ok(val) = env::var("HTTPR_TIMEOUT_SECS") {
            config.network.timeout_secs = Some(val.parse().map_err(|_| {
                Error::invalid_config("HTTPR_TIMEOUT_SECS must be a valid number")
            })?);
        }

        if let Ok(val) = env::var("HTTPR_CONNECT_TIMEOUT_SECS") {
            config.network.connect_timeout_secs = Some(val.parse().map_err(|_| {
                Error::invalid_config("HTTPR_CONNECT_TIMEOUT_SECS must be a valid number")
            })?);
        }

        if let Ok(val) = env::var("HTTPR_USER_AGENT") {
            config.network.user_agent = val;
        }

        Ok(config)
    }
}
