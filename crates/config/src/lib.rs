#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for hafiz
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/hafiz/config.toml)
//! - Environment variables
//! - CLI flags (applied by the caller last)
//!
//! It also loads the package catalog: the list of content packages that
//! can be installed, with their download URLs and expected contents.

pub mod catalog;
pub mod constants;
pub mod core;

pub use catalog::Catalog;
pub use crate::core::{InstallConfig, NetworkConfig, PathConfig};

use hafiz_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub install: InstallConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // HAFIZ_CONTENT_ROOT
        if let Ok(root) = std::env::var("HAFIZ_CONTENT_ROOT") {
            if root.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "HAFIZ_CONTENT_ROOT".to_string(),
                    value: root,
                }
                .into());
            }
            self.paths.content_root = Some(PathBuf::from(root));
        }

        // HAFIZ_TIMEOUT
        if let Ok(timeout) = std::env::var("HAFIZ_TIMEOUT") {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: "HAFIZ_TIMEOUT".to_string(),
                value: timeout,
            })?;
        }

        // HAFIZ_STALL_TIMEOUT
        if let Ok(stall) = std::env::var("HAFIZ_STALL_TIMEOUT") {
            self.network.stall_timeout = stall.parse().map_err(|_| ConfigError::InvalidValue {
                field: "HAFIZ_STALL_TIMEOUT".to_string(),
                value: stall,
            })?;
        }

        // HAFIZ_USER_AGENT
        if let Ok(agent) = std::env::var("HAFIZ_USER_AGENT") {
            self.network.user_agent = agent;
        }

        self.validate()
    }

    /// Reject values no install could work with
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |field: &str, value: String| -> Result<(), Error> {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                value,
            }
            .into())
        };

        if self.network.timeout == 0 {
            return invalid("network.timeout", "0".into());
        }
        if self.network.stall_timeout == 0 {
            return invalid("network.stall_timeout", "0".into());
        }
        if self.install.max_concurrent == 0 {
            return invalid("install.max_concurrent", "0".into());
        }
        if self.network.user_agent.trim().is_empty() {
            return invalid("network.user_agent", self.network.user_agent.clone());
        }
        Ok(())
    }

    /// Get the content root (with default)
    #[must_use]
    pub fn content_root(&self) -> PathBuf {
        self.paths.content_root.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(constants::APP_DIR)
                .join(constants::CONTENT_DIR)
        })
    }

    /// Get the catalog path (with default)
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.paths.catalog.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(constants::APP_DIR)
                .join(constants::CATALOG_FILE)
        })
    }

    #[must_use]
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.install.stale_after_hours.saturating_mul(3600))
    }
}
