//! Configuration module for drsig-server.
//!
//! Handles loading configuration from the TOML file and CLI arguments, and
//! converting it into the runtime types of `drsig-core`.

pub mod file;

use crate::config::file::FileConfig;
use drsig_core::config::{PollerConfig, PricingConfig, PushSinkConfig};
use drsig_core::entities::Category;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Server section after overrides.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub poller: PollerConfig,
    pub pricing: PricingConfig,
    pub push: PushSinkConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
    directory_override: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(
        config_path: impl AsRef<Path>,
        listen_override: Option<SocketAddr>,
        directory_override: Option<PathBuf>,
    ) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
            directory_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        if let Some(directory) = &self.directory_override {
            file_config.poller.directory = directory.clone();
        }

        self.validate(&file_config)?;

        Ok(build_loaded_config(file_config))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.poller.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poller.interval_secs must be positive".to_string(),
            ));
        }
        if config.poller.series_step_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poller.series_step_secs must be positive".to_string(),
            ));
        }
        if config.push.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "push.max_attempts must be at least 1".to_string(),
            ));
        }
        for (name, url) in &config.push.endpoints {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::ValidationError(format!(
                    "push endpoint for {name} must be http(s), got {url}"
                )));
            }
            if !Category::from_name(name).is_known() {
                tracing::warn!(category = %name, "Push endpoint configured for unknown category");
            }
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    let series_step_secs = i64::try_from(file_config.poller.series_step_secs).unwrap_or(i64::MAX);

    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        poller: PollerConfig {
            directory: file_config.poller.directory,
            interval: std::time::Duration::from_secs(file_config.poller.interval_secs),
            series_step: time::Duration::seconds(series_step_secs),
        },
        pricing: PricingConfig {
            endpoint: file_config.pricing.endpoint,
            timeout: std::time::Duration::from_secs(file_config.pricing.timeout_secs),
        },
        push: PushSinkConfig {
            endpoints: file_config
                .push
                .endpoints
                .into_iter()
                .map(|(name, url)| (Category::from_name(&name), url))
                .collect(),
            max_attempts: file_config.push.max_attempts,
        },
    }
}
