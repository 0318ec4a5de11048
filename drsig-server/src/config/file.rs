//! TOML file configuration structures.
//!
//! These structs directly map to the `drsig-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub push: PushConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Watched directory section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Directory holding one `<category>.json` file per category.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Seconds between two scans.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Step of decoded time series, in seconds.
    #[serde(default = "default_series_step_secs")]
    pub series_step_secs: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            interval_secs: default_interval_secs(),
            series_step_secs: default_series_step_secs(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./dr-custom-data")
}

fn default_interval_secs() -> u64 {
    10
}

fn default_series_step_secs() -> u64 {
    3600
}

/// External pricing engine section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Base URL of the engine. Without it, tariff-based price descriptors
    /// fail to decode.
    #[serde(default)]
    pub endpoint: Option<Url>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Push sink section. Keys of `endpoints` are category names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub endpoints: HashMap<String, Url>,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            endpoints: HashMap::new(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[poller]
directory = "/var/lib/drsig"
interval_secs = 5
series_step_secs = 900

[pricing]
endpoint = "http://127.0.0.1:5000/"
timeout_secs = 10

[push]
max_attempts = 3

[push.endpoints]
dr_shed = "http://127.0.0.1:5000/dr/shed"
dr_prices = "http://127.0.0.1:5000/dr/prices"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.poller.directory, PathBuf::from("/var/lib/drsig"));
        assert_eq!(config.poller.series_step_secs, 900);
        assert_eq!(
            config.pricing.endpoint.as_ref().map(Url::as_str),
            Some("http://127.0.0.1:5000/")
        );
        assert_eq!(config.push.max_attempts, 3);
        assert_eq!(config.push.endpoints.len(), 2);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.poller.directory, PathBuf::from("./dr-custom-data"));
        assert_eq!(config.poller.interval_secs, 10);
        assert_eq!(config.poller.series_step_secs, 3600);
        assert!(config.pricing.endpoint.is_none());
        assert_eq!(config.push.max_attempts, 5);
        assert!(config.push.endpoints.is_empty());
    }
}
