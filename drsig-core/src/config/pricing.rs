//! Pricing engine configuration.

use url::Url;

/// Location of the external pricing engine.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Base URL of the engine. Tariff-based price descriptors fail to decode
    /// when this is `None`.
    pub endpoint: Option<Url>,
    /// Per-request timeout.
    pub timeout: std::time::Duration,
}
