//! Pricing engine collaborator.
//!
//! Time-of-use descriptors only carry a reference to a tariff structure.
//! Turning that reference into a price series is the job of an external
//! pricing engine; this module defines the narrow interface the decoder
//! calls and an HTTP adapter for it.

use async_trait::async_trait;
use drsig_sdk::objects::SeriesPoint;
use drsig_sdk::timestamp::format_timestamp;
use std::sync::Arc;
use thiserror::Error;
use time::Duration;
use url::Url;

use crate::config::PricingConfig;
use crate::entities::{TimeSeries, Timeframe};

/// Errors reported by a pricing engine.
#[derive(Debug, Error)]
pub enum PricingError {
    /// No pricing engine is configured.
    #[error("no pricing engine configured")]
    NotConfigured,

    /// HTTP request error
    #[error("pricing request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine answered with a non-success status.
    #[error("pricing engine returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The engine URL could not be built.
    #[error("invalid pricing engine url: {0}")]
    Url(#[from] url::ParseError),

    /// A window bound could not be rendered for the request.
    #[error("timestamp format error: {0}")]
    Format(#[from] time::error::Format),
}

/// Resolves a tariff reference into a timestamp-indexed price series.
#[async_trait]
pub trait PricingEngine: Send + Sync {
    /// Price series for `tariff` over `window`, sampled every `step`.
    async fn resolve_tariff_series(
        &self,
        tariff: &str,
        window: Timeframe,
        step: Duration,
    ) -> Result<TimeSeries, PricingError>;
}

/// Stand-in used when no pricing endpoint is configured.
///
/// Every request fails, so tariff-based descriptors surface as decode
/// failures in the logs instead of halting the pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredPricingEngine;

#[async_trait]
impl PricingEngine for UnconfiguredPricingEngine {
    async fn resolve_tariff_series(
        &self,
        _tariff: &str,
        _window: Timeframe,
        _step: Duration,
    ) -> Result<TimeSeries, PricingError> {
        Err(PricingError::NotConfigured)
    }
}

/// Pricing engine reached over HTTP.
///
/// Issues `GET {endpoint}tariff-series?tariff&start&end&step_secs` and
/// expects a JSON array of `{timestamp, value}` points.
pub struct HttpPricingEngine {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl HttpPricingEngine {
    const SERIES_PATH: &'static str = "tariff-series";

    pub fn new(endpoint: Url, timeout: std::time::Duration) -> Self {
        Self {
            endpoint,
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Build the engine described by `config`.
    pub fn from_config(config: &PricingConfig) -> Arc<dyn PricingEngine> {
        match &config.endpoint {
            Some(endpoint) => Arc::new(Self::new(endpoint.clone(), config.timeout)),
            None => Arc::new(UnconfiguredPricingEngine),
        }
    }
}

#[async_trait]
impl PricingEngine for HttpPricingEngine {
    async fn resolve_tariff_series(
        &self,
        tariff: &str,
        window: Timeframe,
        step: Duration,
    ) -> Result<TimeSeries, PricingError> {
        let url = self.endpoint.join(Self::SERIES_PATH)?;
        let start = format_timestamp(window.start())?;
        let end = format_timestamp(window.end())?;
        let response = self
            .http_client
            .get(url)
            .query(&[
                ("tariff", tariff),
                ("start", start.as_str()),
                ("end", end.as_str()),
                ("step_secs", step.whole_seconds().to_string().as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PricingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let points: Vec<SeriesPoint> = response.json().await?;
        Ok(TimeSeries::from_points(
            step,
            points.into_iter().map(|p| (p.timestamp, p.value)),
        ))
    }
}
