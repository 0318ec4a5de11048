//! Decode rules for the known categories.

use super::{DecodeError, DecodeRule, DecodedFields};
use crate::entities::{Category, Payload, RawDescriptor, TimeSeries, Timeframe};
use crate::processors::pricing::PricingEngine;
use async_trait::async_trait;
use drsig_sdk::timestamp::serde_timestamp;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use time::{Duration, PrimitiveDateTime};

fn fields<T: DeserializeOwned>(category: &Category, raw: &RawDescriptor) -> Result<T, DecodeError> {
    raw.fields().map_err(|source| DecodeError::Fields {
        category: category.clone(),
        source,
    })
}

/// Place `values` one step apart from the window start, refusing any value
/// that would land at or past the window end.
fn windowed_values(
    category: &Category,
    bounds: &Timeframe,
    step: Duration,
    values: Vec<f64>,
) -> Result<TimeSeries, DecodeError> {
    let slots = TimeSeries::slots(bounds, step);
    if values.len() > slots {
        return Err(DecodeError::SeriesOverrun {
            category: category.clone(),
            values: values.len(),
            slots,
        });
    }
    Ok(TimeSeries::from_values(bounds.start(), step, values))
}

fn series_fields(bounds: Timeframe, series: TimeSeries) -> DecodedFields {
    DecodedFields {
        bounds: Some(bounds),
        payload: Some(Payload::Series(series)),
    }
}

/// Descriptors whose payload lives under `data`.
#[derive(Debug, Deserialize)]
struct Nested<T> {
    data: T,
}

// ---------------------------------------------------------------------------
// Prices
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PriceFields {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "start-date", with = "serde_timestamp")]
    start: PrimitiveDateTime,
    #[serde(rename = "end-date", with = "serde_timestamp")]
    end: PrimitiveDateTime,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TariffReference {
    #[serde(rename = "tariff-json")]
    tariff: String,
}

/// Price signals.
///
/// - `price-tou`: `data` references a tariff structure, resolved by the
///   pricing engine.
/// - `price-rtp`: `data` is the raw price array, one value per step from
///   `start-date`.
///
/// Like every other rule, the window is sampled half-open: no point sits at
/// `end-date`.
pub struct PriceRule {
    pricing: Arc<dyn PricingEngine>,
}

impl PriceRule {
    pub const TIME_OF_USE: &'static str = "price-tou";
    pub const REAL_TIME: &'static str = "price-rtp";

    pub fn new(pricing: Arc<dyn PricingEngine>) -> Self {
        Self { pricing }
    }
}

#[async_trait]
impl DecodeRule for PriceRule {
    async fn decode(
        &self,
        category: &Category,
        raw: &RawDescriptor,
        step: Duration,
    ) -> Result<DecodedFields, DecodeError> {
        let price: PriceFields = fields(category, raw)?;
        let bounds = Timeframe::new(price.start, price.end)?;

        let series = match price.kind.as_str() {
            Self::TIME_OF_USE => {
                let reference: TariffReference = serde_json::from_value(price.data)
                    .map_err(|source| DecodeError::Fields {
                        category: category.clone(),
                        source,
                    })?;
                self.pricing
                    .resolve_tariff_series(&reference.tariff, bounds, step)
                    .await?
                    .restrict(&bounds)
            }
            Self::REAL_TIME => {
                let values: Vec<f64> = serde_json::from_value(price.data).map_err(|source| {
                    DecodeError::Fields {
                        category: category.clone(),
                        source,
                    }
                })?;
                windowed_values(category, &bounds, step, values)?
            }
            _ => return Err(DecodeError::UnsupportedPriceType(price.kind)),
        };

        Ok(series_fields(bounds, series))
    }
}

// ---------------------------------------------------------------------------
// Shed / limit
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WindowData {
    #[serde(rename = "start-date", with = "serde_timestamp")]
    start: PrimitiveDateTime,
    #[serde(rename = "end-date", with = "serde_timestamp")]
    end: PrimitiveDateTime,
    power: f64,
}

/// A single window holding a constant power level (load shed, load limit).
pub struct WindowRule;

#[async_trait]
impl DecodeRule for WindowRule {
    async fn decode(
        &self,
        category: &Category,
        raw: &RawDescriptor,
        step: Duration,
    ) -> Result<DecodedFields, DecodeError> {
        let Nested { data } = fields::<Nested<WindowData>>(category, raw)?;
        let bounds = Timeframe::new(data.start, data.end)?;
        let series = TimeSeries::constant(data.start, data.end, step, data.power);
        Ok(series_fields(bounds, series))
    }
}

// ---------------------------------------------------------------------------
// Shift
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ShiftData {
    #[serde(rename = "start-date-take", with = "serde_timestamp")]
    start_take: PrimitiveDateTime,
    #[serde(rename = "end-date-take", with = "serde_timestamp")]
    end_take: PrimitiveDateTime,
    #[serde(rename = "power-take")]
    power_take: f64,
    #[serde(rename = "start-date-relax", with = "serde_timestamp")]
    start_relax: PrimitiveDateTime,
    #[serde(rename = "end-date-relax", with = "serde_timestamp")]
    end_relax: PrimitiveDateTime,
    #[serde(rename = "power-relax")]
    power_relax: f64,
}

/// Load shift: a "take" window followed by a "relax" window, each with its
/// own power level. Bounds run from the take start to the relax end.
pub struct ShiftRule;

#[async_trait]
impl DecodeRule for ShiftRule {
    async fn decode(
        &self,
        category: &Category,
        raw: &RawDescriptor,
        step: Duration,
    ) -> Result<DecodedFields, DecodeError> {
        let Nested { data } = fields::<Nested<ShiftData>>(category, raw)?;
        Timeframe::new(data.start_take, data.end_take)?;
        Timeframe::new(data.start_relax, data.end_relax)?;
        let bounds = Timeframe::new(data.start_take, data.end_relax)?;

        let take = TimeSeries::constant(data.start_take, data.end_take, step, data.power_take);
        let relax = TimeSeries::constant(data.start_relax, data.end_relax, step, data.power_relax);
        Ok(series_fields(bounds, take.merge(relax)))
    }
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TrackData {
    #[serde(rename = "start-date", with = "serde_timestamp")]
    start: PrimitiveDateTime,
    #[serde(rename = "end-date", with = "serde_timestamp")]
    end: PrimitiveDateTime,
    profile: Vec<f64>,
}

/// Tracking profile: one value per step from the window start. A profile may
/// be shorter than the window but never longer.
pub struct TrackRule;

#[async_trait]
impl DecodeRule for TrackRule {
    async fn decode(
        &self,
        category: &Category,
        raw: &RawDescriptor,
        step: Duration,
    ) -> Result<DecodedFields, DecodeError> {
        let Nested { data } = fields::<Nested<TrackData>>(category, raw)?;
        let bounds = Timeframe::new(data.start, data.end)?;
        let series = windowed_values(category, &bounds, step, data.profile)?;
        Ok(series_fields(bounds, series))
    }
}
