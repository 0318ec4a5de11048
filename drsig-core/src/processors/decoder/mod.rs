//! Event decoder.
//!
//! Turns a raw descriptor of a given category into an [`EventRecord`].
//! Category-specific work is done by [`DecodeRule`]s looked up in a
//! registry; categories without a rule decode into a record with neither
//! bounds nor payload, so they remain visible in logs and listings.

mod rules;

pub use rules::{PriceRule, ShiftRule, TrackRule, WindowRule};

use crate::entities::{Category, EventRecord, InvalidWindow, Payload, RawDescriptor, Timeframe};
use crate::processors::pricing::{PricingEngine, PricingError};
use async_trait::async_trait;
use drsig_sdk::timestamp::parse_timestamp;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use time::{Duration, PrimitiveDateTime};

/// Field holding the instant at which a descriptor becomes visible.
pub const NOTIFICATION_FIELD: &str = "notification-date";

/// Errors that can occur while decoding a descriptor.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// `notification-date` is missing or not `YYYY-MM-DDTHH:MM:SS`.
    #[error("malformed notification timestamp: {0}")]
    MalformedTimestamp(String),

    /// Category-specific fields are missing or have the wrong shape.
    #[error("malformed {category} descriptor: {source}")]
    Fields {
        category: Category,
        source: serde_json::Error,
    },

    /// A window ends before it starts.
    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),

    /// Price descriptor with a `type` other than `price-tou` / `price-rtp`.
    #[error("unsupported price type: {0}")]
    UnsupportedPriceType(String),

    /// A raw series holds more values than its window has steps.
    #[error("{category} series has {values} values but its window holds {slots} steps")]
    SeriesOverrun {
        category: Category,
        values: usize,
        slots: usize,
    },

    /// The pricing engine could not resolve the tariff.
    #[error("pricing engine failure: {0}")]
    Pricing(#[from] PricingError),
}

/// Bounds and payload extracted by a [`DecodeRule`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFields {
    pub bounds: Option<Timeframe>,
    pub payload: Option<Payload>,
}

/// Decoding logic for one category.
#[async_trait]
pub trait DecodeRule: Send + Sync {
    /// Extract bounds and payload, sampling series every `step`.
    async fn decode(
        &self,
        category: &Category,
        raw: &RawDescriptor,
        step: Duration,
    ) -> Result<DecodedFields, DecodeError>;
}

/// Registry of decode rules plus the series step shared by all of them.
pub struct Decoder {
    step: Duration,
    rules: HashMap<Category, Arc<dyn DecodeRule>>,
}

impl Decoder {
    /// A decoder with no rules: every category decodes as unknown.
    pub fn empty(step: Duration) -> Self {
        Self {
            step,
            rules: HashMap::new(),
        }
    }

    /// A decoder with rules for every known category.
    pub fn new(step: Duration, pricing: Arc<dyn PricingEngine>) -> Self {
        let window: Arc<dyn DecodeRule> = Arc::new(WindowRule);
        Self::empty(step)
            .register(Category::Prices, Arc::new(PriceRule::new(pricing)))
            .register(Category::Shed, Arc::clone(&window))
            .register(Category::Limit, window)
            .register(Category::Shift, Arc::new(ShiftRule))
            .register(Category::Track, Arc::new(TrackRule))
    }

    /// Register (or replace) the rule for `category`.
    pub fn register(mut self, category: Category, rule: Arc<dyn DecodeRule>) -> Self {
        self.rules.insert(category, rule);
        self
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Decode `raw` into its notification instant and record.
    pub async fn decode(
        &self,
        category: &Category,
        raw: &RawDescriptor,
    ) -> Result<(PrimitiveDateTime, EventRecord), DecodeError> {
        let notification = notification_time(raw)?;

        let fields = match self.rules.get(category) {
            Some(rule) => rule.decode(category, raw, self.step).await?,
            None => DecodedFields {
                bounds: None,
                payload: None,
            },
        };

        Ok((
            notification,
            EventRecord {
                category: category.clone(),
                notification,
                bounds: fields.bounds,
                payload: fields.payload,
            },
        ))
    }
}

fn notification_time(raw: &RawDescriptor) -> Result<PrimitiveDateTime, DecodeError> {
    let Some(value) = raw.get(NOTIFICATION_FIELD) else {
        return Err(DecodeError::MalformedTimestamp(format!(
            "missing `{NOTIFICATION_FIELD}`"
        )));
    };
    let Some(text) = value.as_str() else {
        return Err(DecodeError::MalformedTimestamp(format!(
            "`{NOTIFICATION_FIELD}` is not a string: {value}"
        )));
    };
    parse_timestamp(text).map_err(|e| DecodeError::MalformedTimestamp(format!("{text:?}: {e}")))
}
