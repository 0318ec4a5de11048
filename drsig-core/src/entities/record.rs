use drsig_sdk::objects::{Category, EventData, EventEntry};
use thiserror::Error;
use time::PrimitiveDateTime;

use super::series::TimeSeries;

/// A closed interval `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("window start {start} is after its end {end}")]
pub struct InvalidWindow {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl Timeframe {
    pub fn new(start: PrimitiveDateTime, end: PrimitiveDateTime) -> Result<Self, InvalidWindow> {
        if start > end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> PrimitiveDateTime {
        self.start
    }

    pub fn end(&self) -> PrimitiveDateTime {
        self.end
    }

    pub fn contains(&self, ts: PrimitiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Whether a record spanning `record` should be returned for a query
    /// over `self`: either end of the record lies inside the query window,
    /// or the record covers the whole window.
    pub fn overlaps(&self, record: &Timeframe) -> bool {
        self.contains(record.start)
            || self.contains(record.end)
            || (record.start <= self.start && record.end >= self.end)
    }
}

/// Payload carried by an activated event.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Series(TimeSeries),
    Opaque(serde_json::Value),
}

impl Payload {
    /// Restrict a series to `window`. Opaque payloads have no time index and
    /// are returned unchanged.
    pub fn clip(&self, window: &Timeframe) -> Payload {
        match self {
            Payload::Series(series) => Payload::Series(series.clip(window)),
            Payload::Opaque(value) => Payload::Opaque(value.clone()),
        }
    }

    pub fn to_wire(&self) -> EventData {
        match self {
            Payload::Series(series) => EventData::Series(series.to_wire()),
            Payload::Opaque(value) => EventData::Opaque(value.clone()),
        }
    }
}

/// A decoded demand-response event.
///
/// Records are immutable once built; a newer descriptor for the same window
/// produces a second record rather than replacing this one.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub category: Category,
    /// Instant at which the record becomes visible.
    pub notification: PrimitiveDateTime,
    /// `None` for categories that are not time-scoped.
    pub bounds: Option<Timeframe>,
    pub payload: Option<Payload>,
}

impl EventRecord {
    pub fn start(&self) -> Option<PrimitiveDateTime> {
        self.bounds.map(|b| b.start())
    }

    pub fn end(&self) -> Option<PrimitiveDateTime> {
        self.bounds.map(|b| b.end())
    }

    /// `{type, data}` form, if the record has a payload.
    pub fn to_entry(&self) -> Option<EventEntry> {
        self.payload.as_ref().map(|payload| EventEntry {
            category: self.category.clone(),
            data: payload.to_wire(),
        })
    }
}
