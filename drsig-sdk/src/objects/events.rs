//! Event listing payloads returned by the query API.

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

use super::category::Category;
use crate::timestamp::serde_timestamp;

/// One sample of a time-indexed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(with = "serde_timestamp")]
    pub timestamp: PrimitiveDateTime,
    pub value: f64,
}

/// Payload of an activated event.
///
/// Series are serialized as an array of `{timestamp, value}` objects in
/// chronological order. Anything else is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    Series(Vec<SeriesPoint>),
    Opaque(serde_json::Value),
}

/// An activated event tagged with its category, as returned by
/// `GET /get-all-signal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    #[serde(rename = "type")]
    pub category: Category,
    pub data: EventData,
}

/// Result of a listing query.
///
/// Unfiltered listings carry the category of every entry; listings for a
/// single category only carry the payloads, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventListing {
    Tagged(Vec<EventEntry>),
    Payloads(Vec<Option<EventData>>),
}

impl EventListing {
    pub fn len(&self) -> usize {
        match self {
            EventListing::Tagged(entries) => entries.len(),
            EventListing::Payloads(payloads) => payloads.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
