use super::EventStore;
use crate::entities::{Category, Timeframe};
use drsig_sdk::objects::{EventListing, ListEventsQuery};
use drsig_sdk::timestamp::parse_timestamp;
use kanau::processor::Processor;
use thiserror::Error;

/// Errors that reject a listing query before it touches the store.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A timeframe was given without a category.
    #[error("a timeframe requires a category")]
    InvalidCombination,

    /// `startdate` / `enddate` is not `YYYY-MM-DDTHH:MM:SS`.
    #[error("malformed {field}: {value:?}")]
    MalformedTimestamp { field: &'static str, value: String },

    /// `startdate` is after `enddate`.
    #[error("startdate is after enddate")]
    InvalidTimeframe,
}

/// List activated events.
///
/// - no filter: every record that has a payload, tagged with its category
/// - category: payloads of that category, unclipped
/// - category and timeframe: payloads of records with both bounds whose
///   window overlaps the timeframe, series clipped to it
///
/// Results keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct ListEvents {
    pub category: Option<Category>,
    pub timeframe: Option<Timeframe>,
}

impl ListEvents {
    /// Build from API query parameters. A single date without its pair is
    /// ignored; a full timeframe without a category is rejected.
    pub fn from_query(
        category: Option<Category>,
        query: &ListEventsQuery,
    ) -> Result<Self, QueryError> {
        let timeframe = match query.timeframe() {
            Some((start, end)) => {
                let start = parse_timestamp(start).map_err(|_| QueryError::MalformedTimestamp {
                    field: "startdate",
                    value: start.to_owned(),
                })?;
                let end = parse_timestamp(end).map_err(|_| QueryError::MalformedTimestamp {
                    field: "enddate",
                    value: end.to_owned(),
                })?;
                Some(Timeframe::new(start, end).map_err(|_| QueryError::InvalidTimeframe)?)
            }
            None => None,
        };

        if timeframe.is_some() && category.is_none() {
            return Err(QueryError::InvalidCombination);
        }

        Ok(Self {
            category,
            timeframe,
        })
    }
}

impl Processor<ListEvents> for EventStore {
    type Output = EventListing;
    type Error = QueryError;

    #[tracing::instrument(skip_all, err, name = "Store:ListEvents")]
    async fn process(&self, query: ListEvents) -> Result<EventListing, QueryError> {
        let records = self.snapshot().await;

        let listing = match (query.category, query.timeframe) {
            (None, None) => EventListing::Tagged(
                records.iter().filter_map(|record| record.to_entry()).collect(),
            ),
            (Some(category), None) => EventListing::Payloads(
                records
                    .iter()
                    .filter(|record| record.category == category)
                    .map(|record| record.payload.as_ref().map(|p| p.to_wire()))
                    .collect(),
            ),
            (Some(category), Some(window)) => EventListing::Payloads(
                records
                    .iter()
                    .filter(|record| record.category == category)
                    .filter_map(|record| {
                        let bounds = record.bounds?;
                        window
                            .overlaps(&bounds)
                            .then(|| record.payload.as_ref().map(|p| p.clip(&window).to_wire()))
                    })
                    .collect(),
            ),
            (None, Some(_)) => return Err(QueryError::InvalidCombination),
        };

        Ok(listing)
    }
}
