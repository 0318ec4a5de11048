use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use drsig_core::entities::Category;
use drsig_core::store::{ListEvents, QueryError};
use drsig_sdk::objects::ListEventsQuery;
use kanau::processor::Processor;

use crate::state::AppState;

/// `GET /get-all-signal`: every activated event with a payload.
///
/// A timeframe needs a category, so sending both dates here is rejected.
pub async fn list_all_events(
    state: State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, EventsApiError> {
    let listing = state
        .store
        .process(ListEvents::from_query(None, &query)?)
        .await?;
    Ok(Json(listing))
}

/// `GET /get-dr-signal/{category}`: payloads of one category.
///
/// With both `startdate` and `enddate`, only events overlapping that window
/// are returned and their series are clipped to it.
pub async fn list_category_events(
    state: State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<ListEventsQuery>,
) -> Result<impl IntoResponse, EventsApiError> {
    let category = Category::from_name(&category);
    let listing = state
        .store
        .process(ListEvents::from_query(Some(category), &query)?)
        .await?;
    Ok(Json(listing))
}

/// Errors that can occur in event listing handlers.
#[derive(Debug)]
pub struct EventsApiError(QueryError);

impl From<QueryError> for EventsApiError {
    fn from(e: QueryError) -> Self {
        Self(e)
    }
}

impl IntoResponse for EventsApiError {
    fn into_response(self) -> axum::response::Response {
        tracing::debug!(error = %self.0, "Rejected event query");
        (StatusCode::BAD_REQUEST, self.0.to_string()).into_response()
    }
}
