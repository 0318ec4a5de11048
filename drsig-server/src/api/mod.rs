//! HTTP API.
//!
//! # Endpoints
//!
//! - `GET /get-all-signal`: every activated event, tagged with its type
//! - `GET /get-dr-signal/{category}`: payloads of one category, optionally
//!   restricted to `?startdate=..&enddate=..`

mod events;

use crate::state::AppState;
use axum::Router;
use axum::routing::get;

/// Build the event listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get-all-signal", get(events::list_all_events))
        .route("/get-dr-signal/{category}", get(events::list_category_events))
}
