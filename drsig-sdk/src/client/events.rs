//! Query API client (downstream consumer → DR signal server).

use reqwest::Client;
use time::PrimitiveDateTime;
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{Category, EventData, EventEntry, ListEventsQuery};
use crate::timestamp::format_timestamp;

/// Typed HTTP client for the read-only event listing endpoints.
#[derive(Debug, Clone)]
pub struct EventClient {
    http: Client,
    base_url: Url,
}

impl EventClient {
    /// Create a new `EventClient` for the server at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /get-all-signal`: every activated event that carries a payload.
    pub async fn list_all(&self) -> Result<Vec<EventEntry>, ClientError> {
        let url = self.base_url.join("/get-all-signal")?;
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// `GET /get-dr-signal/{category}`: payloads of one category, unclipped.
    pub async fn list_category(
        &self,
        category: &Category,
    ) -> Result<Vec<Option<EventData>>, ClientError> {
        self.get_category(category, &ListEventsQuery::default())
            .await
    }

    /// `GET /get-dr-signal/{category}?startdate&enddate`: payloads of one
    /// category overlapping the window, with series clipped to it.
    pub async fn list_category_between(
        &self,
        category: &Category,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<Vec<Option<EventData>>, ClientError> {
        let query = ListEventsQuery::between(format_timestamp(start)?, format_timestamp(end)?);
        self.get_category(category, &query).await
    }

    async fn get_category(
        &self,
        category: &Category,
        query: &ListEventsQuery,
    ) -> Result<Vec<Option<EventData>>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/get-dr-signal/{category}"))?;
        let resp = self.http.get(url).query(query).send().await?;
        parse_response(resp).await
    }
}
