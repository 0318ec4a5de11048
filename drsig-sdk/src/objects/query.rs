use serde::{Deserialize, Serialize};

/// Query parameters accepted by the listing endpoints.
///
/// Dates use the descriptor timestamp format. A timeframe only applies when
/// both ends are given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enddate: Option<String>,
}

impl ListEventsQuery {
    pub fn between(startdate: impl Into<String>, enddate: impl Into<String>) -> Self {
        Self {
            startdate: Some(startdate.into()),
            enddate: Some(enddate.into()),
        }
    }

    /// Both ends of the timeframe, if both are present.
    pub fn timeframe(&self) -> Option<(&str, &str)> {
        match (&self.startdate, &self.enddate) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }
}
