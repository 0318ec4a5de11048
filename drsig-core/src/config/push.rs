//! Push sink configuration.

use drsig_sdk::objects::Category;
use std::collections::HashMap;
use url::Url;

/// Where activated events are forwarded, per category.
#[derive(Debug, Clone)]
pub struct PushSinkConfig {
    pub endpoints: HashMap<Category, Url>,
    /// Delivery attempts per event, including the first one.
    pub max_attempts: u32,
}

impl PushSinkConfig {
    pub fn endpoint_for(&self, category: &Category) -> Option<&Url> {
        self.endpoints.get(category)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl Default for PushSinkConfig {
    fn default() -> Self {
        Self {
            endpoints: HashMap::new(),
            max_attempts: 5,
        }
    }
}
