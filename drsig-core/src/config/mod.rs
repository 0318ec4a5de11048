//! Configuration types for the DR signal server.
//!
//! These types represent the validated runtime configuration. The actual
//! config loading/parsing is handled by the server crate.

mod config_store;
mod poller;
mod pricing;
mod push;

pub use config_store::{ConfigStore, ConfigWatcher};
pub use poller::PollerConfig;
pub use pricing::PricingConfig;
pub use push::PushSinkConfig;
