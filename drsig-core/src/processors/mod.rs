//! Processors of the activation pipeline.
//!
//! - `DirectoryPoller`: detects new descriptors, hands them to the scheduler
//! - `Decoder`: turns a raw descriptor into a time-scoped `EventRecord`
//! - `ActivationScheduler`: appends decoded records to the store at their
//!   notification instant, emits `ActivatedEvent`
//! - `PushSink`: receives `ActivatedEvent`, delivers it over HTTP
//!
//! The query side lives in [`crate::store`].

pub mod decoder;
pub mod directory_poller;
pub mod pricing;
pub mod push_sink;
pub mod scheduler;

pub use decoder::{DecodeError, DecodeRule, Decoder};
pub use directory_poller::{DirectoryPoller, InitError, PollError, PollReport};
pub use pricing::{HttpPricingEngine, PricingEngine, PricingError, UnconfiguredPricingEngine};
pub use push_sink::{PushError, PushSink};
pub use scheduler::{Activation, ActivationScheduler, NewDescriptor, PendingActivations};
