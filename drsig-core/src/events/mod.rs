//! Activation events.
//!
//! # Event Flow
//!
//! 1. `DirectoryPoller` finds new descriptors -> `ActivationScheduler`
//! 2. `ActivationScheduler` appends the record to the `EventStore` once due
//!    and emits `ActivatedEvent`
//! 3. `PushSink` forwards `ActivatedEvent` to the configured endpoint
//!
//! Emitting is best effort: when no push sink is running the scheduler
//! holds no sender and the store stays the only consumer.

pub mod channels;
pub mod types;

pub use channels::{
    ActivatedEventReceiver, ActivatedEventSender, DEFAULT_CHANNEL_BUFFER, activated_event_channel,
};
pub use types::ActivatedEvent;
