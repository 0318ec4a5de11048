//! Event channel factories and handles.

use super::types::ActivatedEvent;
use tokio::sync::mpsc;

/// Default buffer size for event channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for ActivatedEvent events.
pub type ActivatedEventSender = mpsc::Sender<ActivatedEvent>;
/// Receiver handle for ActivatedEvent events.
pub type ActivatedEventReceiver = mpsc::Receiver<ActivatedEvent>;

/// Create a new ActivatedEvent channel.
///
/// The scheduler holds the sender; the push sink drains the receiver.
pub fn activated_event_channel() -> (ActivatedEventSender, ActivatedEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
