//! Application state shared across all request handlers.

use drsig_core::processors::PendingActivations;
use drsig_core::store::EventStore;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Activated events.
    pub store: EventStore,
    /// Deferred activations not yet due.
    pub pending: PendingActivations,
}

impl AppState {
    pub fn new(store: EventStore, pending: PendingActivations) -> Self {
        Self { store, pending }
    }
}
