//! Event type definitions.

use crate::entities::EventRecord;
use std::sync::Arc;
use uuid::Uuid;

/// Emitted by the scheduler when a record becomes visible in the store.
///
/// Carries the same shared record the store holds, so forwarding it to a
/// push sink does not copy the payload.
#[derive(Debug, Clone)]
pub struct ActivatedEvent {
    /// Correlates log lines of the scheduling and the activation.
    pub activation_id: Uuid,
    pub record: Arc<EventRecord>,
}
