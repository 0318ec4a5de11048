//! ActivationScheduler processor.
//!
//! The ActivationScheduler is responsible for:
//! - Decoding each newly seen descriptor
//! - Computing the delay until its notification instant
//! - Appending the record to the `EventStore` once that instant is reached,
//!   immediately if it already passed
//! - Emitting `ActivatedEvent` for the push sink, if one is attached
//!
//! Deferred activations are independent fire-once tasks. They are never
//! joined or cancelled; after shutdown they land in a closed store and are
//! dropped there.

use crate::entities::{Category, EventRecord, RawDescriptor};
use crate::events::{ActivatedEvent, ActivatedEventSender};
use crate::processors::decoder::{DecodeError, Decoder};
use crate::store::EventStore;
use kanau::processor::Processor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A descriptor that appeared in a watched file.
#[derive(Debug, Clone)]
pub struct NewDescriptor {
    pub category: Category,
    pub raw: RawDescriptor,
}

/// How a scheduled descriptor will become visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Already appended to the store.
    Immediate { id: Uuid },
    /// Will be appended once `delay` has elapsed.
    Deferred { id: Uuid, delay: std::time::Duration },
}

impl Activation {
    pub fn id(&self) -> Uuid {
        match self {
            Activation::Immediate { id } | Activation::Deferred { id, .. } => *id,
        }
    }
}

/// Count of activations waiting for their notification instant.
#[derive(Debug, Clone, Default)]
pub struct PendingActivations(Arc<AtomicUsize>);

impl PendingActivations {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    fn decrement(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Delay between `now` and `notification`, zero if it already passed.
///
/// Notification timestamps carry no offset and are read as UTC.
pub fn activation_delay(
    notification: PrimitiveDateTime,
    now: OffsetDateTime,
) -> std::time::Duration {
    let remaining = notification.assume_utc() - now;
    std::time::Duration::try_from(remaining).unwrap_or(std::time::Duration::ZERO)
}

/// ActivationScheduler defers the visibility of decoded records.
#[derive(Clone)]
pub struct ActivationScheduler {
    decoder: Arc<Decoder>,
    store: EventStore,
    activated_tx: Option<ActivatedEventSender>,
    pending: PendingActivations,
}

impl ActivationScheduler {
    pub fn new(decoder: Arc<Decoder>, store: EventStore) -> Self {
        Self {
            decoder,
            store,
            activated_tx: None,
            pending: PendingActivations::default(),
        }
    }

    /// Also emit every activation on `activated_tx`.
    pub fn with_activation_sink(mut self, activated_tx: ActivatedEventSender) -> Self {
        self.activated_tx = Some(activated_tx);
        self
    }

    pub fn pending(&self) -> PendingActivations {
        self.pending.clone()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Decode `raw` and arrange for it to become visible at its
    /// notification instant. Returns without waiting for the activation.
    pub async fn schedule(
        &self,
        category: Category,
        raw: RawDescriptor,
    ) -> Result<Activation, DecodeError> {
        self.process(NewDescriptor { category, raw }).await
    }

    fn spawn_deferred(&self, id: Uuid, delay: std::time::Duration, record: Arc<EventRecord>) {
        let store = self.store.clone();
        let activated_tx = self.activated_tx.clone();
        let pending = self.pending.clone();

        pending.increment();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            activate(&store, activated_tx.as_ref(), id, record).await;
            pending.decrement();
        });
    }
}

async fn activate(
    store: &EventStore,
    activated_tx: Option<&ActivatedEventSender>,
    activation_id: Uuid,
    record: Arc<EventRecord>,
) {
    if !store.append(Arc::clone(&record)).await {
        return;
    }
    debug!(%activation_id, category = %record.category, "Event activated");

    let Some(tx) = activated_tx else { return };
    match tx.try_send(ActivatedEvent {
        activation_id,
        record,
    }) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => warn!(
            %activation_id,
            category = %event.record.category,
            "Activation channel full, event not forwarded"
        ),
        Err(TrySendError::Closed(_)) => {
            debug!(%activation_id, "Activation channel closed");
        }
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementation
// ---------------------------------------------------------------------------

impl Processor<NewDescriptor> for ActivationScheduler {
    type Output = Activation;
    type Error = DecodeError;

    async fn process(&self, descriptor: NewDescriptor) -> Result<Activation, DecodeError> {
        let (notification, record) = self
            .decoder
            .decode(&descriptor.category, &descriptor.raw)
            .await?;
        let record = Arc::new(record);
        let id = Uuid::now_v7();
        let delay = activation_delay(notification, OffsetDateTime::now_utc());

        info!(
            activation_id = %id,
            category = %descriptor.category,
            %notification,
            delay_secs = delay.as_secs(),
            "Scheduling event"
        );

        if delay.is_zero() {
            activate(&self.store, self.activated_tx.as_ref(), id, record).await;
            Ok(Activation::Immediate { id })
        } else {
            self.spawn_deferred(id, delay, record);
            Ok(Activation::Deferred { id, delay })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::activated_event_channel;
    use crate::processors::pricing::UnconfiguredPricingEngine;
    use drsig_sdk::timestamp::format_timestamp;
    use serde_json::json;
    use std::time::Duration as StdDuration;
    use time::Duration;
    use time::macros::datetime;

    fn scheduler() -> ActivationScheduler {
        let decoder = Decoder::new(Duration::hours(1), Arc::new(UnconfiguredPricingEngine));
        ActivationScheduler::new(Arc::new(decoder), EventStore::new())
    }

    fn shed(notification: &str) -> RawDescriptor {
        RawDescriptor::new(json!({
            "notification-date": notification,
            "data": {
                "start-date": "2024-01-01T01:00:00",
                "end-date": "2024-01-01T03:00:00",
                "power": 5
            }
        }))
    }

    fn in_future(secs: i64) -> String {
        let at = OffsetDateTime::now_utc() + Duration::seconds(secs);
        format_timestamp(PrimitiveDateTime::new(at.date(), at.time())).unwrap()
    }

    #[test]
    fn test_activation_delay() {
        let now = datetime!(2024-01-01 12:00 UTC);
        assert_eq!(
            activation_delay(datetime!(2024-01-01 12:01), now),
            StdDuration::from_secs(60)
        );
        assert_eq!(activation_delay(datetime!(2024-01-01 11:00), now), StdDuration::ZERO);
        assert_eq!(activation_delay(datetime!(2024-01-01 12:00), now), StdDuration::ZERO);
    }

    #[tokio::test]
    async fn test_past_notification_is_visible_immediately() {
        let scheduler = scheduler();
        let activation = scheduler
            .schedule(Category::Shed, shed("2024-01-01T00:00:00"))
            .await
            .unwrap();

        assert!(matches!(activation, Activation::Immediate { .. }));
        assert_eq!(scheduler.store().len().await, 1);
        assert_eq!(scheduler.pending().get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_future_notification_waits_for_its_instant() {
        let scheduler = scheduler();
        let activation = scheduler
            .schedule(Category::Shed, shed(&in_future(60)))
            .await
            .unwrap();

        let Activation::Deferred { delay, .. } = activation else {
            panic!("expected deferred activation, got {activation:?}");
        };
        assert!(delay <= StdDuration::from_secs(60));
        assert!(delay > StdDuration::from_secs(58));
        assert_eq!(scheduler.pending().get(), 1);

        tokio::time::sleep(StdDuration::from_secs(30)).await;
        assert!(scheduler.store().is_empty().await);

        tokio::time::sleep(StdDuration::from_secs(31)).await;
        assert_eq!(scheduler.store().len().await, 1);
        assert_eq!(scheduler.pending().get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_activation_after_close_is_dropped() {
        let scheduler = scheduler();
        scheduler
            .schedule(Category::Shed, shed(&in_future(10)))
            .await
            .unwrap();
        scheduler.store().close();

        tokio::time::sleep(StdDuration::from_secs(11)).await;
        assert!(scheduler.store().is_empty().await);
        assert_eq!(scheduler.pending().get(), 0);
    }

    #[tokio::test]
    async fn test_activation_is_forwarded() {
        let (tx, mut rx) = activated_event_channel();
        let scheduler = scheduler().with_activation_sink(tx);

        let activation = scheduler
            .schedule(Category::Shed, shed("2024-01-01T00:00:00"))
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.activation_id, activation.id());
        assert_eq!(event.record.category, Category::Shed);
    }

    #[tokio::test]
    async fn test_decode_failure_schedules_nothing() {
        let scheduler = scheduler();
        let err = scheduler
            .schedule(Category::Shed, shed("not a date"))
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedTimestamp(_)));
        assert!(scheduler.store().is_empty().await);
    }
}
