//! In-memory store of activated events.
//!
//! The store is append-only and keeps insertion order. Any number of
//! activation tasks append concurrently while the query path reads; both
//! go through one `RwLock` around the record list.
//!
//! After [`EventStore::close`] appends are silently dropped. Deferred
//! activations are never cancelled, so timers that fire after shutdown land
//! here and do nothing.

mod query;

pub use query::{ListEvents, QueryError};

use crate::entities::EventRecord;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone, Default)]
pub struct EventStore {
    inner: Arc<EventStoreInner>,
}

#[derive(Default)]
struct EventStoreInner {
    records: RwLock<Vec<Arc<EventRecord>>>,
    closed: AtomicBool,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an activated record.
    ///
    /// Returns `false` if the store is closed and the record was dropped.
    pub async fn append(&self, record: Arc<EventRecord>) -> bool {
        if self.is_closed() {
            debug!(category = %record.category, "Store closed, dropping activated record");
            return false;
        }
        self.inner.records.write().await.push(record);
        true
    }

    /// Stop accepting records. Reads keep working.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub async fn len(&self) -> usize {
        self.inner.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The records as of now, in insertion order.
    pub async fn snapshot(&self) -> Vec<Arc<EventRecord>> {
        self.inner.records.read().await.clone()
    }
}
