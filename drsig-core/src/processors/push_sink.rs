//! PushSink processor.
//!
//! The PushSink is responsible for:
//! - Receiving `ActivatedEvent` from the activation channel
//! - Looking up the endpoint configured for the event's category
//! - Sending the `{type, data}` entry as an HTTP POST
//! - Retrying failed deliveries with exponential backoff (2^0 to 2^6 seconds)
//!
//! Endpoints live in a `ConfigStore` and are read per delivery, so a reload
//! applies to the next event without restarting the sink. Delivery is best
//! effort: in-flight retries are abandoned on shutdown.

use crate::config::{ConfigStore, ConfigWatcher, PushSinkConfig};
use crate::events::{ActivatedEvent, ActivatedEventReceiver};
use drsig_sdk::objects::EventEntry;
use kanau::processor::Processor;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use url::Url;

/// Backoff exponent cap (2^6 = 64 seconds).
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// Errors that can occur during push delivery.
#[derive(Debug, Error)]
pub enum PushError {
    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("push delivery failed with status {status}: {body}")]
    DeliveryFailed { status: u16, body: String },

    /// All attempts failed.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<PushError>,
    },
}

/// Where and how one activated event will be delivered.
#[derive(Debug, Clone)]
pub struct PushDelivery {
    pub endpoint: Url,
    pub entry: EventEntry,
    pub max_attempts: u32,
}

/// PushSink forwards activated events to per-category HTTP endpoints.
#[derive(Clone)]
pub struct PushSink {
    config_store: ConfigStore<PushSinkConfig>,
    http_client: reqwest::Client,
}

impl PushSink {
    pub fn new(config_store: ConfigStore<PushSinkConfig>) -> Self {
        Self {
            config_store,
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Run the PushSink until shutdown or until the channel closes.
    ///
    /// Each delivery runs in its own task so a slow endpoint does not hold
    /// back the others.
    pub async fn run(
        self,
        mut shutdown_rx: watch::Receiver<bool>,
        mut activated_rx: ActivatedEventReceiver,
        mut config_watcher: ConfigWatcher,
    ) {
        info!("PushSink started");
        let mut deliveries: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("PushSink received shutdown signal");
                        break;
                    }
                }

                Ok(()) = config_watcher.changed() => {
                    let config = self.config_store.snapshot().await;
                    info!(
                        endpoints = config.endpoints.len(),
                        max_attempts = config.max_attempts,
                        "PushSink endpoints reloaded"
                    );
                }

                event = activated_rx.recv() => {
                    let Some(event) = event else {
                        info!("Activation channel closed");
                        break;
                    };
                    let Ok(Some(delivery)) = self.process(event).await else {
                        continue;
                    };
                    let http_client = self.http_client.clone();
                    deliveries.spawn(async move {
                        let category = delivery.entry.category.clone();
                        match deliver(&http_client, &delivery).await {
                            Ok(()) => info!(%category, "Push delivered"),
                            Err(e) => error!(%category, error = %e, "Push delivery failed"),
                        }
                    });
                }

                Some(_) = deliveries.join_next(), if !deliveries.is_empty() => {}
            }
        }

        if !deliveries.is_empty() {
            warn!(
                in_flight = deliveries.len(),
                "Abandoning in-flight push deliveries"
            );
        }
        deliveries.shutdown().await;

        info!("PushSink shutdown complete");
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementation
// ---------------------------------------------------------------------------

/// Resolve where an activated event goes. `None` when its category has no
/// endpoint or the record carries no payload.
impl Processor<ActivatedEvent> for PushSink {
    type Output = Option<PushDelivery>;
    type Error = std::convert::Infallible;

    async fn process(&self, event: ActivatedEvent) -> Result<Option<PushDelivery>, Self::Error> {
        let config = self.config_store.snapshot().await;
        let category = &event.record.category;

        let Some(endpoint) = config.endpoint_for(category) else {
            debug!(%category, "No push endpoint configured");
            return Ok(None);
        };
        let Some(entry) = event.record.to_entry() else {
            debug!(%category, activation_id = %event.activation_id, "Nothing to push");
            return Ok(None);
        };

        Ok(Some(PushDelivery {
            endpoint: endpoint.clone(),
            entry,
            max_attempts: config.max_attempts.max(1),
        }))
    }
}

/// POST `delivery.entry`, retrying with backoff until it succeeds or
/// `max_attempts` is reached.
pub async fn deliver(
    http_client: &reqwest::Client,
    delivery: &PushDelivery,
) -> Result<(), PushError> {
    let mut attempt = 0;
    loop {
        let error = match send_once(http_client, delivery).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        attempt += 1;
        if attempt >= delivery.max_attempts {
            return Err(PushError::Exhausted {
                attempts: attempt,
                last: Box::new(error),
            });
        }

        let delay = calculate_retry_delay(attempt - 1);
        warn!(
            endpoint = %delivery.endpoint,
            attempt,
            error = %error,
            retry_in_secs = delay.as_secs(),
            "Push attempt failed"
        );
        tokio::time::sleep(delay).await;
    }
}

async fn send_once(
    http_client: &reqwest::Client,
    delivery: &PushDelivery,
) -> Result<(), PushError> {
    let response = http_client
        .post(delivery.endpoint.clone())
        .json(&delivery.entry)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(PushError::DeliveryFailed {
            status: status.as_u16(),
            body,
        })
    }
}

/// Calculate the next retry delay based on retry count.
///
/// Uses exponential backoff: 2^retry_count seconds.
pub fn calculate_retry_delay(retry_count: u32) -> std::time::Duration {
    let seconds = 2u64.pow(retry_count.min(MAX_BACKOFF_EXPONENT));
    std::time::Duration::from_secs(seconds)
}
