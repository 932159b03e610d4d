//! NATS JetStream order event publisher.
//!
//! # Feature Gate
//!
//! This module is only available when the `nats` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! orderbook-oms = { version = "0.3", features = ["nats"] }
//! ```

use crate::oms::error::OmsError;
use crate::oms::publisher::{EventPublisher, PublishFuture};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Default subject order events are published to.
pub const DEFAULT_EVENT_SUBJECT: &str = "ORDERS.events";

/// Publishes order events to a JetStream subject and waits for the ack.
///
/// Retries are left to the [`EventDispatcher`](crate::oms::dispatcher::EventDispatcher).
///
/// # Example
///
/// ```rust,no_run
/// use orderbook_oms::oms::nats::NatsEventPublisher;
/// use orderbook_oms::oms::{DispatcherConfig, EventDispatcher, InMemoryEventStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = async_nats::connect("nats://localhost:4222").await?;
/// let jetstream = async_nats::jetstream::new(client);
/// let publisher = Arc::new(NatsEventPublisher::new(jetstream));
/// let dispatcher = EventDispatcher::start(publisher, DispatcherConfig::default())?;
/// let store = InMemoryEventStore::with_dispatcher(dispatcher);
/// # Ok(())
/// # }
/// ```
pub struct NatsEventPublisher {
    jetstream: async_nats::jetstream::Context,
    subject: String,
    /// Monotonically increasing sequence number sent as a NATS header.
    sequence: AtomicU64,
}

impl NatsEventPublisher {
    /// Publish to [`DEFAULT_EVENT_SUBJECT`].
    #[inline]
    pub fn new(jetstream: async_nats::jetstream::Context) -> Self {
        Self::with_subject(jetstream, DEFAULT_EVENT_SUBJECT.to_string())
    }

    /// Publish to a custom subject.
    pub fn with_subject(jetstream: async_nats::jetstream::Context, subject: String) -> Self {
        Self {
            jetstream,
            subject,
            sequence: AtomicU64::new(0),
        }
    }

    /// The subject events are published to.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl EventPublisher for NatsEventPublisher {
    fn publish(&self, payload: Vec<u8>) -> PublishFuture<'_> {
        Box::pin(async move {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let mut headers = async_nats::HeaderMap::new();
            headers.insert("Nats-Sequence", seq.to_string().as_str());

            let ack = self
                .jetstream
                .publish_with_headers(self.subject.clone(), headers, bytes::Bytes::from(payload))
                .await
                .map_err(|e| OmsError::Publish(e.to_string()))?;
            ack.await.map_err(|e| OmsError::Publish(e.to_string()))?;
            trace!(seq, subject = %self.subject, "order event published to NATS");
            Ok(())
        })
    }
}

impl std::fmt::Debug for NatsEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsEventPublisher")
            .field("subject", &self.subject)
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish()
    }
}
