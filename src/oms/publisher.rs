//! Destinations for serialized order events.

use crate::oms::error::OmsError;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Future returned by [`EventPublisher::publish`].
pub type PublishFuture<'a> = Pin<Box<dyn Future<Output = Result<(), OmsError>> + Send + 'a>>;

/// Sends one JSON-encoded [`OrderEvent`](crate::oms::event::OrderEvent) somewhere.
///
/// Called from the dispatcher's runtime; a failed publish is retried by the
/// dispatcher with exponential backoff.
pub trait EventPublisher: Send + Sync {
    /// Publish one payload.
    fn publish(&self, payload: Vec<u8>) -> PublishFuture<'_>;
}

/// Writes events to the `tracing` log instead of a message bus.
#[derive(Debug, Default, Clone)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, payload: Vec<u8>) -> PublishFuture<'_> {
        Box::pin(async move {
            debug!(event = %String::from_utf8_lossy(&payload), "order event");
            Ok(())
        })
    }
}
