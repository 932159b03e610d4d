//! Asynchronous, sharded publication of order events.
//!
//! Events are hashed by order ID onto a fixed set of bounded queues, so all
//! events of one order are published in the order they were recorded. The
//! queues are drained on a dedicated thread running a current-thread Tokio
//! runtime. Enqueueing never blocks: when a shard is full the event is
//! dropped and counted.

use crate::oms::event::OrderEvent;
use crate::oms::publisher::EventPublisher;
use serde::{Deserialize, Serialize};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, trace, warn};

/// Default number of shards.
pub const DEFAULT_SHARDS: usize = 2;

/// Default capacity of each shard queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Default maximum number of retry attempts for a failed publish.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Base delay in milliseconds for exponential backoff between retries.
pub const BASE_RETRY_DELAY_MS: u64 = 10;

/// Dispatcher sizing and retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of independent queues.
    pub shards: usize,
    /// Capacity of each queue.
    pub queue_capacity: usize,
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub base_retry_delay_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
            base_retry_delay_ms: BASE_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    published: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Hands recorded events to an [`EventPublisher`] off the matching path.
pub struct EventDispatcher {
    /// Cleared on shutdown, which closes every queue.
    senders: RwLock<Vec<mpsc::Sender<OrderEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl EventDispatcher {
    /// Start the dispatcher thread.
    ///
    /// # Errors
    /// Returns the I/O error if the runtime or the thread cannot be created.
    pub fn start(
        publisher: Arc<dyn EventPublisher>,
        config: DispatcherConfig,
    ) -> std::io::Result<Self> {
        let shards = config.shards.max(1);
        let capacity = config.queue_capacity.max(1);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        let mut senders = Vec::with_capacity(shards);
        let mut receivers = Vec::with_capacity(shards);
        for _ in 0..shards {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(tx);
            receivers.push(rx);
        }

        let counters = Arc::new(Counters::default());
        let worker_counters = Arc::clone(&counters);
        let worker = std::thread::Builder::new()
            .name("oms-event-dispatcher".to_string())
            .spawn(move || {
                debug!("Event dispatcher started with {} shards", shards);
                runtime.block_on(async move {
                    let mut tasks = Vec::with_capacity(receivers.len());
                    for (shard, rx) in receivers.into_iter().enumerate() {
                        tasks.push(tokio::spawn(drain_shard(
                            shard,
                            rx,
                            Arc::clone(&publisher),
                            Arc::clone(&worker_counters),
                            config.clone(),
                        )));
                    }
                    for task in tasks {
                        if let Err(e) = task.await {
                            error!(error = %e, "event shard task failed");
                        }
                    }
                });
                debug!("Event dispatcher stopped");
            })?;

        Ok(Self {
            senders: RwLock::new(senders),
            worker: Mutex::new(Some(worker)),
            counters,
        })
    }

    /// Queue an event for publication. Returns `false` if it was dropped.
    pub fn dispatch(&self, event: OrderEvent) -> bool {
        let senders = self.senders.read().unwrap_or_else(PoisonError::into_inner);
        if senders.is_empty() {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(order_id = %event.order_id, "event dispatcher is shut down, event dropped");
            return false;
        }

        let mut hasher = DefaultHasher::new();
        event.order_id.hash(&mut hasher);
        let shard = (hasher.finish() % senders.len() as u64) as usize;

        match senders[shard].try_send(event) {
            Ok(()) => true,
            Err(e) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(shard, error = %e, "event queue full, event dropped");
                false
            }
        }
    }

    /// Close the queues, publish what is already queued and join the thread.
    pub fn shutdown(&self) {
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("Event dispatcher thread panicked");
            }
        }
    }

    /// Events published successfully.
    pub fn published_count(&self) -> u64 {
        self.counters.published.load(Ordering::Relaxed)
    }

    /// Events given up on after all retries.
    pub fn failed_count(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    /// Events dropped because a queue was full or closed.
    pub fn dropped_count(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("published", &self.published_count())
            .field("failed", &self.failed_count())
            .field("dropped", &self.dropped_count())
            .finish()
    }
}

async fn drain_shard(
    shard: usize,
    mut rx: mpsc::Receiver<OrderEvent>,
    publisher: Arc<dyn EventPublisher>,
    counters: Arc<Counters>,
    config: DispatcherConfig,
) {
    while let Some(event) = rx.recv().await {
        let payload = match serde_json::to_vec(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "failed to serialize order event");
                continue;
            }
        };
        if publish_with_retry(publisher.as_ref(), payload, &config).await {
            counters.published.fetch_add(1, Ordering::Relaxed);
            trace!(shard, sequence = event.sequence, "order event published");
        } else {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            error!(
                shard,
                order_id = %event.order_id,
                "order event publish failed after all retries"
            );
        }
    }
}

/// Publish one payload, retrying with exponential backoff.
///
/// Returns `true` if the publish succeeded, `false` if all retries were
/// exhausted.
async fn publish_with_retry(
    publisher: &dyn EventPublisher,
    payload: Vec<u8>,
    config: &DispatcherConfig,
) -> bool {
    let max_attempts = config.max_retries.saturating_add(1);

    for attempt in 0..max_attempts {
        match publisher.publish(payload.clone()).await {
            Ok(()) => return true,
            Err(e) => {
                warn!(
                    attempt = attempt + 1,
                    max = max_attempts,
                    error = %e,
                    "order event publish failed, retrying"
                );
            }
        }

        // Exponential backoff: base, 2 × base, 4 × base, ...
        if attempt + 1 < max_attempts {
            let delay_ms = config
                .base_retry_delay_ms
                .saturating_mul(1u64 << attempt.min(20));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    false
}
