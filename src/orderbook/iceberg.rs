//! Iceberg parent tracking and the background slicing scheduler.
//!
//! An iceberg parent never rests in the book. The [`IcebergManager`] holds it
//! and releases ordinary limit/GTC slices of at most `visible_quantity`, one
//! per parent per tick, until the hidden reserve is exhausted.

use super::book::OrderBook;
use super::error::OrderBookError;
use super::order::{Order, OrderType, TimeInForce};
use crossbeam::channel::{self, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, trace};

#[derive(Debug, Default)]
struct IcebergState {
    /// Active parents in arrival order.
    parents: Vec<Order>,
}

impl IcebergState {
    fn slice_once(&mut self, index: usize, next_slice: &AtomicU64) -> Option<Order> {
        let parent = self.parents.get_mut(index)?;
        let quantity = parent.visible_quantity.min(parent.hidden_quantity);
        if quantity == 0 {
            return None;
        }
        parent.hidden_quantity -= quantity;

        let mut slice = Order::limit(
            slice_id(&parent.id, next_slice),
            parent.symbol.clone(),
            parent.side,
            parent.price,
            quantity,
            TimeInForce::Gtc,
        );
        slice.parent_id = Some(parent.id.clone());
        Some(slice)
    }
}

fn slice_id(parent_id: &str, next_slice: &AtomicU64) -> String {
    let n = next_slice.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{parent_id}-slice-{n}")
}

/// Holds iceberg parents for one book and cuts their slices.
///
/// The manager never touches the book itself: it hands slices back to the
/// caller, which submits them once the manager's lock is released.
#[derive(Debug)]
pub struct IcebergManager {
    symbol: String,
    state: Mutex<IcebergState>,
    /// Monotonic suffix for slice IDs, readable without the parent lock.
    next_slice: AtomicU64,
}

impl IcebergManager {
    /// Create an empty manager for `symbol`.
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            state: Mutex::new(IcebergState::default()),
            next_slice: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IcebergState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a parent with its whole quantity hidden and cut the first slice.
    ///
    /// A parent that is exhausted by this first slice is not retained.
    ///
    /// # Errors
    /// [`OrderBookError::DuplicateOrderId`] if a parent with the same ID is active,
    /// [`OrderBookError::InvalidOperation`] if `order` is not an iceberg.
    pub fn add_iceberg(&self, mut order: Order) -> Result<Order, OrderBookError> {
        if order.order_type != OrderType::Iceberg {
            return Err(OrderBookError::InvalidOperation {
                message: format!("order {} is not an iceberg order", order.id),
            });
        }
        if order.quantity == 0 || order.visible_quantity == 0 {
            return Err(OrderBookError::InvalidQuantity {
                order_id: order.id,
                quantity: order.visible_quantity.min(order.quantity),
            });
        }

        let mut state = self.lock();
        if state.parents.iter().any(|p| p.id == order.id) {
            return Err(OrderBookError::DuplicateOrderId(order.id));
        }

        order.hidden_quantity = order.quantity;
        trace!(
            "Iceberg {} registered on {}: total {}, visible {}",
            order.id, self.symbol, order.quantity, order.visible_quantity
        );
        state.parents.push(order);
        let index = state.parents.len() - 1;
        let slice = state
            .slice_once(index, &self.next_slice)
            .ok_or_else(|| OrderBookError::InvalidOperation {
                message: format!("iceberg on {} produced no slice", self.symbol),
            })?;
        if state.parents[index].hidden_quantity == 0 {
            state.parents.remove(index);
        }
        Ok(slice)
    }

    /// Cut one slice from every active parent, dropping parents that run dry.
    pub fn slice_all(&self) -> Vec<Order> {
        let mut state = self.lock();
        let mut slices = Vec::with_capacity(state.parents.len());
        for index in 0..state.parents.len() {
            if let Some(slice) = state.slice_once(index, &self.next_slice) {
                slices.push(slice);
            }
        }
        state.parents.retain(|p| {
            let active = p.hidden_quantity > 0;
            if !active {
                trace!("Iceberg {} exhausted on {}", p.id, self.symbol);
            }
            active
        });
        slices
    }

    /// A fresh slice ID for `parent_id`, used when a cut slice's ID is already taken.
    pub fn next_slice_id(&self, parent_id: &str) -> String {
        slice_id(parent_id, &self.next_slice)
    }

    /// Stop slicing a parent. Returns `false` if it is not active.
    pub fn cancel_parent(&self, parent_id: &str) -> bool {
        let mut state = self.lock();
        let before = state.parents.len();
        state.parents.retain(|p| p.id != parent_id);
        before != state.parents.len()
    }

    /// Returns `true` if `parent_id` still has hidden quantity.
    pub fn contains(&self, parent_id: &str) -> bool {
        self.lock().parents.iter().any(|p| p.id == parent_id)
    }

    /// Hidden quantity left on an active parent.
    pub fn hidden_quantity(&self, parent_id: &str) -> Option<u64> {
        self.lock()
            .parents
            .iter()
            .find(|p| p.id == parent_id)
            .map(Order::hidden_quantity)
    }

    /// Number of active parents.
    pub fn active_count(&self) -> usize {
        self.lock().parents.len()
    }
}

/// Background thread that calls [`OrderBook::run_iceberg_tick`] on a fixed interval.
///
/// Stopping takes effect between ticks; a tick in progress always completes.
/// Dropping the scheduler stops it and joins the thread.
#[derive(Debug)]
pub struct IcebergScheduler {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IcebergScheduler {
    /// Spawn a scheduler thread for `book`.
    ///
    /// # Errors
    /// Returns the I/O error if the thread cannot be spawned.
    pub fn start(book: Arc<OrderBook>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let name = format!("iceberg-{}", book.symbol());

        let handle = std::thread::Builder::new().name(name).spawn(move || {
            debug!(
                "Iceberg scheduler for {} started ({:?} interval)",
                book.symbol(),
                interval
            );
            let ticker = channel::tick(interval);
            loop {
                channel::select! {
                    recv(ticker) -> _ => {
                        book.run_iceberg_tick();
                    }
                    recv(stop_rx) -> _ => break,
                }
            }
            debug!("Iceberg scheduler for {} stopped", book.symbol());
        })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Returns `true` until [`IcebergScheduler::stop`] has been called.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signal the thread to stop and wait for it to exit.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            if stop.send(()).is_err() {
                trace!("Iceberg scheduler already stopped");
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Iceberg scheduler thread panicked");
            }
        }
    }
}

impl Drop for IcebergScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
