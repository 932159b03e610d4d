//! Core OrderBook implementation for managing price levels and orders

use super::iceberg::IcebergManager;
use super::match_result::MatchResult;
use super::order::{Order, Side};
use super::price_heap::PriceHeap;
use super::price_level::PriceLevel;
use crate::orderbook::trade::{TradeListener, TradeResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use tracing::trace;

/// Where a resting order lives, kept in the book's ID index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct OrderLocation {
    pub side: Side,
    pub price: u128,
    /// Iceberg parent, for slices.
    pub parent_id: Option<String>,
}

/// One side of the book: the price levels and the heap that orders them.
///
/// A price is in `heap` iff `levels` holds a non-empty level for it.
#[derive(Debug)]
pub(super) struct BookSide {
    pub heap: PriceHeap,
    pub levels: HashMap<u128, PriceLevel>,
}

impl BookSide {
    fn new(heap: PriceHeap) -> Self {
        Self {
            heap,
            levels: HashMap::new(),
        }
    }

    /// Best price on this side.
    pub fn best_price(&self) -> Option<u128> {
        self.heap.peek()
    }

    /// Append an order to the back of its price level, creating the level if needed.
    pub fn insert(&mut self, order: Order) {
        let price = order.price;
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .push_back(order);
        self.heap.push(price);
    }

    /// Remove an order from the level at `price`, dropping the level once empty.
    pub fn remove(&mut self, order_id: &str, price: u128) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove(order_id)?;
        if level.is_empty() {
            self.drop_level(price);
        }
        Some(order)
    }

    /// Remove an empty level together with its heap entry.
    pub fn drop_level(&mut self, price: u128) {
        debug_assert!(
            self.levels.get(&price).is_none_or(PriceLevel::is_empty),
            "dropping non-empty level at {price}"
        );
        self.levels.remove(&price);
        let removed = self.heap.remove(price);
        debug_assert!(removed, "heap out of sync at {price}");
    }

    /// Sum of resting quantity at `price`.
    pub fn depth_at(&self, price: u128) -> u64 {
        self.levels.get(&price).map_or(0, PriceLevel::total_quantity)
    }

    #[cfg(debug_assertions)]
    pub fn check_consistency(&self) {
        debug_assert_eq!(self.heap.len(), self.levels.len());
        for (price, level) in &self.levels {
            debug_assert!(!level.is_empty(), "empty level left at {price}");
            debug_assert!(self.heap.contains(*price), "level {price} missing from heap");
        }
    }
}

/// Mutable book state guarded by the book lock.
#[derive(Debug)]
pub(super) struct BookState {
    pub bids: BookSide,
    pub asks: BookSide,
    pub index: HashMap<String, OrderLocation>,
}

impl BookState {
    fn new() -> Self {
        Self {
            bids: BookSide::new(PriceHeap::for_bids()),
            asks: BookSide::new(PriceHeap::for_asks()),
            index: HashMap::new(),
        }
    }

    /// The side an order of `side` rests on.
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Look up a resting order by ID.
    pub fn get(&self, order_id: &str) -> Option<&Order> {
        let location = self.index.get(order_id)?;
        self.side(location.side)
            .levels
            .get(&location.price)?
            .get(order_id)
    }
}

/// A single-instrument limit order book.
///
/// All price levels, heaps and the ID index live behind one mutex, so every
/// operation on a symbol is serialized. Trade listeners run while that lock
/// is held.
pub struct OrderBook {
    /// The symbol or identifier for this order book
    pub(super) symbol: String,

    pub(super) state: Mutex<BookState>,

    /// Listeners invoked once per non-empty batch of fills
    pub(super) listeners: RwLock<Vec<TradeListener>>,

    /// Present when the book accepts iceberg orders
    pub(super) iceberg: Option<IcebergManager>,

    /// Serializes slice submission with iceberg cancellation. Always taken
    /// first. The iceberg lock may be taken under the book lock, never the
    /// reverse.
    pub(super) iceberg_gate: Mutex<()>,
}

impl OrderBook {
    /// Create a new order book for the given symbol. Iceberg orders are rejected.
    pub fn new(symbol: &str) -> Self {
        Self::build(symbol, None)
    }

    /// Create an order book that accepts iceberg orders.
    ///
    /// Slices are released by [`OrderBook::run_iceberg_tick`], which an
    /// [`IcebergScheduler`](super::iceberg::IcebergScheduler) calls periodically.
    pub fn with_iceberg(symbol: &str) -> Self {
        Self::build(symbol, Some(IcebergManager::new(symbol)))
    }

    /// Create a new order book with a trade listener already attached.
    pub fn with_trade_listener(symbol: &str, trade_listener: TradeListener) -> Self {
        let book = Self::new(symbol);
        book.register_trade_listener(trade_listener);
        book
    }

    fn build(symbol: &str, iceberg: Option<IcebergManager>) -> Self {
        trace!("Creating order book for {}", symbol);
        Self {
            symbol: symbol.to_string(),
            state: Mutex::new(BookState::new()),
            listeners: RwLock::new(Vec::new()),
            iceberg,
            iceberg_gate: Mutex::new(()),
        }
    }

    /// Get the symbol of this order book
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns `true` if this book accepts iceberg orders.
    pub fn iceberg_enabled(&self) -> bool {
        self.iceberg.is_some()
    }

    /// Attach a listener. It sees every later batch of fills on this book.
    pub fn register_trade_listener(&self, listener: TradeListener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Number of attached trade listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, BookState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver one batch to every listener. Called with the state lock held.
    pub(super) fn notify(&self, matches: &[MatchResult]) {
        if matches.is_empty() {
            return;
        }
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.is_empty() {
            return;
        }
        let trade_result = TradeResult::new(self.symbol.clone(), matches.to_vec());
        for listener in listeners.iter() {
            listener(&trade_result);
        }
    }

    /// Get the best bid price, if any
    pub fn best_bid(&self) -> Option<u128> {
        self.lock_state().bids.best_price()
    }

    /// Get the best ask price, if any
    pub fn best_ask(&self) -> Option<u128> {
        self.lock_state().asks.best_price()
    }

    /// Get the spread (best ask - best bid)
    pub fn spread(&self) -> Option<u128> {
        let state = self.lock_state();
        match (state.bids.best_price(), state.asks.best_price()) {
            (Some(bid), Some(ask)) => Some(ask.saturating_sub(bid)),
            _ => None,
        }
    }

    /// Number of orders resting in the book, iceberg slices included.
    pub fn order_count(&self) -> usize {
        self.lock_state().index.len()
    }

    /// Returns `true` if an order with this ID is resting in the book.
    pub fn has_order(&self, order_id: &str) -> bool {
        self.lock_state().index.contains_key(order_id)
    }

    /// Get a copy of a resting order by ID.
    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        self.lock_state().get(order_id).cloned()
    }

    /// Total resting quantity at one price on one side.
    pub fn depth_at(&self, side: Side, price: u128) -> u64 {
        self.lock_state().side(side).depth_at(price)
    }

    /// Number of orders queued at one price on one side.
    pub fn level_len(&self, side: Side, price: u128) -> usize {
        self.lock_state()
            .side(side)
            .levels
            .get(&price)
            .map_or(0, PriceLevel::order_count)
    }

    /// Number of distinct price levels on one side.
    pub fn level_count(&self, side: Side) -> usize {
        self.lock_state().side(side).levels.len()
    }

    /// Position of a resting order within its price level, 0 being next to match.
    pub fn queue_position(&self, order_id: &str) -> Option<usize> {
        let state = self.lock_state();
        let location = state.index.get(order_id)?;
        state
            .side(location.side)
            .levels
            .get(&location.price)?
            .position(order_id)
    }

    /// IDs resting at one price, front of the queue first.
    pub fn orders_at(&self, side: Side, price: u128) -> Vec<String> {
        self.lock_state()
            .side(side)
            .levels
            .get(&price)
            .map(|level| level.iter().map(|o| o.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Aggregated `(price, quantity)` per level, best price first.
    pub fn depth(&self, side: Side, levels: usize) -> Vec<(u128, u64)> {
        let state = self.lock_state();
        let book_side = state.side(side);
        book_side
            .heap
            .iter()
            .take(levels)
            .map(|price| (price, book_side.depth_at(price)))
            .collect()
    }

    /// Resting orders that are slices of the given iceberg parent.
    pub fn slices_of(&self, parent_id: &str) -> Vec<Order> {
        let state = self.lock_state();
        state
            .index
            .iter()
            .filter(|(_, loc)| loc.parent_id.as_deref() == Some(parent_id))
            .filter_map(|(id, _)| state.get(id).cloned())
            .collect()
    }

    /// Number of iceberg parents still holding hidden quantity.
    pub fn active_iceberg_count(&self) -> usize {
        self.iceberg
            .as_ref()
            .map_or(0, IcebergManager::active_count)
    }

    /// Hidden quantity left on an active iceberg parent.
    pub fn iceberg_hidden_quantity(&self, parent_id: &str) -> Option<u64> {
        self.iceberg.as_ref()?.hidden_quantity(parent_id)
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.symbol)
            .field("orders", &self.order_count())
            .field("iceberg_enabled", &self.iceberg_enabled())
            .finish()
    }
}
