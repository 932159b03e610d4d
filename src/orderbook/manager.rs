/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Multi-book management with centralized trade callback fan-out.
//!
//! [`OrderBookManager`] owns one [`OrderBook`] per symbol, created lazily the
//! first time a symbol is referenced. Every book is wired with the manager's
//! statistics listener, every registered trade callback and, when enabled,
//! its own iceberg scheduler.

use crate::orderbook::OrderBook;
use crate::orderbook::error::OrderBookError;
use crate::orderbook::iceberg::IcebergScheduler;
use crate::orderbook::match_result::MatchResult;
use crate::orderbook::order::Order;
use crate::orderbook::stats::{EngineStats, StatsSnapshot};
use crate::orderbook::trade::{TradeListener, TradeResult};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{error, info};

/// Default iceberg slicing interval.
pub const DEFAULT_ICEBERG_INTERVAL_MS: u64 = 1;

/// Settings applied to every book the manager creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookManagerConfig {
    /// Give each book an iceberg manager and a running scheduler.
    pub enable_iceberg: bool,
    /// Milliseconds between iceberg ticks.
    pub iceberg_interval_ms: u64,
}

impl Default for OrderBookManagerConfig {
    fn default() -> Self {
        Self {
            enable_iceberg: true,
            iceberg_interval_ms: DEFAULT_ICEBERG_INTERVAL_MS,
        }
    }
}

impl OrderBookManagerConfig {
    /// Enable or disable iceberg support.
    pub fn with_iceberg(mut self, enable: bool) -> Self {
        self.enable_iceberg = enable;
        self
    }

    /// Set the iceberg tick interval in milliseconds.
    pub fn with_iceberg_interval_ms(mut self, interval_ms: u64) -> Self {
        self.iceberg_interval_ms = interval_ms;
        self
    }

    /// Tick interval, never shorter than one millisecond.
    pub fn iceberg_interval(&self) -> Duration {
        Duration::from_millis(self.iceberg_interval_ms.max(1))
    }
}

struct BookEntry {
    book: Arc<OrderBook>,
    /// Dropped together with the entry, which stops the thread.
    _scheduler: Option<IcebergScheduler>,
}

/// Routes orders to per-symbol books and fans trade callbacks out to all of them.
pub struct OrderBookManager {
    config: OrderBookManagerConfig,
    books: DashMap<String, BookEntry>,
    /// Taken before the book map whenever both are needed.
    listeners: RwLock<Vec<TradeListener>>,
    stats: Arc<EngineStats>,
}

impl OrderBookManager {
    /// Create an empty manager.
    pub fn new(config: OrderBookManagerConfig) -> Self {
        Self {
            config,
            books: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
            stats: Arc::new(EngineStats::default()),
        }
    }

    /// The configuration books are created with.
    pub fn config(&self) -> &OrderBookManagerConfig {
        &self.config
    }

    /// Get the book for `symbol`, creating it on first use.
    pub fn book(&self, symbol: &str) -> Arc<OrderBook> {
        if let Some(entry) = self.books.get(symbol) {
            return Arc::clone(&entry.book);
        }

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = self
            .books
            .entry(symbol.to_string())
            .or_insert_with(|| self.create_entry(symbol, &listeners));
        Arc::clone(&entry.book)
    }

    fn create_entry(&self, symbol: &str, listeners: &[TradeListener]) -> BookEntry {
        let book = if self.config.enable_iceberg {
            OrderBook::with_iceberg(symbol)
        } else {
            OrderBook::new(symbol)
        };

        let stats = Arc::clone(&self.stats);
        book.register_trade_listener(Arc::new(move |trade_result: &TradeResult| {
            stats.record_batch(trade_result);
        }));
        for listener in listeners {
            book.register_trade_listener(Arc::clone(listener));
        }

        let book = Arc::new(book);
        let scheduler = if self.config.enable_iceberg {
            match IcebergScheduler::start(Arc::clone(&book), self.config.iceberg_interval()) {
                Ok(scheduler) => Some(scheduler),
                Err(e) => {
                    error!("Failed to start iceberg scheduler for {}: {}", symbol, e);
                    None
                }
            }
        } else {
            None
        };

        info!(
            "Created order book for symbol: {} (iceberg: {})",
            symbol, self.config.enable_iceberg
        );
        BookEntry {
            book,
            _scheduler: scheduler,
        }
    }

    /// Get an existing book without creating one.
    pub fn get_book(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.books.get(symbol).map(|entry| Arc::clone(&entry.book))
    }

    /// Check if a book exists for a specific symbol.
    pub fn has_book(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }

    /// Get the list of all symbols with order books in this manager.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.books.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    /// Get the number of order books in this manager.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Remove a book, stopping its iceberg scheduler.
    pub fn remove_book(&self, symbol: &str) -> bool {
        let removed = self.books.remove(symbol).is_some();
        if removed {
            info!("Removed order book for symbol: {}", symbol);
        }
        removed
    }

    /// Register a callback for every current and future book.
    ///
    /// Callbacks run synchronously while the originating book is locked. They
    /// must not block and must not call back into the same book.
    pub fn register_trade_callback(&self, callback: TradeListener) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for entry in self.books.iter() {
            entry.book.register_trade_listener(Arc::clone(&callback));
        }
        listeners.push(callback);
    }

    /// Route an order to the book for `symbol`.
    ///
    /// An order with an empty symbol takes `symbol`.
    ///
    /// # Errors
    /// Whatever [`OrderBook::add_order`] returns, or
    /// [`OrderBookError::InvalidOperation`] if the order names another symbol.
    pub fn add_order(
        &self,
        symbol: &str,
        mut order: Order,
    ) -> Result<Vec<MatchResult>, OrderBookError> {
        if order.symbol.is_empty() {
            order.symbol = symbol.to_string();
        } else if order.symbol != symbol {
            self.stats.record_rejected();
            return Err(OrderBookError::InvalidOperation {
                message: format!(
                    "order {} is for {} but was routed to {}",
                    order.id, order.symbol, symbol
                ),
            });
        }

        let result = self.book(symbol).add_order(order);
        match &result {
            Ok(_) => self.stats.record_added(),
            Err(_) => self.stats.record_rejected(),
        }
        result
    }

    /// Cancel an order on `symbol`. Returns `false` if it is unknown.
    pub fn cancel_order(&self, symbol: &str, order_id: &str) -> bool {
        let cancelled = self.book(symbol).cancel_order(order_id);
        if cancelled {
            self.stats.record_cancelled();
        }
        cancelled
    }

    /// Modify an order on `symbol`. See [`OrderBook::modify_order`].
    pub fn modify_order(
        &self,
        symbol: &str,
        order_id: &str,
        new_price: u128,
        new_quantity: u64,
    ) -> Result<Vec<MatchResult>, OrderBookError> {
        let result = self
            .book(symbol)
            .modify_order(order_id, new_price, new_quantity);
        if result.is_ok() {
            self.stats.record_modified();
        }
        result
    }

    /// Modify an order on `symbol`, sizing it from its resting quantity.
    /// See [`OrderBook::modify_order_with`].
    pub fn modify_order_with<F>(
        &self,
        symbol: &str,
        order_id: &str,
        new_price: u128,
        new_quantity: F,
    ) -> Result<Vec<MatchResult>, OrderBookError>
    where
        F: FnOnce(u64) -> u64,
    {
        let result = self
            .book(symbol)
            .modify_order_with(order_id, new_price, new_quantity);
        if result.is_ok() {
            self.stats.record_modified();
        }
        result
    }

    /// Current diagnostics counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for OrderBookManager {
    fn default() -> Self {
        Self::new(OrderBookManagerConfig::default())
    }
}

impl std::fmt::Debug for OrderBookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBookManager")
            .field("config", &self.config)
            .field("books", &self.book_count())
            .finish()
    }
}
