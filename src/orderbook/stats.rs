//! Engine-wide diagnostics counters owned by the book manager.

use crate::orderbook::trade::TradeResult;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the manager and by the listener it attaches to every book.
#[derive(Debug, Default)]
pub struct EngineStats {
    orders_added: AtomicU64,
    orders_rejected: AtomicU64,
    orders_cancelled: AtomicU64,
    orders_modified: AtomicU64,
    match_batches: AtomicU64,
    trades: AtomicU64,
    matched_quantity: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Orders accepted by a book
    pub orders_added: u64,
    /// Orders refused by validation or duplicate checks
    pub orders_rejected: u64,
    /// Successful cancels
    pub orders_cancelled: u64,
    /// Successful modifies
    pub orders_modified: u64,
    /// Non-empty batches delivered to listeners
    pub match_batches: u64,
    /// Individual fills
    pub trades: u64,
    /// Sum of filled quantity
    pub matched_quantity: u64,
}

impl EngineStats {
    pub(crate) fn record_added(&self) {
        self.orders_added.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("orderbook_orders_added_total").increment(1);
    }

    pub(crate) fn record_rejected(&self) {
        self.orders_rejected.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("orderbook_orders_rejected_total").increment(1);
    }

    pub(crate) fn record_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("orderbook_orders_cancelled_total").increment(1);
    }

    pub(crate) fn record_modified(&self) {
        self.orders_modified.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::counter!("orderbook_orders_modified_total").increment(1);
    }

    pub(crate) fn record_batch(&self, trade_result: &TradeResult) {
        let trades = trade_result.trade_count() as u64;
        let quantity = trade_result.executed_quantity();
        self.match_batches.fetch_add(1, Ordering::Relaxed);
        self.trades.fetch_add(trades, Ordering::Relaxed);
        self.matched_quantity.fetch_add(quantity, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("orderbook_trades_total", "symbol" => trade_result.symbol.clone())
                .increment(trades);
            metrics::counter!("orderbook_matched_quantity_total", "symbol" => trade_result.symbol.clone())
                .increment(quantity);
        }
    }

    /// Read all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            orders_added: self.orders_added.load(Ordering::Relaxed),
            orders_rejected: self.orders_rejected.load(Ordering::Relaxed),
            orders_cancelled: self.orders_cancelled.load(Ordering::Relaxed),
            orders_modified: self.orders_modified.load(Ordering::Relaxed),
            match_batches: self.match_batches.load(Ordering::Relaxed),
            trades: self.trades.load(Ordering::Relaxed),
            matched_quantity: self.matched_quantity.load(Ordering::Relaxed),
        }
    }
}
