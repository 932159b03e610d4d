/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/
use crate::orderbook::match_result::{MatchResult, total_quantity};
use serde::Serialize;
use std::sync::Arc;

/// One batch of fills produced by a single `add_order` or `modify_order`
/// call (or a single iceberg slice), tagged with the book's symbol.
#[derive(Debug, Clone, Serialize)]
pub struct TradeResult {
    /// The symbol this batch belongs to
    pub symbol: String,
    /// Fills in execution order: best price first, FIFO within a level
    pub matches: Vec<MatchResult>,
}

impl TradeResult {
    /// Create a new `TradeResult`
    pub fn new(symbol: String, matches: Vec<MatchResult>) -> Self {
        Self { symbol, matches }
    }

    /// Total executed quantity across the batch
    #[must_use]
    #[inline]
    pub fn executed_quantity(&self) -> u64 {
        total_quantity(&self.matches)
    }

    /// Number of individual fills in the batch
    #[must_use]
    #[inline]
    pub fn trade_count(&self) -> usize {
        self.matches.len()
    }
}

/// Callback invoked with every non-empty batch of fills.
///
/// Listeners run synchronously on the caller's thread while the book lock is
/// held. They must not block and must never call back into the same book.
pub type TradeListener = Arc<dyn Fn(&TradeResult) + Send + Sync>;
