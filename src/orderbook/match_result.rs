//! Immutable trade records produced by the matching engine.

use super::order::{Order, Side};
use serde::{Deserialize, Serialize};

/// A single fill between a resting order and an aggressor.
///
/// The trade price is always the resting order's price, so any price
/// improvement goes to the aggressor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// ID of the order that was already resting in the book.
    pub order_id: String,
    /// ID of the incoming (aggressor) order.
    pub counter_order_id: String,
    /// Execution price.
    pub price: u128,
    /// Executed quantity.
    pub quantity: u64,
    /// Side of the resting order.
    pub side: Side,
    /// Iceberg parent of the resting order, when it is a slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_parent_id: Option<String>,
    /// Iceberg parent of the aggressor, when it is a slice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_parent_id: Option<String>,
}

impl MatchResult {
    pub(crate) fn new(resting: &Order, aggressor: &Order, quantity: u64) -> Self {
        Self {
            order_id: resting.id.clone(),
            counter_order_id: aggressor.id.clone(),
            price: resting.price,
            quantity,
            side: resting.side,
            order_parent_id: resting.parent_id.clone(),
            counter_parent_id: aggressor.parent_id.clone(),
        }
    }

    /// The resting order's ID, resolved to its iceberg parent if it is a slice.
    #[must_use]
    pub fn resting_owner_id(&self) -> &str {
        self.order_parent_id.as_deref().unwrap_or(&self.order_id)
    }

    /// The aggressor's ID, resolved to its iceberg parent if it is a slice.
    #[must_use]
    pub fn aggressor_owner_id(&self) -> &str {
        self.counter_parent_id
            .as_deref()
            .unwrap_or(&self.counter_order_id)
    }

    /// Notional value of the fill (price × quantity), saturating.
    #[must_use]
    #[inline]
    pub fn notional(&self) -> u128 {
        self.price.saturating_mul(self.quantity as u128)
    }
}

/// Sum of executed quantity across a batch of results.
#[must_use]
pub fn total_quantity(results: &[MatchResult]) -> u64 {
    results
        .iter()
        .fold(0u64, |acc, r| acc.saturating_add(r.quantity))
}
