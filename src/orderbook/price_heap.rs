//! Best-price index for one side of a book.
//!
//! Backed by an ordered set so that both the best price and an arbitrary
//! price can be removed in O(log n) without a separate existence index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which end of the price range is most aggressive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeapOrdering {
    /// Highest price first (bids).
    Max,
    /// Lowest price first (asks).
    Min,
}

/// A set of distinct prices ordered by aggressiveness.
#[derive(Debug, Clone)]
pub struct PriceHeap {
    prices: BTreeSet<u128>,
    ordering: HeapOrdering,
}

impl PriceHeap {
    /// Creates an empty heap with the given ordering.
    pub fn new(ordering: HeapOrdering) -> Self {
        Self {
            prices: BTreeSet::new(),
            ordering,
        }
    }

    /// Max-ordered heap for the buy side.
    pub fn for_bids() -> Self {
        Self::new(HeapOrdering::Max)
    }

    /// Min-ordered heap for the sell side.
    pub fn for_asks() -> Self {
        Self::new(HeapOrdering::Min)
    }

    /// Inserts `price` if absent. Returns `true` when it was inserted.
    pub fn push(&mut self, price: u128) -> bool {
        self.prices.insert(price)
    }

    /// Removes and returns the most aggressive price.
    pub fn pop(&mut self) -> Option<u128> {
        match self.ordering {
            HeapOrdering::Max => self.prices.pop_last(),
            HeapOrdering::Min => self.prices.pop_first(),
        }
    }

    /// Returns the most aggressive price without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<u128> {
        match self.ordering {
            HeapOrdering::Max => self.prices.last().copied(),
            HeapOrdering::Min => self.prices.first().copied(),
        }
    }

    /// Removes a specific price. Returns `true` if it was present.
    pub fn remove(&mut self, price: u128) -> bool {
        self.prices.remove(&price)
    }

    /// Returns `true` if `price` is present.
    #[must_use]
    #[inline]
    pub fn contains(&self, price: u128) -> bool {
        self.prices.contains(&price)
    }

    /// Number of distinct prices.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns `true` if no prices remain.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// The heap's ordering.
    #[must_use]
    #[inline]
    pub fn ordering(&self) -> HeapOrdering {
        self.ordering
    }

    /// Iterates prices from most to least aggressive.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u128> + '_> {
        match self.ordering {
            HeapOrdering::Max => Box::new(self.prices.iter().rev().copied()),
            HeapOrdering::Min => Box::new(self.prices.iter().copied()),
        }
    }
}
