//! FIFO queue of resting orders at a single price.

use super::order::Order;
use std::collections::VecDeque;

/// Orders resting at one exact price on one side of a book.
///
/// Insertion order is time priority: new orders join the back, matching
/// consumes from the front. Every order held here has `quantity > 0`.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: u128,
    orders: VecDeque<Order>,
    total_quantity: u64,
}

impl PriceLevel {
    /// Create an empty level at `price`.
    pub fn new(price: u128) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_quantity: 0,
        }
    }

    /// Price of this level.
    #[must_use]
    #[inline]
    pub fn price(&self) -> u128 {
        self.price
    }

    /// Sum of remaining quantity across the queue.
    #[must_use]
    #[inline]
    pub fn total_quantity(&self) -> u64 {
        self.total_quantity
    }

    /// Number of orders in the queue.
    #[must_use]
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Returns `true` if no orders remain.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Append an order at the back (lowest time priority).
    pub fn push_back(&mut self, order: Order) {
        debug_assert!(order.quantity > 0, "resting order with zero quantity");
        self.total_quantity = self.total_quantity.saturating_add(order.quantity);
        self.orders.push_back(order);
    }

    /// Put an order back at the front, keeping its priority.
    pub fn push_front(&mut self, order: Order) {
        debug_assert!(order.quantity > 0, "resting order with zero quantity");
        self.total_quantity = self.total_quantity.saturating_add(order.quantity);
        self.orders.push_front(order);
    }

    /// Take the order with the highest time priority.
    pub fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_quantity = self.total_quantity.saturating_sub(order.quantity);
        Some(order)
    }

    /// Peek at the order with the highest time priority.
    #[must_use]
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Remove an order by ID. The scan is positional.
    pub fn remove(&mut self, order_id: &str) -> Option<Order> {
        let position = self.position(order_id)?;
        let order = self.orders.remove(position)?;
        self.total_quantity = self.total_quantity.saturating_sub(order.quantity);
        Some(order)
    }

    /// Reduce an order's quantity without touching its queue position.
    ///
    /// Returns the previous quantity, or `None` if the order is not here.
    pub fn reduce_quantity(&mut self, order_id: &str, new_quantity: u64) -> Option<u64> {
        let position = self.position(order_id)?;
        let order = self.orders.get_mut(position)?;
        let previous = order.quantity;
        debug_assert!(new_quantity > 0 && new_quantity < previous);
        order.quantity = new_quantity;
        self.total_quantity = self
            .total_quantity
            .saturating_sub(previous)
            .saturating_add(new_quantity);
        Some(previous)
    }

    /// Look up an order by ID.
    #[must_use]
    pub fn get(&self, order_id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    /// Queue position of an order, 0 being the front.
    #[must_use]
    pub fn position(&self, order_id: &str) -> Option<usize> {
        self.orders.iter().position(|o| o.id == order_id)
    }

    /// Iterate orders front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}
