//! Contains the core matching engine logic for the order book.
//!
//! Matching walks the counter side from the best price outwards, consuming
//! each price level front to back. Fills always execute at the resting
//! order's price.

use super::book::{BookState, OrderBook, OrderLocation};
use super::match_result::MatchResult;
use super::order::{Order, OrderType, Side, TimeInForce};
use tracing::trace;

impl BookState {
    /// Quantity an order could fill right now, without touching the book.
    ///
    /// Used as the dry run behind fill-or-kill orders.
    pub(super) fn peek_match(&self, side: Side, quantity: u64, limit_price: u128) -> u64 {
        let counter = self.side(side.opposite());
        let mut matched_quantity = 0u64;

        for price in counter.heap.iter() {
            if matched_quantity >= quantity {
                break;
            }
            let crosses = match side {
                Side::Buy => limit_price >= price,
                Side::Sell => limit_price <= price,
            };
            if !crosses {
                break;
            }
            let available_quantity = counter.depth_at(price);
            let needed_quantity = quantity.saturating_sub(matched_quantity);
            matched_quantity = matched_quantity.saturating_add(needed_quantity.min(available_quantity));
        }

        matched_quantity
    }

    /// Match `order` against the counter side, decrementing both sides in place.
    ///
    /// Stops when the order is filled or the best counter price no longer
    /// crosses. Fully consumed resting orders leave the ID index; a partially
    /// filled one goes back to the front of its level.
    pub(super) fn match_order(&mut self, order: &mut Order) -> Vec<MatchResult> {
        let mut results = Vec::new();
        let counter_side = order.side.opposite();

        while order.quantity > 0 {
            let counter = self.side_mut(counter_side);
            let Some(best_price) = counter.best_price() else {
                break;
            };
            if !order.crosses(best_price) {
                break;
            }

            debug_assert!(
                counter.levels.contains_key(&best_price),
                "heap price {best_price} has no level"
            );
            let Some(level) = counter.levels.get_mut(&best_price) else {
                counter.heap.remove(best_price);
                continue;
            };

            let mut filled_ids = Vec::new();
            while order.quantity > 0 {
                let Some(mut resting) = level.pop_front() else {
                    break;
                };
                let match_qty = order.quantity.min(resting.quantity);
                order.quantity -= match_qty;
                resting.quantity -= match_qty;
                results.push(MatchResult::new(&resting, order, match_qty));

                if resting.quantity > 0 {
                    level.push_front(resting);
                } else {
                    filled_ids.push(resting.id);
                }
            }
            if level.is_empty() {
                counter.drop_level(best_price);
            }
            for id in filled_ids {
                self.index.remove(&id);
            }
        }

        results
    }

    /// Append an order to the back of its level and index it.
    pub(super) fn rest(&mut self, order: Order) {
        debug_assert!(order.quantity > 0);
        self.index.insert(
            order.id.clone(),
            OrderLocation {
                side: order.side,
                price: order.price,
                parent_id: order.parent_id.clone(),
            },
        );
        self.side_mut(order.side).insert(order);
    }

    /// Remove a resting order from both its level and the index.
    pub(super) fn remove(&mut self, order_id: &str) -> Option<Order> {
        let location = self.index.remove(order_id)?;
        let order = self
            .side_mut(location.side)
            .remove(order_id, location.price);
        debug_assert!(order.is_some(), "indexed order {order_id} missing from its level");
        order
    }

    /// Run one validated order through matching and its time-in-force policy.
    ///
    /// Market orders take the extreme price for their side and never rest.
    /// A fill-or-kill order that cannot fill completely leaves the book
    /// untouched and yields no results.
    pub(super) fn execute(&mut self, mut order: Order) -> Vec<MatchResult> {
        if order.order_type == OrderType::Market {
            order.price = match order.side {
                Side::Buy => u128::MAX,
                Side::Sell => 0,
            };
        }

        if order.time_in_force == TimeInForce::Fok {
            let available = self.peek_match(order.side, order.quantity, order.price);
            if available < order.quantity {
                trace!(
                    "FOK order {} killed: {} of {} available",
                    order.id, available, order.quantity
                );
                return Vec::new();
            }
        }

        let results = self.match_order(&mut order);

        if order.quantity > 0 {
            if order.order_type != OrderType::Market && order.time_in_force.is_resting() {
                trace!(
                    "Order {} resting {} at {}",
                    order.id, order.quantity, order.price
                );
                self.rest(order);
            } else {
                trace!(
                    "Order {} discarding unfilled {}",
                    order.id, order.quantity
                );
            }
        }

        #[cfg(debug_assertions)]
        {
            self.bids.check_consistency();
            self.asks.check_consistency();
        }

        results
    }
}

impl OrderBook {
    /// Quantity an order of `side` and `quantity` could fill against the
    /// current book at `price_limit` or better. `None` means any price.
    pub fn peek_match(&self, side: Side, quantity: u64, price_limit: Option<u128>) -> u64 {
        let limit = price_limit.unwrap_or(match side {
            Side::Buy => u128::MAX,
            Side::Sell => 0,
        });
        self.lock_state().peek_match(side, quantity, limit)
    }
}
