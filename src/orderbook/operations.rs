//! Order book operations like adding, modifying and canceling orders

use super::book::{BookState, OrderBook};
use super::error::OrderBookError;
use super::iceberg::IcebergManager;
use super::match_result::MatchResult;
use super::order::{Order, OrderType, Side, TimeInForce};
use crate::utils::current_time_millis;
use std::sync::PoisonError;
use tracing::{trace, warn};

/// Reject orders the book cannot accept, before any state is touched.
pub(super) fn validate(order: &Order) -> Result<(), OrderBookError> {
    if order.quantity == 0 {
        return Err(OrderBookError::InvalidQuantity {
            order_id: order.id.clone(),
            quantity: order.quantity,
        });
    }
    match order.order_type {
        OrderType::Market => Ok(()),
        OrderType::Limit | OrderType::Iceberg if order.price == 0 => {
            Err(OrderBookError::InvalidPrice {
                order_id: order.id.clone(),
                price: order.price,
            })
        }
        OrderType::Iceberg if order.visible_quantity == 0 => {
            Err(OrderBookError::InvalidQuantity {
                order_id: order.id.clone(),
                quantity: order.visible_quantity,
            })
        }
        OrderType::Limit | OrderType::Iceberg => Ok(()),
    }
}

impl OrderBook {
    /// Check an order against the book's admission rules without submitting it.
    ///
    /// # Errors
    /// [`OrderBookError::InvalidQuantity`] for a zero quantity or iceberg slice,
    /// [`OrderBookError::InvalidPrice`] for a limit or iceberg price of zero.
    pub fn validate(order: &Order) -> Result<(), OrderBookError> {
        validate(order)
    }

    /// Submit an order and return the fills it produced, in execution order.
    ///
    /// Limit and market orders are matched immediately and their time-in-force
    /// applied. Iceberg orders are handed to the iceberg manager: the call
    /// returns no fills, while the first slice is submitted straight away and
    /// reports its fills through the trade listeners.
    ///
    /// # Errors
    /// [`OrderBookError::InvalidQuantity`], [`OrderBookError::InvalidPrice`],
    /// [`OrderBookError::DuplicateOrderId`] if the ID is already resting, and
    /// [`OrderBookError::IcebergDisabled`] for icebergs on a plain book.
    pub fn add_order(&self, order: Order) -> Result<Vec<MatchResult>, OrderBookError> {
        validate(&order)?;
        trace!("Order book {}: Adding order {}", self.symbol, order);

        if order.order_type == OrderType::Iceberg {
            self.add_iceberg(order)?;
            return Ok(Vec::new());
        }

        let mut state = self.lock_state();
        if self.id_in_use(&state, &order.id) {
            return Err(OrderBookError::DuplicateOrderId(order.id));
        }
        let matches = state.execute(order);
        self.notify(&matches);
        Ok(matches)
    }

    /// Whether `order_id` names a resting order or an active iceberg parent.
    /// Called with the state lock held; takes the iceberg lock after it.
    fn id_in_use(&self, state: &BookState, order_id: &str) -> bool {
        state.index.contains_key(order_id)
            || self
                .iceberg
                .as_ref()
                .is_some_and(|iceberg| iceberg.contains(order_id))
    }

    /// Add a limit order to the book.
    pub fn add_limit_order(
        &self,
        id: &str,
        side: Side,
        price: u128,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Vec<MatchResult>, OrderBookError> {
        self.add_order(Order::limit(
            id,
            self.symbol.as_str(),
            side,
            price,
            quantity,
            time_in_force,
        ))
    }

    /// Submit a market order. Any unfilled remainder is discarded.
    pub fn submit_market_order(
        &self,
        id: &str,
        side: Side,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Vec<MatchResult>, OrderBookError> {
        self.add_order(Order::market(
            id,
            self.symbol.as_str(),
            side,
            quantity,
            time_in_force,
        ))
    }

    /// Add an iceberg order of `quantity` in total, shown `visible_quantity` at a time.
    pub fn add_iceberg_order(
        &self,
        id: &str,
        side: Side,
        price: u128,
        quantity: u64,
        visible_quantity: u64,
        time_in_force: TimeInForce,
    ) -> Result<Vec<MatchResult>, OrderBookError> {
        self.add_order(Order::iceberg(
            id,
            self.symbol.as_str(),
            side,
            price,
            quantity,
            visible_quantity,
            time_in_force,
        ))
    }

    fn add_iceberg(&self, order: Order) -> Result<(), OrderBookError> {
        let Some(iceberg) = self.iceberg.as_ref() else {
            return Err(OrderBookError::IcebergDisabled { order_id: order.id });
        };
        let _gate = self
            .iceberg_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slice = {
            let state = self.lock_state();
            if state.index.contains_key(&order.id) {
                return Err(OrderBookError::DuplicateOrderId(order.id));
            }
            iceberg.add_iceberg(order)?
        };
        self.submit_slice(iceberg, slice);
        Ok(())
    }

    /// Match and rest one slice. A slice whose ID is already taken is
    /// renamed before it enters the book, so its quantity is never lost.
    fn submit_slice(&self, iceberg: &IcebergManager, mut slice: Order) {
        let mut state = self.lock_state();
        while self.id_in_use(&state, &slice.id) {
            let parent_id = slice.parent_id.as_deref().unwrap_or(&slice.id);
            let fresh = iceberg.next_slice_id(parent_id);
            warn!(
                "Order book {}: slice ID {} taken, using {}",
                self.symbol, slice.id, fresh
            );
            slice.id = fresh;
        }
        let matches = state.execute(slice);
        self.notify(&matches);
    }

    /// Release one slice from every active iceberg parent.
    ///
    /// Returns the number of slices submitted. Books without iceberg support
    /// always return 0.
    pub fn run_iceberg_tick(&self) -> usize {
        let Some(iceberg) = self.iceberg.as_ref() else {
            return 0;
        };
        let _gate = self
            .iceberg_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slices = iceberg.slice_all();
        let count = slices.len();
        for slice in slices {
            self.submit_slice(iceberg, slice);
        }
        count
    }

    /// Cancel a resting order. Returns `false` if the ID is unknown.
    ///
    /// An iceberg parent ID is also accepted: the parent stops slicing and
    /// its resting slices are removed.
    pub fn cancel_order(&self, order_id: &str) -> bool {
        trace!("Order book {}: Cancelling order {}", self.symbol, order_id);
        if self.lock_state().remove(order_id).is_some() {
            return true;
        }

        let Some(iceberg) = self.iceberg.as_ref() else {
            return false;
        };
        let _gate = self
            .iceberg_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let parent_active = iceberg.cancel_parent(order_id);

        let mut state = self.lock_state();
        let slice_ids: Vec<String> = state
            .index
            .iter()
            .filter(|(_, loc)| loc.parent_id.as_deref() == Some(order_id))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &slice_ids {
            state.remove(id);
        }
        if !parent_active && slice_ids.is_empty() {
            return false;
        }
        trace!(
            "Order book {}: Cancelled iceberg {} with {} resting slices",
            self.symbol,
            order_id,
            slice_ids.len()
        );
        true
    }

    /// Change the price and/or quantity of a resting order.
    ///
    /// A pure quantity decrease at the same price is applied in place and keeps
    /// time priority. An unchanged price and quantity is a no-op. Anything else
    /// cancels the order and resubmits it under the same ID, at the back of its
    /// new level, returning whatever fills the resubmission produces.
    ///
    /// # Errors
    /// [`OrderBookError::OrderNotFound`] if the ID is not resting,
    /// [`OrderBookError::InvalidQuantity`] for a zero quantity and
    /// [`OrderBookError::InvalidPrice`] for a zero price.
    pub fn modify_order(
        &self,
        order_id: &str,
        new_price: u128,
        new_quantity: u64,
    ) -> Result<Vec<MatchResult>, OrderBookError> {
        if new_quantity == 0 {
            return Err(OrderBookError::InvalidQuantity {
                order_id: order_id.to_string(),
                quantity: new_quantity,
            });
        }
        self.modify_order_with(order_id, new_price, |_| new_quantity)
    }

    /// Like [`OrderBook::modify_order`], with the new quantity computed from
    /// the order's resting quantity while the book is locked.
    ///
    /// Fills that reach the order before the lock is taken are already
    /// reflected in the quantity `new_quantity` receives.
    ///
    /// # Errors
    /// As [`OrderBook::modify_order`]; a computed quantity of zero is
    /// [`OrderBookError::InvalidQuantity`].
    pub fn modify_order_with<F>(
        &self,
        order_id: &str,
        new_price: u128,
        new_quantity: F,
    ) -> Result<Vec<MatchResult>, OrderBookError>
    where
        F: FnOnce(u64) -> u64,
    {
        if new_price == 0 {
            return Err(OrderBookError::InvalidPrice {
                order_id: order_id.to_string(),
                price: new_price,
            });
        }

        let mut state = self.lock_state();
        let (side, price, quantity) = match state.get(order_id) {
            Some(order) => (order.side, order.price, order.quantity),
            None => return Err(OrderBookError::OrderNotFound(order_id.to_string())),
        };
        let new_quantity = new_quantity(quantity);
        trace!(
            "Order book {}: Modifying order {} to {}@{}",
            self.symbol, order_id, new_quantity, new_price
        );
        if new_quantity == 0 {
            return Err(OrderBookError::InvalidQuantity {
                order_id: order_id.to_string(),
                quantity: new_quantity,
            });
        }

        if new_price == price {
            if new_quantity == quantity {
                return Ok(Vec::new());
            }
            if new_quantity < quantity {
                if let Some(level) = state.side_mut(side).levels.get_mut(&price) {
                    level.reduce_quantity(order_id, new_quantity);
                }
                return Ok(Vec::new());
            }
        }

        let Some(mut order) = state.remove(order_id) else {
            return Err(OrderBookError::OrderNotFound(order_id.to_string()));
        };
        order.price = new_price;
        order.quantity = new_quantity;
        order.timestamp = current_time_millis();

        let matches = state.execute(order);
        self.notify(&matches);
        Ok(matches)
    }
}
