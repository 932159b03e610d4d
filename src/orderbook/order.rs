//! Order types consumed by the matching engine.

use crate::utils::current_time_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Bid side.
    Buy,
    /// Ask side.
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Kind of order accepted by the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Executes at the limit price or better; the remainder may rest.
    Limit,
    /// Accepts any counter price; never rests.
    Market,
    /// Large order exposed through periodic visible slices.
    Iceberg,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Iceberg => write!(f, "ICEBERG"),
        }
    }
}

/// Time-in-force policy applied once matching finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Rests for the trading day.
    #[default]
    Day,
    /// Immediate-or-cancel: the unmatched remainder is discarded.
    Ioc,
    /// Fill-or-kill: fills completely or does nothing.
    Fok,
    /// Good-till-cancel: rests until cancelled.
    Gtc,
}

impl TimeInForce {
    /// Returns `true` when the unmatched remainder may rest in the book.
    #[must_use]
    #[inline]
    pub fn is_resting(self) -> bool {
        matches!(self, TimeInForce::Day | TimeInForce::Gtc)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::Day => write!(f, "DAY"),
            TimeInForce::Ioc => write!(f, "IOC"),
            TimeInForce::Fok => write!(f, "FOK"),
            TimeInForce::Gtc => write!(f, "GTC"),
        }
    }
}

/// A resting or incoming order.
///
/// `quantity` is the remaining quantity and is decremented in place while
/// the order matches. Prices are scaled integers (ticks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Caller-assigned identifier, unique within a book.
    pub id: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Limit price. Overridden for market orders before matching.
    pub price: u128,
    /// Remaining quantity.
    pub quantity: u64,
    /// Limit, market or iceberg.
    pub order_type: OrderType,
    /// Time-in-force policy.
    pub time_in_force: TimeInForce,
    /// Iceberg only: size of each visible slice.
    pub visible_quantity: u64,
    /// Iceberg only: quantity not yet exposed to the book.
    pub(crate) hidden_quantity: u64,
    /// Set on iceberg slices to the parent order's ID.
    pub parent_id: Option<String>,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Order {
    /// Creates a limit order.
    pub fn limit(
        id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: u128,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            side,
            price,
            quantity,
            order_type: OrderType::Limit,
            time_in_force,
            visible_quantity: 0,
            hidden_quantity: 0,
            parent_id: None,
            timestamp: current_time_millis(),
        }
    }

    /// Creates a market order. The price is set when the order is matched.
    pub fn market(
        id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            order_type: OrderType::Market,
            ..Self::limit(id, symbol, side, 0, quantity, time_in_force)
        }
    }

    /// Creates an iceberg order of `quantity` in total, shown `visible_quantity`
    /// at a time.
    pub fn iceberg(
        id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: u128,
        quantity: u64,
        visible_quantity: u64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            order_type: OrderType::Iceberg,
            visible_quantity,
            ..Self::limit(id, symbol, side, price, quantity, time_in_force)
        }
    }

    /// Quantity of an iceberg parent that has not been sliced into the book yet.
    #[must_use]
    #[inline]
    pub fn hidden_quantity(&self) -> u64 {
        self.hidden_quantity
    }

    /// Returns `true` if this order is a slice of an iceberg parent.
    #[must_use]
    #[inline]
    pub fn is_slice(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Whether the order crosses a resting counter price.
    #[must_use]
    #[inline]
    pub fn crosses(&self, counter_price: u128) -> bool {
        match self.side {
            Side::Buy => self.price >= counter_price,
            Side::Sell => self.price <= counter_price,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}@{} {}",
            self.id,
            self.symbol,
            self.order_type,
            self.side,
            self.quantity,
            self.price,
            self.time_in_force
        )
    }
}
