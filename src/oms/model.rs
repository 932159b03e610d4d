//! Order records tracked by the OMS and the requests that drive them.

use crate::orderbook::order::{Order, OrderType, Side, TimeInForce};
use crate::utils::current_time_millis;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle state of an OMS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted by the OMS, not yet acknowledged by the engine.
    PendingNew,
    /// Acknowledged; nothing filled yet.
    New,
    /// Some quantity filled, some still working.
    PartiallyFilled,
    /// Fully filled.
    Filled,
    /// Cancelled by request or by its time-in-force.
    Canceled,
    /// Price or quantity replaced.
    Replaced,
    /// Refused by validation, risk checks or the engine.
    Rejected,
}

impl OrderStatus {
    /// Whether a cancel request may be applied.
    #[must_use]
    pub fn can_cancel(self) -> bool {
        matches!(
            self,
            OrderStatus::New | OrderStatus::PartiallyFilled | OrderStatus::Replaced
        )
    }

    /// Whether a cancel/replace request may be applied.
    #[must_use]
    pub fn can_modify(self) -> bool {
        self.can_cancel()
    }

    /// No further transitions happen from a terminal status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What triggered the latest execution report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecType {
    /// Order received.
    PendingNew,
    /// Order acknowledged.
    New,
    /// A fill.
    Trade,
    /// Order cancelled.
    Canceled,
    /// Order replaced.
    Replaced,
    /// Order rejected.
    Rejected,
}

/// A new-order intent as received from a gateway session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOrderRequest {
    /// Client-assigned ID, unique per session.
    pub gateway_id: String,
    /// Trading account.
    pub account: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Limit, market or iceberg.
    pub order_type: OrderType,
    /// Time-in-force.
    pub time_in_force: TimeInForce,
    /// Limit price in ticks; ignored for market orders.
    pub price: u128,
    /// Total quantity.
    pub quantity: u64,
    /// Iceberg slice size; zero otherwise.
    #[serde(default)]
    pub visible_quantity: u64,
    /// Client transaction time, ms since the Unix epoch.
    pub transact_time: u64,
}

impl AddOrderRequest {
    /// A limit order request.
    pub fn limit(
        gateway_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: u128,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            gateway_id: gateway_id.into(),
            account: String::new(),
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            time_in_force,
            price,
            quantity,
            visible_quantity: 0,
            transact_time: current_time_millis(),
        }
    }

    /// A market order request.
    pub fn market(
        gateway_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: u64,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            order_type: OrderType::Market,
            ..Self::limit(gateway_id, symbol, side, 0, quantity, time_in_force)
        }
    }

    /// An iceberg order request.
    pub fn iceberg(
        gateway_id: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        price: u128,
        quantity: u64,
        visible_quantity: u64,
    ) -> Self {
        Self {
            order_type: OrderType::Iceberg,
            visible_quantity,
            ..Self::limit(gateway_id, symbol, side, price, quantity, TimeInForce::Gtc)
        }
    }

    /// Set the trading account.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }
}

/// A cancel intent referencing the order's current gateway ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    /// New gateway ID for this request.
    pub gateway_id: String,
    /// Gateway ID of the order being cancelled.
    pub orig_gateway_id: String,
}

impl CancelOrderRequest {
    /// Build a cancel request.
    pub fn new(gateway_id: impl Into<String>, orig_gateway_id: impl Into<String>) -> Self {
        Self {
            gateway_id: gateway_id.into(),
            orig_gateway_id: orig_gateway_id.into(),
        }
    }
}

/// A cancel/replace intent.
///
/// `new_quantity` is the new total order quantity, filled quantity included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyOrderRequest {
    /// New gateway ID for this request.
    pub gateway_id: String,
    /// Gateway ID of the order being replaced.
    pub orig_gateway_id: String,
    /// Replacement price in ticks.
    pub new_price: u128,
    /// Replacement total quantity.
    pub new_quantity: u64,
}

impl ModifyOrderRequest {
    /// Build a cancel/replace request.
    pub fn new(
        gateway_id: impl Into<String>,
        orig_gateway_id: impl Into<String>,
        new_price: u128,
        new_quantity: u64,
    ) -> Self {
        Self {
            gateway_id: gateway_id.into(),
            orig_gateway_id: orig_gateway_id.into(),
            new_price,
            new_quantity,
        }
    }
}

/// The OMS view of one order across its whole lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OmsOrder {
    /// Internal ID, also the engine order ID.
    pub order_id: String,
    /// Current gateway ID.
    pub gateway_id: String,
    /// Gateway ID this one replaced, if any.
    pub orig_gateway_id: Option<String>,
    pub account: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: u128,
    /// Total order quantity.
    pub quantity: u64,
    pub visible_quantity: u64,
    pub transact_time: u64,
    pub status: OrderStatus,
    pub exec_type: ExecType,
    /// ID of the latest execution report.
    pub exec_id: String,
    /// ID of the report before that.
    pub last_exec_id: Option<String>,
    pub cum_quantity: u64,
    pub leaves_quantity: u64,
    pub last_quantity: u64,
    pub last_price: u128,
    /// Sum of price × quantity over all fills.
    pub notional: u128,
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl OmsOrder {
    /// A fresh `PendingNew` record for an inbound request.
    pub fn from_request(request: &AddOrderRequest) -> Self {
        Self {
            order_id: new_id(),
            gateway_id: request.gateway_id.clone(),
            orig_gateway_id: None,
            account: request.account.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            time_in_force: request.time_in_force,
            price: request.price,
            quantity: request.quantity,
            visible_quantity: request.visible_quantity,
            transact_time: request.transact_time,
            status: OrderStatus::PendingNew,
            exec_type: ExecType::PendingNew,
            exec_id: new_id(),
            last_exec_id: None,
            cum_quantity: 0,
            leaves_quantity: request.quantity,
            last_quantity: 0,
            last_price: 0,
            notional: 0,
        }
    }

    /// The engine order this record submits.
    pub fn to_engine_order(&self) -> Order {
        match self.order_type {
            OrderType::Limit => Order::limit(
                self.order_id.as_str(),
                self.symbol.as_str(),
                self.side,
                self.price,
                self.leaves_quantity,
                self.time_in_force,
            ),
            OrderType::Market => Order::market(
                self.order_id.as_str(),
                self.symbol.as_str(),
                self.side,
                self.leaves_quantity,
                self.time_in_force,
            ),
            OrderType::Iceberg => Order::iceberg(
                self.order_id.as_str(),
                self.symbol.as_str(),
                self.side,
                self.price,
                self.leaves_quantity,
                self.visible_quantity,
                self.time_in_force,
            ),
        }
    }

    /// Move to a new status and issue a new execution ID.
    pub fn transition(&mut self, status: OrderStatus, exec_type: ExecType) {
        self.status = status;
        self.exec_type = exec_type;
        self.last_exec_id = Some(std::mem::replace(&mut self.exec_id, new_id()));
    }

    /// Apply one fill.
    pub fn apply_fill(&mut self, price: u128, quantity: u64) {
        self.cum_quantity = self.cum_quantity.saturating_add(quantity);
        self.leaves_quantity = self.leaves_quantity.saturating_sub(quantity);
        self.last_quantity = quantity;
        self.last_price = price;
        self.notional = self
            .notional
            .saturating_add(price.saturating_mul(u128::from(quantity)));
        let status = if self.leaves_quantity == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.transition(status, ExecType::Trade);
    }

    /// Cancel whatever has not been filled.
    pub fn cancel_remaining(&mut self) {
        self.leaves_quantity = 0;
        self.transition(OrderStatus::Canceled, ExecType::Canceled);
    }

    /// Average fill price in ticks, rounded down.
    #[must_use]
    pub fn avg_price(&self) -> Option<u128> {
        (self.cum_quantity > 0).then(|| self.notional / u128::from(self.cum_quantity))
    }
}
