//! OMS error types

use crate::orderbook::OrderBookError;
use crate::oms::model::OrderStatus;
use thiserror::Error;

/// Errors returned by the order-management layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OmsError {
    /// The gateway ID has been seen before.
    #[error("duplicate order: gateway id {0} already in use")]
    DuplicateOrder(String),

    /// No order is known under this gateway ID.
    #[error("gateway id not found: {0}")]
    GatewayIdNotFound(String),

    /// No order is known under this internal ID.
    #[error("order not found: {0}")]
    OrderNotFound(String),

    /// The request is not allowed in the order's current status.
    #[error("order {order_id} is {status}, request not allowed")]
    InvalidOrderStatus {
        /// The order concerned
        order_id: String,
        /// Its status when the request arrived
        status: OrderStatus,
    },

    /// The engine no longer holds the order.
    #[error("cancel rejected for order {0}: not resting in the book")]
    CancelRejected(String),

    /// The requested quantity leaves nothing to work.
    #[error("invalid quantity {quantity} for order {order_id}")]
    InvalidQuantity {
        /// The order concerned
        order_id: String,
        /// The requested total quantity
        quantity: u64,
    },

    /// A risk rule refused the order.
    #[error("order {order_id} rejected by {rule}: {reason}")]
    RiskRejected {
        /// The order concerned
        order_id: String,
        /// Name of the rule that fired
        rule: &'static str,
        /// Why it fired
        reason: String,
    },

    /// The matching engine refused the request.
    #[error(transparent)]
    Engine(#[from] OrderBookError),

    /// An event could not be published.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
