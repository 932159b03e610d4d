//! Order book error types

use std::fmt;

/// Errors that can occur within the OrderBook
///
/// Business outcomes such as a fill-or-kill shortfall are not errors; they
/// are reported as an empty result set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderBookError {
    /// Order not found in the book
    OrderNotFound(String),

    /// Limit or iceberg order submitted without a usable price
    InvalidPrice {
        /// The offending order
        order_id: String,
        /// The submitted price
        price: u128,
    },

    /// Order quantity (or iceberg slice size) is zero
    InvalidQuantity {
        /// The offending order
        order_id: String,
        /// The submitted quantity
        quantity: u64,
    },

    /// An order with the same ID is already resting in this book
    DuplicateOrderId(String),

    /// Iceberg order submitted to a book without an iceberg manager
    IcebergDisabled {
        /// The rejected iceberg order
        order_id: String,
    },

    /// Operation not permitted for specified order
    InvalidOperation {
        /// Description of the error
        message: String,
    },
}

impl fmt::Display for OrderBookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBookError::OrderNotFound(id) => write!(f, "Order not found: {id}"),
            OrderBookError::InvalidPrice { order_id, price } => {
                write!(f, "Invalid price {price} for order {order_id}")
            }
            OrderBookError::InvalidQuantity { order_id, quantity } => {
                write!(f, "Invalid quantity {quantity} for order {order_id}")
            }
            OrderBookError::DuplicateOrderId(id) => write!(f, "Duplicate order id: {id}"),
            OrderBookError::IcebergDisabled { order_id } => {
                write!(
                    f,
                    "Iceberg order {order_id} rejected: iceberg orders are not enabled for this book"
                )
            }
            OrderBookError::InvalidOperation { message } => {
                write!(f, "Invalid operation: {message}")
            }
        }
    }
}

impl std::error::Error for OrderBookError {}
