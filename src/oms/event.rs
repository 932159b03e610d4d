//! Audit records emitted on every order state change.

use crate::oms::model::{ExecType, OmsOrder, OrderStatus};
use crate::utils::current_time_millis;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of an order right after a state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_id: String,
    /// Store-assigned sequence, zero until the event is recorded.
    pub sequence: u64,
    pub order_id: String,
    pub gateway_id: String,
    pub orig_gateway_id: Option<String>,
    pub status: OrderStatus,
    pub exec_type: ExecType,
    pub price: u128,
    pub quantity: u64,
    pub cum_quantity: u64,
    pub leaves_quantity: u64,
    pub last_quantity: u64,
    pub last_price: u128,
    pub exec_id: String,
    pub last_exec_id: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl OrderEvent {
    /// Capture the current state of `order`.
    pub fn from_order(order: &OmsOrder) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            sequence: 0,
            order_id: order.order_id.clone(),
            gateway_id: order.gateway_id.clone(),
            orig_gateway_id: order.orig_gateway_id.clone(),
            status: order.status,
            exec_type: order.exec_type,
            price: order.price,
            quantity: order.quantity,
            cum_quantity: order.cum_quantity,
            leaves_quantity: order.leaves_quantity,
            last_quantity: order.last_quantity,
            last_price: order.last_price,
            exec_id: order.exec_id.clone(),
            last_exec_id: order.last_exec_id.clone(),
            timestamp: current_time_millis(),
        }
    }
}
