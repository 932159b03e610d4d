//! Outbound execution reports.

use crate::oms::model::OmsOrder;
use tracing::info;

/// Receives an execution report for every order state change.
///
/// Reports for fills are delivered from the matching engine's trade callback,
/// so implementations must not block.
pub trait OrderGateway: Send + Sync {
    /// Called with the order's state right after the change.
    fn on_order_report(&self, order: &OmsOrder);
}

/// Logs execution reports.
#[derive(Debug, Default, Clone)]
pub struct TracingGateway;

impl OrderGateway for TracingGateway {
    fn on_order_report(&self, order: &OmsOrder) {
        info!(
            order_id = %order.order_id,
            gateway_id = %order.gateway_id,
            status = %order.status,
            exec_type = ?order.exec_type,
            cum = order.cum_quantity,
            leaves = order.leaves_quantity,
            last_qty = order.last_quantity,
            last_px = %order.last_price,
            "execution report"
        );
    }
}
