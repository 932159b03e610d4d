//! The order-management service sitting on top of the matching engine.
//!
//! [`Oms`] turns gateway requests into engine operations and keeps one
//! [`OmsOrder`] per order. Fills reach it through a trade callback registered
//! on the [`OrderBookManager`], so iceberg slices released by the scheduler
//! are accounted for like any other fill.

use crate::oms::config::OmsConfig;
use crate::oms::error::OmsError;
use crate::oms::event::OrderEvent;
use crate::oms::event_store::{EventStore, InMemoryEventStore};
use crate::oms::gateway::OrderGateway;
use crate::oms::model::{
    AddOrderRequest, CancelOrderRequest, ExecType, ModifyOrderRequest, OmsOrder, OrderStatus,
};
use crate::oms::risk::RiskRule;
use crate::orderbook::manager::OrderBookManager;
use crate::orderbook::order::OrderType;
use crate::orderbook::{OrderBook, OrderBookError, TradeResult};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// State shared with the engine's trade callback.
struct OmsCore {
    orders: DashMap<String, OmsOrder>,
    event_store: Arc<dyn EventStore>,
    gateway: Arc<dyn OrderGateway>,
}

impl OmsCore {
    /// Record an event and send a report for the given order state.
    fn publish(&self, order: &OmsOrder) {
        self.event_store.add_event(OrderEvent::from_order(order));
        self.gateway.on_order_report(order);
    }

    /// Apply `f` to the stored order and publish the result.
    ///
    /// The map entry is released before anything is published.
    fn update<F>(&self, order_id: &str, f: F) -> Option<OmsOrder>
    where
        F: FnOnce(&mut OmsOrder),
    {
        let snapshot = {
            let mut entry = self.orders.get_mut(order_id)?;
            f(entry.value_mut());
            entry.value().clone()
        };
        self.publish(&snapshot);
        Some(snapshot)
    }

    fn process_trades(&self, trade_result: &TradeResult) {
        for fill in &trade_result.matches {
            trace!(
                "Match on {}: {} <=> {} {}@{}",
                trade_result.symbol,
                fill.order_id,
                fill.counter_order_id,
                fill.quantity,
                fill.price
            );
            for order_id in [fill.resting_owner_id(), fill.aggressor_owner_id()] {
                let applied = self.update(order_id, |order| {
                    order.apply_fill(fill.price, fill.quantity);
                });
                if applied.is_none() {
                    warn!("Fill for unknown order {} skipped", order_id);
                }
            }
        }
    }
}

/// Order-management service.
pub struct Oms {
    engine: Arc<OrderBookManager>,
    core: Arc<OmsCore>,
    rules: Vec<Box<dyn RiskRule>>,
}

impl Oms {
    /// An OMS with an in-memory event store.
    pub fn new(config: &OmsConfig, gateway: Arc<dyn OrderGateway>) -> Self {
        Self::with_event_store(config, gateway, Arc::new(InMemoryEventStore::new()))
    }

    /// An OMS recording events in `event_store`.
    pub fn with_event_store(
        config: &OmsConfig,
        gateway: Arc<dyn OrderGateway>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        let engine = Arc::new(OrderBookManager::new(config.engine.clone()));
        let core = Arc::new(OmsCore {
            orders: DashMap::new(),
            event_store,
            gateway,
        });

        let callback_core = Arc::clone(&core);
        engine.register_trade_callback(Arc::new(move |trade_result: &TradeResult| {
            callback_core.process_trades(trade_result);
        }));

        Self {
            engine,
            core,
            rules: config.risk_rules(),
        }
    }

    /// Add a risk rule on top of the configured ones.
    pub fn with_rule(mut self, rule: Box<dyn RiskRule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// The matching engine.
    pub fn engine(&self) -> &Arc<OrderBookManager> {
        &self.engine
    }

    /// The event store.
    pub fn event_store(&self) -> &Arc<dyn EventStore> {
        &self.core.event_store
    }

    /// Current state of an order.
    pub fn get_order(&self, order_id: &str) -> Option<OmsOrder> {
        self.core.orders.get(order_id).map(|o| o.value().clone())
    }

    /// Current state of the order a gateway ID belongs to.
    pub fn get_order_by_gateway_id(&self, gateway_id: &str) -> Option<OmsOrder> {
        let order_id = self.core.event_store.order_id(gateway_id)?;
        self.get_order(&order_id)
    }

    /// Number of orders tracked.
    pub fn order_count(&self) -> usize {
        self.core.orders.len()
    }

    fn reject(&self, mut order: OmsOrder) {
        order.leaves_quantity = 0;
        order.transition(OrderStatus::Rejected, ExecType::Rejected);
        self.core.publish(&order);
        self.core.orders.insert(order.order_id.clone(), order);
    }

    /// Accept a new order and submit it to the engine. Returns the internal order ID.
    ///
    /// Immediate fills are applied before this returns. Whatever an IOC, FOK
    /// or market order leaves unfilled is cancelled.
    ///
    /// # Errors
    /// [`OmsError::DuplicateOrder`] for a known gateway ID,
    /// [`OmsError::RiskRejected`] when a risk rule fires, and
    /// [`OmsError::Engine`] when the engine refuses the order. Rejected orders
    /// are still recorded and reported.
    pub fn add_order(&self, request: AddOrderRequest) -> Result<String, OmsError> {
        let mut order = OmsOrder::from_request(&request);
        if !self
            .core
            .event_store
            .claim_gateway_id(&order.gateway_id, &order.order_id)
        {
            return Err(OmsError::DuplicateOrder(order.gateway_id));
        }

        for rule in &self.rules {
            if let Err(e) = rule.check(&order) {
                info!("Order {} rejected: {}", order.gateway_id, e);
                self.reject(order);
                return Err(e);
            }
        }

        let engine_order = order.to_engine_order();
        if let Err(e) = OrderBook::validate(&engine_order) {
            info!("Order {} rejected: {}", order.gateway_id, e);
            self.reject(order);
            return Err(e.into());
        }

        order.transition(OrderStatus::New, ExecType::New);
        let order_id = order.order_id.clone();
        self.core.orders.insert(order_id.clone(), order.clone());
        self.core.publish(&order);
        info!(
            "Order {} accepted as {} ({} {} {}@{})",
            order.gateway_id,
            order_id,
            order.symbol,
            order.side,
            order.quantity,
            order.price
        );

        if let Err(e) = self.engine.add_order(&order.symbol, engine_order) {
            warn!("Engine rejected order {}: {}", order_id, e);
            self.core.update(&order_id, |o| {
                o.leaves_quantity = 0;
                o.transition(OrderStatus::Rejected, ExecType::Rejected);
            });
            return Err(e.into());
        }

        let discards_remainder =
            order.order_type == OrderType::Market || !order.time_in_force.is_resting();
        if discards_remainder && order.order_type != OrderType::Iceberg {
            let needs_cancel = self
                .core
                .orders
                .get(&order_id)
                .is_some_and(|o| o.leaves_quantity > 0 && !o.status.is_terminal());
            if needs_cancel {
                self.core.update(&order_id, OmsOrder::cancel_remaining);
            }
        }

        Ok(order_id)
    }

    /// Resolve a request's original gateway ID and check it may be acted on.
    fn resolve(
        &self,
        gateway_id: &str,
        orig_gateway_id: &str,
        allowed: fn(OrderStatus) -> bool,
    ) -> Result<OmsOrder, OmsError> {
        let order_id = self
            .core
            .event_store
            .order_id(orig_gateway_id)
            .ok_or_else(|| OmsError::GatewayIdNotFound(orig_gateway_id.to_string()))?;
        if self.core.event_store.order_id(gateway_id).is_some() {
            return Err(OmsError::DuplicateOrder(gateway_id.to_string()));
        }
        let order = self
            .get_order(&order_id)
            .ok_or_else(|| OmsError::OrderNotFound(order_id.clone()))?;
        if !allowed(order.status) {
            return Err(OmsError::InvalidOrderStatus {
                order_id,
                status: order.status,
            });
        }
        Ok(order)
    }

    /// Cancel an order.
    ///
    /// # Errors
    /// [`OmsError::GatewayIdNotFound`], [`OmsError::DuplicateOrder`],
    /// [`OmsError::InvalidOrderStatus`], or [`OmsError::CancelRejected`] if
    /// the engine no longer holds the order.
    pub fn cancel_order(&self, request: CancelOrderRequest) -> Result<(), OmsError> {
        let order = self.resolve(
            &request.gateway_id,
            &request.orig_gateway_id,
            OrderStatus::can_cancel,
        )?;

        if !self.engine.cancel_order(&order.symbol, &order.order_id) {
            return Err(OmsError::CancelRejected(order.order_id));
        }

        self.core.update(&order.order_id, |o| {
            o.gateway_id = request.gateway_id.clone();
            o.orig_gateway_id = Some(request.orig_gateway_id.clone());
            o.cancel_remaining();
        });
        info!(
            "Order {} cancelled ({} -> {})",
            order.order_id, request.orig_gateway_id, request.gateway_id
        );
        Ok(())
    }

    /// Replace an order's price and total quantity.
    ///
    /// The engine receives `new_quantity` minus what has been filled, counting
    /// fills that arrive while the replacement is in flight.
    /// Fills produced by the replacement are applied before this returns.
    ///
    /// # Errors
    /// As [`Oms::cancel_order`], plus [`OmsError::InvalidQuantity`] when the
    /// new total does not exceed the filled quantity and [`OmsError::Engine`]
    /// when the engine refuses the replacement. A refused replacement leaves
    /// the order as it was.
    pub fn modify_order(&self, request: ModifyOrderRequest) -> Result<(), OmsError> {
        let order = self.resolve(
            &request.gateway_id,
            &request.orig_gateway_id,
            OrderStatus::can_modify,
        )?;

        if order.order_type == OrderType::Iceberg {
            return Err(OrderBookError::InvalidOperation {
                message: format!("iceberg order {} cannot be replaced", order.order_id),
            }
            .into());
        }
        if request.new_price == 0 {
            return Err(OrderBookError::InvalidPrice {
                order_id: order.order_id,
                price: request.new_price,
            }
            .into());
        }

        // The book applies the change in total quantity to whatever is
        // resting once it holds its lock.
        let (added, removed, replaced) = {
            let mut entry = self
                .core
                .orders
                .get_mut(&order.order_id)
                .ok_or_else(|| OmsError::OrderNotFound(order.order_id.clone()))?;
            let o = entry.value_mut();
            if request.new_quantity <= o.cum_quantity {
                return Err(OmsError::InvalidQuantity {
                    order_id: order.order_id,
                    quantity: request.new_quantity,
                });
            }
            let added = request.new_quantity.saturating_sub(o.quantity);
            let removed = o.quantity.saturating_sub(request.new_quantity);
            o.gateway_id = request.gateway_id.clone();
            o.orig_gateway_id = Some(request.orig_gateway_id.clone());
            o.price = request.new_price;
            o.quantity = request.new_quantity;
            o.leaves_quantity = request.new_quantity - o.cum_quantity;
            o.transition(OrderStatus::Replaced, ExecType::Replaced);
            (added, removed, o.clone())
        };
        self.core.publish(&replaced);

        let result = self.engine.modify_order_with(
            &order.symbol,
            &order.order_id,
            request.new_price,
            |resting| resting.saturating_add(added).saturating_sub(removed),
        );
        if let Err(e) = result {
            warn!("Engine rejected replace of {}: {}", order.order_id, e);
            self.core.update(&order.order_id, |o| {
                o.gateway_id = order.gateway_id.clone();
                o.orig_gateway_id = order.orig_gateway_id.clone();
                o.price = order.price;
                o.quantity = order.quantity;
                o.leaves_quantity = order.quantity.saturating_sub(o.cum_quantity);
                let status = if o.cum_quantity > 0 {
                    OrderStatus::PartiallyFilled
                } else {
                    OrderStatus::New
                };
                o.transition(status, ExecType::Rejected);
            });
            return Err(e.into());
        }

        info!(
            "Order {} replaced: {}@{} ({} -> {})",
            order.order_id,
            request.new_quantity,
            request.new_price,
            request.orig_gateway_id,
            request.gateway_id
        );
        Ok(())
    }
}

impl std::fmt::Debug for Oms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oms")
            .field("engine", &self.engine)
            .field("orders", &self.order_count())
            .field("rules", &self.rules.len())
            .finish()
    }
}
