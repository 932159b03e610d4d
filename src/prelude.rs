/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! Prelude module that re-exports commonly used types and traits.
//!
//! ```rust
//! use orderbook_oms::prelude::*;
//! ```

// Matching engine
pub use crate::orderbook::manager::{OrderBookManager, OrderBookManagerConfig};
pub use crate::orderbook::{
    IcebergScheduler, MatchResult, Order, OrderBook, OrderBookError, OrderType, Side,
    StatsSnapshot, TimeInForce,
};

// Trade-related types
pub use crate::orderbook::trade::{TradeListener, TradeResult};

// Order management
pub use crate::oms::{
    AddOrderRequest, CancelOrderRequest, EventStore, ExecType, InMemoryEventStore,
    ModifyOrderRequest, Oms, OmsConfig, OmsError, OmsOrder, OrderEvent, OrderGateway,
    OrderStatus, RiskRule,
};

// NATS integration types
#[cfg(feature = "nats")]
pub use crate::oms::NatsEventPublisher;

// Utility functions
pub use crate::utils::current_time_millis;
