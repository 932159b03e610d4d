//! Order management on top of the matching engine: gateway-ID chains,
//! lifecycle tracking, pre-trade risk and event publication.

pub mod config;
/// Sharded background publication of order events.
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod event_store;
pub mod gateway;
pub mod model;
/// NATS JetStream integration for order events.
#[cfg(feature = "nats")]
pub mod nats;
pub mod publisher;
pub mod risk;
pub mod service;

pub use config::OmsConfig;
pub use dispatcher::{DispatcherConfig, EventDispatcher};
pub use error::OmsError;
pub use event::OrderEvent;
pub use event_store::{EventStore, InMemoryEventStore};
pub use gateway::{OrderGateway, TracingGateway};
pub use model::{
    AddOrderRequest, CancelOrderRequest, ExecType, ModifyOrderRequest, OmsOrder, OrderStatus,
};
#[cfg(feature = "nats")]
pub use nats::NatsEventPublisher;
pub use publisher::{EventPublisher, PublishFuture, TracingEventPublisher};
pub use risk::{LimitPriceRule, PriceBand, RiskRule, TickSizeRule, TickTier};
pub use service::Oms;
