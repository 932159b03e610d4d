//! # Limit Order Book Matching Engine with Order Management
//!
//! A thread-safe limit order book written in Rust, together with a small order
//! management system (OMS) that sits in front of it. The engine matches orders
//! with strict price-time priority; the OMS tracks each order's lifecycle as
//! gateway sessions add, cancel and replace it.
//!
//! ## Key Features
//!
//! - **Price-Time Priority**: Each side of a book keeps an ordered set of
//!   prices and a FIFO queue per price. Incoming orders walk the opposite side
//!   best price first and rest behind existing orders at their own price.
//!
//! - **Order Types**: Limit, market and iceberg orders.
//!
//! - **Time-in-Force**: `DAY` and `GTC` orders may rest, `IOC` discards its
//!   unfilled remainder, and `FOK` is checked against the book before anything
//!   is touched, so it either fills completely or leaves the book unchanged.
//!
//! - **Iceberg Orders**: A large parent order is exposed one visible slice at
//!   a time. A background scheduler per book releases the next slice on every
//!   tick, and slice fills are reported against the parent.
//!
//! - **Trade Callbacks**: Every batch of matches is delivered to registered
//!   listeners as a [`TradeResult`] carrying the symbol.
//!
//! - **Multi-Book Management**: [`OrderBookManager`] creates books on demand,
//!   routes orders by symbol and fans callbacks out to every book.
//!
//! - **Order Management**: [`oms::Oms`] maps gateway IDs to internal order
//!   IDs, follows cancel/replace chains, runs pre-trade risk rules, and
//!   records an [`oms::OrderEvent`] for every state change.
//!
//! - **Event Publication**: Recorded events can be forwarded to a sharded
//!   background dispatcher that retries failed publishes with exponential
//!   backoff. The `nats` feature adds a JetStream publisher.
//!
//! ## Concurrency Model
//!
//! Each book guards its state with a single mutex, so every add, cancel,
//! modify and iceberg tick is atomic with respect to the others. Callbacks run
//! while that lock is held and must not call back into the same book or into
//! the manager. Books live in a `DashMap`, so operations on different symbols
//! do not contend.
//!
//! ## Numeric Representation
//!
//! Prices are unsigned 128-bit integers in ticks and quantities are unsigned
//! 64-bit integers. A market buy is matched as if its limit were `u128::MAX`
//! and a market sell as if it were `0`.
//!
//! ## Example
//!
//! ```rust
//! use orderbook_oms::{OrderBook, Side, TimeInForce};
//!
//! let book = OrderBook::new("BTC/USD");
//! book.add_limit_order("ask-1", Side::Sell, 101, 10, TimeInForce::Gtc).unwrap();
//! book.add_limit_order("ask-2", Side::Sell, 102, 10, TimeInForce::Gtc).unwrap();
//!
//! let matches = book
//!     .add_limit_order("bid-1", Side::Buy, 102, 15, TimeInForce::Ioc)
//!     .unwrap();
//! assert_eq!(matches.len(), 2);
//! assert_eq!(book.best_ask(), Some(102));
//! assert_eq!(book.depth_at(Side::Sell, 102), 5);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Description                                         |
//! |-----------|-----------------------------------------------------|
//! | `nats`    | JetStream publisher for order events                |
//! | `metrics` | Engine counters exported through the `metrics` crate |
//!
//! ## Status
//! This project is currently in active development and is not yet suitable for production use.

pub mod oms;
pub mod orderbook;

pub mod prelude;
mod utils;

pub use oms::{Oms, OmsConfig, OmsError};
pub use orderbook::manager::{OrderBookManager, OrderBookManagerConfig};
pub use orderbook::trade::{TradeListener, TradeResult};
pub use orderbook::{
    IcebergManager, IcebergScheduler, MatchResult, Order, OrderBook, OrderBookError, OrderType,
    PriceHeap, PriceLevel, Side, TimeInForce,
};
pub use utils::current_time_millis;
