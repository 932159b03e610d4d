//! OrderBook implementation for managing price levels and order matching.

pub mod book;
pub mod error;
/// Iceberg parent tracking and the background slicing scheduler.
pub mod iceberg;
/// Multi-book management with centralized trade callback fan-out.
pub mod manager;
pub mod match_result;
pub mod matching;
pub mod operations;
pub mod order;
pub mod price_heap;
pub mod price_level;
/// Engine-wide diagnostics counters.
pub mod stats;
/// Enhanced trade result that includes symbol information
pub mod trade;

pub use book::OrderBook;
pub use error::OrderBookError;
pub use iceberg::{IcebergManager, IcebergScheduler};
pub use manager::{OrderBookManager, OrderBookManagerConfig};
pub use match_result::MatchResult;
pub use order::{Order, OrderType, Side, TimeInForce};
pub use price_heap::{HeapOrdering, PriceHeap};
pub use price_level::PriceLevel;
pub use stats::{EngineStats, StatsSnapshot};
pub use trade::{TradeListener, TradeResult};
