//! Iceberg orders released by the background scheduler.
//!
//! ```bash
//! cargo run -p demos --bin iceberg_demo
//! ```

use orderbook_oms::{Order, OrderBookManager, OrderBookManagerConfig, Side, TimeInForce, TradeResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    info!("=== Iceberg Demo ===");

    let manager = OrderBookManager::new(
        OrderBookManagerConfig::default()
            .with_iceberg(true)
            .with_iceberg_interval_ms(20),
    );
    manager.register_trade_callback(Arc::new(|trade_result: &TradeResult| {
        for fill in &trade_result.matches {
            info!(
                "fill {} @ {} against {} (parent {})",
                fill.quantity,
                fill.price,
                fill.order_id,
                fill.counter_parent_id.as_deref().unwrap_or("-")
            );
        }
    }));

    let bid = Order::limit("BID", "BTC/USD", Side::Buy, 100, 30, TimeInForce::Gtc);
    if let Err(e) = manager.add_order("BTC/USD", bid) {
        info!("bid rejected: {}", e);
        return;
    }

    let iceberg = Order::iceberg("ICE", "BTC/USD", Side::Sell, 100, 100, 5, TimeInForce::Gtc);
    match manager.add_order("BTC/USD", iceberg) {
        Ok(_) => info!("iceberg of 100 accepted, showing 5 at a time"),
        Err(e) => {
            info!("iceberg rejected: {}", e);
            return;
        }
    }

    let book = manager.book("BTC/USD");
    while book.active_iceberg_count() > 0 {
        info!(
            "hidden {:?}, resting slices {}, ask depth {}",
            book.iceberg_hidden_quantity("ICE"),
            book.slices_of("ICE").len(),
            book.depth_at(Side::Sell, 100)
        );
        std::thread::sleep(Duration::from_millis(100));
    }

    info!(
        "done: {} resting slices, ask depth {}, bid resting: {}",
        book.slices_of("ICE").len(),
        book.depth_at(Side::Sell, 100),
        book.has_order("BID")
    );
    info!("stats: {:?}", manager.stats());

    info!("cancelling parent");
    manager.cancel_order("BTC/USD", "ICE");
    info!("orders left: {}", book.order_count());
}
