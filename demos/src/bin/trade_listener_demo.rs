//! Example demonstrating real-time trade monitoring with TradeListener
//!
//! This example shows how to:
//! 1. Create an order book with a TradeListener
//! 2. Fill the order book with limit orders
//! 3. Execute orders that cross the market under each time-in-force
//! 4. Display trade information as matches occur
//!
//! ```bash
//! cargo run -p demos --bin trade_listener_demo
//! ```

use orderbook_oms::{OrderBook, Side, TimeInForce, TradeListener, TradeResult};
use std::sync::Arc;
use tracing::info;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    info!("=== Trade Listener Demo ===\n");

    let trade_listener: TradeListener = Arc::new(|trade_result: &TradeResult| {
        display_trade_event(trade_result);
    });
    let book = OrderBook::with_trade_listener("ETH/USD", trade_listener);

    info!("Step 1: Adding initial liquidity to the order book");
    fill_orderbook_with_liquidity(&book);
    display_orderbook_summary(&book);

    info!("\nStep 2: GTC buy @ 3050 for 100 (matches 3020 and 3040, rest rests)");
    report(book.add_limit_order("BUY-GTC", Side::Buy, 3050, 100, TimeInForce::Gtc));

    info!("\nStep 3: IOC sell @ 2960 for 200 (matches down to 2960, rest discarded)");
    report(book.add_limit_order("SELL-IOC", Side::Sell, 2960, 200, TimeInForce::Ioc));

    info!("\nStep 4: FOK buy @ 3060 for 1000 (not enough liquidity, nothing happens)");
    report(book.add_limit_order("BUY-FOK", Side::Buy, 3060, 1000, TimeInForce::Fok));

    info!("\nStep 5: Market sell for 40");
    report(book.submit_market_order("SELL-MKT", Side::Sell, 40, TimeInForce::Ioc));

    info!("\n");
    display_orderbook_summary(&book);
    info!("\n=== Demo Complete ===");
}

fn fill_orderbook_with_liquidity(book: &OrderBook) {
    let bid_orders = [(3000, 50), (2980, 75), (2960, 100), (2940, 125), (2920, 150)];
    for (i, (price, quantity)) in bid_orders.iter().enumerate() {
        match book.add_limit_order(&format!("BID-{i}"), Side::Buy, *price, *quantity, TimeInForce::Gtc) {
            Ok(_) => info!("  BID: {} units @ {}", quantity, price),
            Err(e) => info!("  Failed to add BID: {}", e),
        }
    }

    let ask_orders = [(3020, 50), (3040, 75), (3060, 100), (3080, 125), (3100, 150)];
    for (i, (price, quantity)) in ask_orders.iter().enumerate() {
        match book.add_limit_order(&format!("ASK-{i}"), Side::Sell, *price, *quantity, TimeInForce::Gtc) {
            Ok(_) => info!("  ASK: {} units @ {}", quantity, price),
            Err(e) => info!("  Failed to add ASK: {}", e),
        }
    }
}

fn report<E: std::fmt::Display>(result: Result<Vec<orderbook_oms::MatchResult>, E>) {
    match result {
        Ok(matches) if matches.is_empty() => info!("   no trades"),
        Ok(matches) => info!("   {} fills returned to the caller", matches.len()),
        Err(e) => info!("   rejected: {}", e),
    }
}

fn display_trade_event(trade_result: &TradeResult) {
    info!(
        "TRADE {} | {} fills | {} units",
        trade_result.symbol,
        trade_result.trade_count(),
        trade_result.executed_quantity()
    );
    for fill in &trade_result.matches {
        info!(
            "   {} x {} @ {} (resting {}, {})",
            fill.counter_order_id, fill.quantity, fill.price, fill.order_id, fill.side
        );
    }
}

fn display_orderbook_summary(book: &OrderBook) {
    info!("Order book {}:", book.symbol());
    info!("  Best bid: {:?}", book.best_bid());
    info!("  Best ask: {:?}", book.best_ask());
    info!("  Spread:   {:?}", book.spread());
    info!("  Orders:   {}", book.order_count());
    for (price, quantity) in book.depth(Side::Sell, 5).iter().rev() {
        info!("    ASK {:>6} | {:>5}", price, quantity);
    }
    for (price, quantity) in book.depth(Side::Buy, 5) {
        info!("    BID {:>6} | {:>5}", price, quantity);
    }
}
