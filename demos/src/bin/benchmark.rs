//! Throughput harness: one million limit orders routed through the book
//! manager from several threads, each thread owning a few symbols.
//!
//! ```bash
//! cargo run --release -p demos --bin benchmark
//! ```

use orderbook_oms::{
    Order, OrderBookManager, OrderBookManagerConfig, Side, TimeInForce, TradeResult,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Instant;
use tracing::info;

const NUM_ORDERS: u64 = 1_000_000;
const NUM_THREADS: u64 = 4;
const SYMBOLS: [&str; 8] = ["ABC", "DEF", "GHI", "JKL", "MNO", "PQR", "STU", "VWX"];
const MIN_PRICE: u128 = 10_000;
const PRICE_RANGE: u64 = 10_000;
const MAX_QTY: u64 = 100;

/// Spread the order index over the price range without a random source.
fn order_for(i: u64, symbol: &str) -> Order {
    let side = if (i.wrapping_mul(2_654_435_761) >> 7) % 2 == 0 {
        Side::Buy
    } else {
        Side::Sell
    };
    let price = MIN_PRICE + u128::from(i.wrapping_mul(7_919) % PRICE_RANGE);
    let quantity = i.wrapping_mul(104_729) % MAX_QTY + 1;
    Order::limit(
        format!("ORD-{i:07}"),
        symbol,
        side,
        price,
        quantity,
        TimeInForce::Gtc,
    )
}

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let manager = Arc::new(OrderBookManager::new(
        OrderBookManagerConfig::default().with_iceberg(true),
    ));

    let total_matched = Arc::new(AtomicU64::new(0));
    let total_qty = Arc::new(AtomicU64::new(0));
    {
        let total_matched = Arc::clone(&total_matched);
        let total_qty = Arc::clone(&total_qty);
        manager.register_trade_callback(Arc::new(move |trade_result: &TradeResult| {
            for fill in &trade_result.matches {
                let n = total_matched.fetch_add(1, Ordering::Relaxed) + 1;
                total_qty.fetch_add(fill.quantity, Ordering::Relaxed);
                if n <= 5 {
                    info!(
                        "match {}: {} resting {} <=> {} @ {} x {}",
                        n, fill.side, fill.order_id, fill.counter_order_id, fill.price, fill.quantity
                    );
                }
            }
        }));
    }

    let per_thread = NUM_ORDERS / NUM_THREADS;
    let symbols_per_thread = SYMBOLS.len() / NUM_THREADS as usize;
    let rejected = AtomicU64::new(0);

    let start = Instant::now();
    thread::scope(|scope| {
        for t in 0..NUM_THREADS {
            let manager = &manager;
            let rejected = &rejected;
            scope.spawn(move || {
                let first = t as usize * symbols_per_thread;
                let owned = &SYMBOLS[first..first + symbols_per_thread];
                for n in 0..per_thread {
                    let i = t * per_thread + n;
                    let symbol = owned[n as usize % owned.len()];
                    if manager.add_order(symbol, order_for(i, symbol)).is_err() {
                        rejected.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });
    let elapsed = start.elapsed();

    let resting: usize = manager
        .symbols()
        .iter()
        .filter_map(|symbol| manager.get_book(symbol))
        .map(|book| book.order_count())
        .sum();

    info!("--------");
    info!("Total orders     : {}", per_thread * NUM_THREADS);
    info!("Threads / books  : {} / {}", NUM_THREADS, manager.book_count());
    info!("Rejected         : {}", rejected.load(Ordering::Relaxed));
    info!("Total matches    : {}", total_matched.load(Ordering::Relaxed));
    info!("Total matched qty: {}", total_qty.load(Ordering::Relaxed));
    info!("Resting orders   : {}", resting);
    info!("Time taken       : {:?}", elapsed);
    info!(
        "Throughput       : {:.0} orders/s",
        (per_thread * NUM_THREADS) as f64 / elapsed.as_secs_f64()
    );
    info!("Stats            : {:?}", manager.stats());
}
