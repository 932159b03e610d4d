//! Per-operation latency distribution for a mixed add/match/cancel stream.
//!
//! Run with `cargo bench --bench add_order_hdr`.

use hdrhistogram::Histogram;
use orderbook_oms::{OrderBook, Side, TimeInForce};
use std::hint::black_box;
use std::time::Instant;

const WARMUP: u64 = 10_000;
const OPERATIONS: u64 = 1_000_000;

fn run(book: &OrderBook, i: u64) {
    let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
    match i % 10 {
        // 70% passive adds around the mid
        0..=6 => {
            let offset = u128::from(i % 20) + 1;
            let price = match side {
                Side::Buy => 10_000 - offset,
                Side::Sell => 10_000 + offset,
            };
            let _ = black_box(book.add_limit_order(
                &format!("P{i}"),
                side,
                price,
                10,
                TimeInForce::Gtc,
            ));
        }
        // 20% marketable IOC
        7 | 8 => {
            let price = match side {
                Side::Buy => 10_010,
                Side::Sell => 9_990,
            };
            let _ = black_box(book.add_limit_order(
                &format!("T{i}"),
                side,
                price,
                25,
                TimeInForce::Ioc,
            ));
        }
        // 10% cancel of an earlier passive order
        _ => {
            let target = i.saturating_sub(9);
            black_box(book.cancel_order(&format!("P{target}")));
        }
    }
}

fn main() {
    let book = OrderBook::new("HDR");
    for i in 0..WARMUP {
        run(&book, i);
    }

    let mut histogram = match Histogram::<u64>::new_with_bounds(1, 10_000_000, 3) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("failed to create histogram: {e}");
            return;
        }
    };

    let started = Instant::now();
    for i in WARMUP..WARMUP + OPERATIONS {
        let t0 = Instant::now();
        run(&book, i);
        let nanos = t0.elapsed().as_nanos() as u64;
        let _ = histogram.record(nanos.max(1));
    }
    let elapsed = started.elapsed();

    println!("operations: {OPERATIONS} in {elapsed:?}");
    println!(
        "throughput: {:.0} ops/s",
        OPERATIONS as f64 / elapsed.as_secs_f64()
    );
    for quantile in [0.5, 0.9, 0.99, 0.999, 0.9999] {
        println!(
            "p{:<7} {:>8} ns",
            quantile * 100.0,
            histogram.value_at_quantile(quantile)
        );
    }
    println!("max      {:>8} ns", histogram.max());
    println!("resting orders at end: {}", book.order_count());
}
