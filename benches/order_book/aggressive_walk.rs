use criterion::{BenchmarkId, Criterion};
use orderbook_oms::{OrderBook, Side, TimeInForce};
use std::hint::black_box;

fn seeded_book(levels: u64, per_level: u64) -> OrderBook {
    let book = OrderBook::new("BENCH");
    for level in 0..levels {
        for n in 0..per_level {
            let _ = book.add_limit_order(
                &format!("S{level}-{n}"),
                Side::Sell,
                1_000 + u128::from(level),
                10,
                TimeInForce::Gtc,
            );
        }
    }
    book
}

/// Register benchmarks for orders that sweep several levels.
pub fn register_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("OrderBook - Aggressive Walk");

    for &levels in &[1u64, 5, 20] {
        group.bench_with_input(
            BenchmarkId::new("market_sweep", levels),
            &levels,
            |b, &levels| {
                b.iter_with_setup(
                    || seeded_book(levels, 10),
                    |book| {
                        let quantity = levels * 10 * 10;
                        black_box(book.submit_market_order(
                            "TAKER",
                            Side::Buy,
                            quantity,
                            TimeInForce::Ioc,
                        ))
                    },
                );
            },
        );
    }

    group.bench_function("fok_shortfall", |b| {
        b.iter_with_setup(
            || seeded_book(20, 10),
            |book| {
                black_box(book.add_limit_order(
                    "TAKER",
                    Side::Buy,
                    1_019,
                    1_000_000,
                    TimeInForce::Fok,
                ))
            },
        );
    });

    group.finish();
}
