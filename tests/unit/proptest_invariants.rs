use orderbook_oms::{OrderBook, Side, TimeInForce};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Add {
        side: Side,
        price: u128,
        quantity: u64,
        tif: TimeInForce,
    },
    Market {
        side: Side,
        quantity: u64,
    },
    Cancel(usize),
    Modify {
        target: usize,
        price: u128,
        quantity: u64,
    },
}

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn tif() -> impl Strategy<Value = TimeInForce> {
    prop_oneof![
        Just(TimeInForce::Gtc),
        Just(TimeInForce::Day),
        Just(TimeInForce::Ioc),
        Just(TimeInForce::Fok),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (side(), 95u128..106, 1u64..20, tif())
            .prop_map(|(side, price, quantity, tif)| Op::Add { side, price, quantity, tif }),
        1 => (side(), 1u64..30).prop_map(|(side, quantity)| Op::Market { side, quantity }),
        2 => (0usize..64).prop_map(Op::Cancel),
        2 => (0usize..64, 95u128..106, 1u64..20)
            .prop_map(|(target, price, quantity)| Op::Modify { target, price, quantity }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn book_never_stays_crossed(ops in prop::collection::vec(op(), 1..80)) {
            let book = OrderBook::new("PROP");
            let mut ids: Vec<String> = Vec::new();

            for (n, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Add { side, price, quantity, tif } => {
                        let id = format!("O{n}");
                        let matches = book.add_limit_order(&id, side, price, quantity, tif).unwrap();
                        let filled: u64 = matches.iter().map(|m| m.quantity).sum();
                        prop_assert!(filled <= quantity);
                        if tif == TimeInForce::Fok {
                            prop_assert!(filled == 0 || filled == quantity);
                        }
                        for m in &matches {
                            let within_limit = match side {
                                Side::Buy => m.price <= price,
                                Side::Sell => m.price >= price,
                            };
                            prop_assert!(within_limit);
                        }
                        ids.push(id);
                    }
                    Op::Market { side, quantity } => {
                        let id = format!("M{n}");
                        book.submit_market_order(&id, side, quantity, TimeInForce::Gtc).unwrap();
                        prop_assert!(!book.has_order(&id));
                    }
                    Op::Cancel(target) => {
                        if let Some(id) = ids.get(target) {
                            if book.cancel_order(id) {
                                prop_assert!(!book.has_order(id));
                                prop_assert!(!book.cancel_order(id));
                            }
                        }
                    }
                    Op::Modify { target, price, quantity } => {
                        if let Some(id) = ids.get(target) {
                            let resting = book.has_order(id);
                            prop_assert_eq!(book.modify_order(id, price, quantity).is_ok(), resting);
                        }
                    }
                }

                if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
                    prop_assert!(bid < ask, "crossed book: bid {} ask {}", bid, ask);
                }
            }

            for side in [Side::Buy, Side::Sell] {
                let depth = book.depth(side, usize::MAX);
                prop_assert_eq!(depth.len(), book.level_count(side));
                prop_assert!(depth.iter().all(|&(_, quantity)| quantity > 0));
                let prices: Vec<u128> = depth.iter().map(|&(price, _)| price).collect();
                let mut sorted = prices.clone();
                match side {
                    Side::Buy => sorted.sort_by(|a, b| b.cmp(a)),
                    Side::Sell => sorted.sort(),
                }
                prop_assert_eq!(prices, sorted);
            }

            let resting: HashSet<&String> = ids.iter().filter(|id| book.has_order(id)).collect();
            prop_assert_eq!(resting.len(), book.order_count());
        }

        #[test]
        fn resting_quantity_is_conserved(
            quantities in prop::collection::vec(1u64..50, 1..20),
            take in 1u64..500,
        ) {
            let book = OrderBook::new("PROP");
            for (i, quantity) in quantities.iter().enumerate() {
                book.add_limit_order(&format!("S{i}"), Side::Sell, 100, *quantity, TimeInForce::Gtc)
                    .unwrap();
            }
            let total: u64 = quantities.iter().sum();

            let matches = book.submit_market_order("M", Side::Buy, take, TimeInForce::Ioc).unwrap();
            let filled: u64 = matches.iter().map(|m| m.quantity).sum();

            prop_assert_eq!(filled, take.min(total));
            prop_assert_eq!(book.depth_at(Side::Sell, 100), total - filled);

            // FIFO: fills consume orders strictly in arrival order.
            let mut last = None;
            for m in &matches {
                let index: usize = m.order_id[1..].parse().unwrap();
                if let Some(prev) = last {
                    prop_assert!(index >= prev);
                }
                last = Some(index);
            }
        }
    }
}
