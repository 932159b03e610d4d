use orderbook_oms::{
    Order, OrderBookError, OrderBookManager, OrderBookManagerConfig, Side, TimeInForce,
    TradeResult,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_manager() -> OrderBookManager {
        OrderBookManager::new(OrderBookManagerConfig::default().with_iceberg(false))
    }

    fn limit(id: &str, symbol: &str, side: Side, price: u128, quantity: u64) -> Order {
        Order::limit(id, symbol, side, price, quantity, TimeInForce::Gtc)
    }

    #[test]
    fn test_books_created_lazily() {
        let manager = plain_manager();
        assert_eq!(manager.book_count(), 0);
        assert!(manager.get_book("AAA").is_none());

        manager
            .add_order("BBB", limit("1", "BBB", Side::Buy, 10, 1))
            .unwrap();
        manager
            .add_order("AAA", limit("2", "AAA", Side::Buy, 10, 1))
            .unwrap();

        assert!(manager.has_book("AAA"));
        assert_eq!(manager.symbols(), vec!["AAA", "BBB"]);
        assert!(Arc::ptr_eq(
            &manager.book("AAA"),
            &manager.get_book("AAA").unwrap()
        ));
    }

    #[test]
    fn test_routing_keeps_books_independent() {
        let manager = plain_manager();
        manager
            .add_order("AAA", limit("S", "AAA", Side::Sell, 100, 5))
            .unwrap();

        let matches = manager
            .add_order("BBB", limit("B", "BBB", Side::Buy, 100, 5))
            .unwrap();
        assert!(matches.is_empty());

        let matches = manager
            .add_order("AAA", limit("B", "AAA", Side::Buy, 100, 5))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert!(manager.book("BBB").has_order("B"));
    }

    #[test]
    fn test_symbol_filled_or_checked() {
        let manager = plain_manager();
        manager
            .add_order("AAA", limit("1", "", Side::Buy, 10, 1))
            .unwrap();
        assert_eq!(manager.book("AAA").get_order("1").unwrap().symbol, "AAA");

        assert!(matches!(
            manager.add_order("AAA", limit("2", "BBB", Side::Buy, 10, 1)),
            Err(OrderBookError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_cancel_and_modify_route_by_symbol() {
        let manager = plain_manager();
        manager
            .add_order("AAA", limit("S", "AAA", Side::Sell, 100, 5))
            .unwrap();

        assert!(!manager.cancel_order("BBB", "S"));
        assert!(manager.modify_order("BBB", "S", 100, 2).is_err());

        assert!(manager.modify_order("AAA", "S", 100, 2).unwrap().is_empty());
        assert!(manager.cancel_order("AAA", "S"));
        assert!(!manager.cancel_order("AAA", "S"));
    }

    #[test]
    fn test_callback_reaches_existing_and_future_books() {
        let manager = plain_manager();
        manager
            .add_order("OLD", limit("S", "OLD", Side::Sell, 100, 5))
            .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        manager.register_trade_callback(Arc::new(move |trade_result: &TradeResult| {
            sink.lock().unwrap().push(trade_result.symbol.clone());
        }));

        manager
            .add_order("NEW", limit("S", "NEW", Side::Sell, 100, 5))
            .unwrap();
        manager
            .add_order("OLD", limit("B", "OLD", Side::Buy, 100, 5))
            .unwrap();
        manager
            .add_order("NEW", limit("B", "NEW", Side::Buy, 100, 5))
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["OLD", "NEW"]);
    }

    #[test]
    fn test_callbacks_run_once_per_batch() {
        let manager = plain_manager();
        let calls = Arc::new(AtomicU64::new(0));
        for _ in 0..2 {
            let counter = Arc::clone(&calls);
            manager.register_trade_callback(Arc::new(move |_: &TradeResult| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        manager
            .add_order("AAA", limit("S1", "AAA", Side::Sell, 100, 5))
            .unwrap();
        manager
            .add_order("AAA", limit("S2", "AAA", Side::Sell, 101, 5))
            .unwrap();
        manager
            .add_order("AAA", limit("B", "AAA", Side::Buy, 101, 10))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stats_track_operations() {
        let manager = plain_manager();
        manager
            .add_order("AAA", limit("S", "AAA", Side::Sell, 100, 5))
            .unwrap();
        manager
            .add_order("AAA", limit("B", "AAA", Side::Buy, 100, 3))
            .unwrap();
        let _ = manager.add_order("AAA", limit("Z", "AAA", Side::Buy, 100, 0));
        manager.modify_order("AAA", "S", 100, 1).unwrap();
        manager.cancel_order("AAA", "S");

        let stats = manager.stats();
        assert_eq!(stats.orders_added, 2);
        assert_eq!(stats.orders_rejected, 1);
        assert_eq!(stats.orders_modified, 1);
        assert_eq!(stats.orders_cancelled, 1);
        assert_eq!(stats.match_batches, 1);
        assert_eq!(stats.trades, 1);
        assert_eq!(stats.matched_quantity, 3);
    }

    #[test]
    fn test_iceberg_books_slice_in_background() {
        let manager = OrderBookManager::default();
        assert!(manager.config().enable_iceberg);

        let order = Order::iceberg("ICE", "AAA", Side::Sell, 100, 20, 5, TimeInForce::Gtc);
        assert!(manager.add_order("AAA", order).unwrap().is_empty());

        let book = manager.book("AAA");
        let deadline = Instant::now() + Duration::from_secs(5);
        while book.depth_at(Side::Sell, 100) < 20 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(book.depth_at(Side::Sell, 100), 20);

        assert!(manager.remove_book("AAA"));
        assert!(!manager.has_book("AAA"));
    }

    #[test]
    fn test_plain_manager_rejects_icebergs() {
        let manager = plain_manager();
        let order = Order::iceberg("ICE", "AAA", Side::Sell, 100, 20, 5, TimeInForce::Gtc);
        assert!(matches!(
            manager.add_order("AAA", order),
            Err(OrderBookError::IcebergDisabled { .. })
        ));
    }

    #[test]
    fn test_concurrent_symbols() {
        let manager = Arc::new(plain_manager());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let symbol = format!("SYM{t}");
                    for i in 0..200u64 {
                        let side = if i % 2 == 0 { Side::Sell } else { Side::Buy };
                        let order = limit(&format!("{t}-{i}"), &symbol, side, 100, 1);
                        manager.add_order(&symbol, order).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(manager.book_count(), 4);
        for symbol in manager.symbols() {
            assert_eq!(manager.book(&symbol).order_count(), 0);
        }
        assert_eq!(manager.stats().matched_quantity, 400);
    }
}
