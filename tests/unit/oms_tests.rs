use orderbook_oms::oms::{
    AddOrderRequest, CancelOrderRequest, DispatcherConfig, EventDispatcher, EventPublisher,
    EventStore, ExecType, InMemoryEventStore, ModifyOrderRequest, Oms, OmsConfig, OmsError,
    OmsOrder, OrderEvent, OrderGateway, OrderStatus, PublishFuture, RiskRule, TickTier,
};
use orderbook_oms::{
    Order, OrderBookError, OrderBookManager, OrderBookManagerConfig, Side, TimeInForce,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

#[cfg(test)]
mod tests {
    use super::*;

    /// Keeps every execution report.
    #[derive(Default)]
    struct RecordingGateway {
        reports: Mutex<Vec<OmsOrder>>,
    }

    impl RecordingGateway {
        fn reports_for(&self, gateway_id: &str) -> Vec<OmsOrder> {
            self.reports
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.gateway_id == gateway_id)
                .cloned()
                .collect()
        }
    }

    impl OrderGateway for RecordingGateway {
        fn on_order_report(&self, order: &OmsOrder) {
            self.reports.lock().unwrap().push(order.clone());
        }
    }

    fn config() -> OmsConfig {
        OmsConfig::default().with_engine(OrderBookManagerConfig::default().with_iceberg(false))
    }

    fn oms() -> (Oms, Arc<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway::default());
        (Oms::new(&config(), gateway.clone()), gateway)
    }

    fn gtc(gateway_id: &str, side: Side, price: u128, quantity: u64) -> AddOrderRequest {
        AddOrderRequest::limit(gateway_id, "AAA", side, price, quantity, TimeInForce::Gtc)
    }

    #[test]
    fn test_add_resting_order() {
        let (oms, gateway) = oms();
        let order_id = oms.add_order(gtc("GW1", Side::Buy, 100, 10)).unwrap();

        let order = oms.get_order(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.exec_type, ExecType::New);
        assert_eq!(order.leaves_quantity, 10);
        assert_eq!(oms.get_order_by_gateway_id("GW1").unwrap().order_id, order_id);
        assert!(oms.engine().book("AAA").has_order(&order_id));
        assert_eq!(gateway.reports_for("GW1").len(), 1);
        assert_eq!(oms.order_count(), 1);
    }

    #[test]
    fn test_fills_update_both_sides() {
        let (oms, gateway) = oms();
        let seller = oms.add_order(gtc("S1", Side::Sell, 100, 10)).unwrap();
        let buyer = oms.add_order(gtc("B1", Side::Buy, 101, 4)).unwrap();

        let sell = oms.get_order(&seller).unwrap();
        assert_eq!(sell.status, OrderStatus::PartiallyFilled);
        assert_eq!((sell.cum_quantity, sell.leaves_quantity), (4, 6));
        assert_eq!(sell.last_price, 100);

        let buy = oms.get_order(&buyer).unwrap();
        assert_eq!(buy.status, OrderStatus::Filled);
        assert_eq!(buy.exec_type, ExecType::Trade);
        assert_eq!(buy.avg_price(), Some(100));

        let statuses: Vec<_> = gateway
            .reports_for("B1")
            .iter()
            .map(|o| o.status)
            .collect();
        assert_eq!(statuses, vec![OrderStatus::New, OrderStatus::Filled]);
    }

    #[test]
    fn test_duplicate_gateway_id() {
        let (oms, _) = oms();
        oms.add_order(gtc("GW1", Side::Buy, 100, 10)).unwrap();
        assert!(matches!(
            oms.add_order(gtc("GW1", Side::Buy, 100, 10)),
            Err(OmsError::DuplicateOrder(id)) if id == "GW1"
        ));
        assert_eq!(oms.order_count(), 1);
    }

    #[test]
    fn test_ioc_remainder_cancelled() {
        let (oms, _) = oms();
        oms.add_order(gtc("S1", Side::Sell, 100, 5)).unwrap();
        let order_id = oms
            .add_order(AddOrderRequest::limit(
                "B1",
                "AAA",
                Side::Buy,
                101,
                10,
                TimeInForce::Ioc,
            ))
            .unwrap();

        let order = oms.get_order(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!((order.cum_quantity, order.leaves_quantity), (5, 0));
        assert!(!oms.engine().book("AAA").has_order(&order_id));
    }

    #[test]
    fn test_fok_shortfall_cancelled_without_fills() {
        let (oms, _) = oms();
        let seller = oms.add_order(gtc("S1", Side::Sell, 100, 5)).unwrap();
        let buyer = oms
            .add_order(AddOrderRequest::limit(
                "B1",
                "AAA",
                Side::Buy,
                101,
                10,
                TimeInForce::Fok,
            ))
            .unwrap();

        assert_eq!(oms.get_order(&buyer).unwrap().cum_quantity, 0);
        assert_eq!(oms.get_order(&buyer).unwrap().status, OrderStatus::Canceled);
        assert_eq!(oms.get_order(&seller).unwrap().status, OrderStatus::New);
    }

    #[test]
    fn test_market_order_fills_then_cancels_rest() {
        let (oms, _) = oms();
        oms.add_order(gtc("S1", Side::Sell, 100, 5)).unwrap();
        let order_id = oms
            .add_order(AddOrderRequest::market(
                "M1",
                "AAA",
                Side::Buy,
                8,
                TimeInForce::Day,
            ))
            .unwrap();

        let order = oms.get_order(&order_id).unwrap();
        assert_eq!(order.cum_quantity, 5);
        assert_eq!(order.status, OrderStatus::Canceled);
    }

    #[test]
    fn test_engine_validation_rejects() {
        let (oms, gateway) = oms();
        assert!(matches!(
            oms.add_order(gtc("GW1", Side::Buy, 0, 10)),
            Err(OmsError::Engine(OrderBookError::InvalidPrice { .. }))
        ));
        let rejected = oms.get_order_by_gateway_id("GW1").unwrap();
        assert_eq!(rejected.status, OrderStatus::Rejected);
        assert_eq!(gateway.reports_for("GW1")[0].exec_type, ExecType::Rejected);
        assert!(!oms.engine().has_book("AAA"));
    }

    #[test]
    fn test_risk_rules_reject() {
        let config = config()
            .with_price_band("AAA", 90, 110)
            .with_tick_sizes("AAA", vec![TickTier { max_price: 0, step: 5 }]);
        let oms = Oms::new(&config, Arc::new(RecordingGateway::default()));

        assert!(matches!(
            oms.add_order(gtc("GW1", Side::Buy, 120, 10)),
            Err(OmsError::RiskRejected { rule: "limit_price", .. })
        ));
        assert!(matches!(
            oms.add_order(gtc("GW2", Side::Buy, 101, 10)),
            Err(OmsError::RiskRejected { rule: "tick_size", .. })
        ));
        assert!(oms.add_order(gtc("GW3", Side::Buy, 105, 10)).is_ok());
        assert_eq!(
            oms.get_order_by_gateway_id("GW2").unwrap().status,
            OrderStatus::Rejected
        );
    }

    #[test]
    fn test_custom_rule() {
        struct MaxQuantity(u64);
        impl RiskRule for MaxQuantity {
            fn name(&self) -> &'static str {
                "max_quantity"
            }
            fn check(&self, order: &OmsOrder) -> Result<(), OmsError> {
                if order.quantity > self.0 {
                    return Err(OmsError::RiskRejected {
                        order_id: order.order_id.clone(),
                        rule: self.name(),
                        reason: format!("quantity {} above {}", order.quantity, self.0),
                    });
                }
                Ok(())
            }
        }

        let oms = Oms::new(&config(), Arc::new(RecordingGateway::default()))
            .with_rule(Box::new(MaxQuantity(100)));
        assert!(oms.add_order(gtc("GW1", Side::Buy, 100, 100)).is_ok());
        assert!(matches!(
            oms.add_order(gtc("GW2", Side::Buy, 100, 101)),
            Err(OmsError::RiskRejected { rule: "max_quantity", .. })
        ));
    }

    #[test]
    fn test_cancel_chain() {
        let (oms, gateway) = oms();
        let order_id = oms.add_order(gtc("GW1", Side::Buy, 100, 10)).unwrap();

        oms.cancel_order(CancelOrderRequest::new("GW2", "GW1")).unwrap();

        let order = oms.get_order(&order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.gateway_id, "GW2");
        assert_eq!(order.orig_gateway_id.as_deref(), Some("GW1"));
        assert!(!oms.engine().book("AAA").has_order(&order_id));
        assert_eq!(
            oms.event_store().reconstruct_chain("GW2"),
            vec!["GW2", "GW1"]
        );
        assert_eq!(
            oms.event_store().latest_gateway_id(&order_id).as_deref(),
            Some("GW2")
        );
        assert_eq!(gateway.reports_for("GW2").len(), 1);
    }

    #[test]
    fn test_cancel_errors() {
        let (oms, _) = oms();
        oms.add_order(gtc("GW1", Side::Buy, 100, 10)).unwrap();

        assert!(matches!(
            oms.cancel_order(CancelOrderRequest::new("GW9", "NOPE")),
            Err(OmsError::GatewayIdNotFound(_))
        ));
        assert!(matches!(
            oms.cancel_order(CancelOrderRequest::new("GW1", "GW1")),
            Err(OmsError::DuplicateOrder(_))
        ));

        oms.cancel_order(CancelOrderRequest::new("GW2", "GW1")).unwrap();
        assert!(matches!(
            oms.cancel_order(CancelOrderRequest::new("GW3", "GW2")),
            Err(OmsError::InvalidOrderStatus {
                status: OrderStatus::Canceled,
                ..
            })
        ));
    }

    #[test]
    fn test_cancel_filled_order_refused() {
        let (oms, _) = oms();
        oms.add_order(gtc("S1", Side::Sell, 100, 5)).unwrap();
        oms.add_order(gtc("B1", Side::Buy, 100, 5)).unwrap();

        assert!(matches!(
            oms.cancel_order(CancelOrderRequest::new("S2", "S1")),
            Err(OmsError::InvalidOrderStatus {
                status: OrderStatus::Filled,
                ..
            })
        ));
    }

    #[test]
    fn test_modify_reprices_and_matches() {
        let (oms, _) = oms();
        let seller = oms.add_order(gtc("S1", Side::Sell, 105, 4)).unwrap();
        let buyer = oms.add_order(gtc("B1", Side::Buy, 100, 10)).unwrap();

        oms.modify_order(ModifyOrderRequest::new("B2", "B1", 105, 10))
            .unwrap();

        let buy = oms.get_order(&buyer).unwrap();
        assert_eq!(buy.price, 105);
        assert_eq!(buy.gateway_id, "B2");
        assert_eq!(buy.status, OrderStatus::PartiallyFilled);
        assert_eq!((buy.cum_quantity, buy.leaves_quantity), (4, 6));
        assert_eq!(oms.get_order(&seller).unwrap().status, OrderStatus::Filled);

        let book = oms.engine().book("AAA");
        assert_eq!(book.get_order(&buyer).unwrap().quantity, 6);
        assert_eq!(book.best_bid(), Some(105));

        let exec_types: Vec<_> = oms
            .event_store()
            .events(&buyer)
            .iter()
            .map(|e| e.exec_type)
            .collect();
        assert_eq!(
            exec_types,
            vec![ExecType::New, ExecType::Replaced, ExecType::Trade]
        );
    }

    #[test]
    fn test_modify_quantity_counts_fills() {
        let (oms, _) = oms();
        oms.add_order(gtc("S1", Side::Sell, 100, 4)).unwrap();
        let buyer = oms.add_order(gtc("B1", Side::Buy, 100, 10)).unwrap();

        oms.modify_order(ModifyOrderRequest::new("B2", "B1", 100, 7))
            .unwrap();

        let buy = oms.get_order(&buyer).unwrap();
        assert_eq!(buy.status, OrderStatus::Replaced);
        assert_eq!((buy.quantity, buy.cum_quantity, buy.leaves_quantity), (7, 4, 3));
        assert_eq!(
            oms.engine().book("AAA").get_order(&buyer).unwrap().quantity,
            3
        );

        assert!(matches!(
            oms.modify_order(ModifyOrderRequest::new("B3", "B2", 100, 4)),
            Err(OmsError::InvalidQuantity { quantity: 4, .. })
        ));
    }

    /// Fills the order being replaced while its Replaced report is delivered,
    /// before the engine has applied the replacement.
    #[derive(Default)]
    struct FillOnReplaceGateway {
        engine: OnceLock<Arc<OrderBookManager>>,
        fired: AtomicBool,
    }

    impl OrderGateway for FillOnReplaceGateway {
        fn on_order_report(&self, order: &OmsOrder) {
            if order.status != OrderStatus::Replaced || self.fired.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(engine) = self.engine.get() {
                let seller = Order::limit("LATE", "AAA", Side::Sell, 100, 3, TimeInForce::Gtc);
                engine.add_order("AAA", seller).unwrap();
            }
        }
    }

    #[test]
    fn test_replace_counts_fill_arriving_mid_replace() {
        let gateway = Arc::new(FillOnReplaceGateway::default());
        let oms = Oms::new(&config(), gateway.clone());
        gateway.engine.set(Arc::clone(oms.engine())).unwrap();

        oms.add_order(gtc("S1", Side::Sell, 100, 4)).unwrap();
        let buyer = oms.add_order(gtc("B1", Side::Buy, 100, 10)).unwrap();

        oms.modify_order(ModifyOrderRequest::new("B2", "B1", 100, 12))
            .unwrap();

        let buy = oms.get_order(&buyer).unwrap();
        assert_eq!((buy.quantity, buy.cum_quantity, buy.leaves_quantity), (12, 7, 5));
        assert_eq!(buy.status, OrderStatus::PartiallyFilled);
        assert_eq!(
            oms.engine().book("AAA").get_order(&buyer).unwrap().quantity,
            5
        );
    }

    #[test]
    fn test_modify_of_vanished_order_restores_state() {
        let (oms, _) = oms();
        let buyer = oms.add_order(gtc("B1", Side::Buy, 100, 10)).unwrap();
        // Pull the order out from under the OMS.
        assert!(oms.engine().cancel_order("AAA", &buyer));

        assert!(matches!(
            oms.modify_order(ModifyOrderRequest::new("B2", "B1", 101, 10)),
            Err(OmsError::Engine(OrderBookError::OrderNotFound(_)))
        ));

        let buy = oms.get_order(&buyer).unwrap();
        assert_eq!(buy.price, 100);
        assert_eq!(buy.gateway_id, "B1");
        assert_eq!(buy.status, OrderStatus::New);
        assert_eq!(buy.leaves_quantity, 10);
        assert_eq!(
            oms.event_store().latest_gateway_id(&buyer).as_deref(),
            Some("B1")
        );
    }

    #[test]
    fn test_iceberg_fills_reported_against_parent() {
        let config = OmsConfig::default();
        let gateway = Arc::new(RecordingGateway::default());
        let oms = Oms::new(&config, gateway.clone());
        let buyer = oms.add_order(gtc("B1", Side::Buy, 100, 12)).unwrap();

        let parent = oms
            .add_order(AddOrderRequest::iceberg(
                "ICE1",
                "AAA",
                Side::Sell,
                100,
                20,
                5,
            ))
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while oms.get_order(&parent).unwrap().cum_quantity < 12 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }

        let ice = oms.get_order(&parent).unwrap();
        assert_eq!(ice.cum_quantity, 12);
        assert_eq!(oms.get_order(&buyer).unwrap().status, OrderStatus::Filled);

        oms.cancel_order(CancelOrderRequest::new("ICE2", "ICE1")).unwrap();
        assert_eq!(oms.get_order(&parent).unwrap().status, OrderStatus::Canceled);
        assert!(oms.engine().book("AAA").slices_of(&parent).is_empty());

        assert!(matches!(
            oms.modify_order(ModifyOrderRequest::new("ICE3", "ICE2", 100, 30)),
            Err(OmsError::InvalidOrderStatus { .. })
        ));
    }

    #[test]
    fn test_iceberg_cannot_be_replaced() {
        let oms = Oms::new(&OmsConfig::default(), Arc::new(RecordingGateway::default()));
        oms.add_order(AddOrderRequest::iceberg("ICE1", "AAA", Side::Sell, 100, 20, 5))
            .unwrap();
        assert!(matches!(
            oms.modify_order(ModifyOrderRequest::new("ICE2", "ICE1", 100, 30)),
            Err(OmsError::Engine(OrderBookError::InvalidOperation { .. }))
        ));
    }

    #[test]
    fn test_events_are_sequenced() {
        let (oms, _) = oms();
        let order_id = oms.add_order(gtc("GW1", Side::Buy, 100, 10)).unwrap();
        oms.cancel_order(CancelOrderRequest::new("GW2", "GW1")).unwrap();

        let events = oms.event_store().events(&order_id);
        let sequences: Vec<_> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(events[1].status, OrderStatus::Canceled);
        assert_eq!(events[1].last_exec_id.as_deref(), Some(events[0].exec_id.as_str()));
    }

    /// Collects every published payload.
    #[derive(Default)]
    struct CollectingPublisher {
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    impl EventPublisher for CollectingPublisher {
        fn publish(&self, payload: Vec<u8>) -> PublishFuture<'_> {
            Box::pin(async move {
                self.payloads.lock().unwrap().push(payload);
                Ok(())
            })
        }
    }

    #[test]
    fn test_events_published_through_dispatcher() {
        let publisher = Arc::new(CollectingPublisher::default());
        let dispatcher =
            EventDispatcher::start(publisher.clone(), DispatcherConfig::default()).unwrap();
        let store = Arc::new(InMemoryEventStore::with_dispatcher(dispatcher));
        let oms = Oms::with_event_store(
            &config(),
            Arc::new(RecordingGateway::default()),
            store.clone(),
        );

        oms.add_order(gtc("S1", Side::Sell, 100, 5)).unwrap();
        oms.add_order(gtc("B1", Side::Buy, 100, 5)).unwrap();
        assert_eq!(store.event_count(), 4);

        let deadline = Instant::now() + Duration::from_secs(5);
        while publisher.payloads.lock().unwrap().len() < 4 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        if let Some(dispatcher) = store.dispatcher() {
            dispatcher.shutdown();
            assert_eq!(dispatcher.published_count(), 4);
        }

        let payloads = publisher.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 4);
        let events: Vec<OrderEvent> = payloads
            .iter()
            .map(|p| serde_json::from_slice(p).unwrap())
            .collect();
        let s1: Vec<_> = events.iter().filter(|e| e.gateway_id == "S1").collect();
        assert_eq!(s1.len(), 2);
        // One order always lands on one shard, so its events stay in order.
        assert!(s1[0].sequence < s1[1].sequence);
        assert_eq!(s1[1].status, OrderStatus::Filled);
    }
}
