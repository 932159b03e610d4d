//! Order-management walkthrough: gateway IDs, fills, cancel/replace chains
//! and asynchronous event publication.
//!
//! ```bash
//! cargo run -p demos --bin oms_demo
//! ```

use orderbook_oms::oms::{
    AddOrderRequest, CancelOrderRequest, DispatcherConfig, EventDispatcher, EventStore,
    InMemoryEventStore, ModifyOrderRequest, TracingEventPublisher, TracingGateway,
};
use orderbook_oms::{Oms, OmsConfig, Side, TimeInForce};
use std::sync::Arc;
use tracing::{info, warn};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();
    info!("=== OMS Demo ===");

    let config = OmsConfig::default().with_price_band("VN30", 900, 1_100);
    let dispatcher = match EventDispatcher::start(
        Arc::new(TracingEventPublisher),
        config.dispatcher.clone(),
    ) {
        Ok(d) => d,
        Err(e) => {
            warn!("dispatcher unavailable, events stay local: {}", e);
            return run_without_dispatcher(&config);
        }
    };
    let store = Arc::new(InMemoryEventStore::with_dispatcher(dispatcher));
    let oms = Oms::with_event_store(&config, Arc::new(TracingGateway), store.clone());

    run_session(&oms);

    info!("events recorded: {}", store.event_count());
    if let Some(dispatcher) = store.dispatcher() {
        dispatcher.shutdown();
        info!(
            "published {}, failed {}, dropped {}",
            dispatcher.published_count(),
            dispatcher.failed_count(),
            dispatcher.dropped_count()
        );
    }
}

fn run_without_dispatcher(config: &OmsConfig) {
    let oms = Oms::new(config, Arc::new(TracingGateway));
    run_session(&oms);
}

fn run_session(oms: &Oms) {
    info!("Step 1: resting sell 1000 x 50 under gateway ID S-1");
    submit(oms, AddOrderRequest::limit("S-1", "VN30", Side::Sell, 1_000, 50, TimeInForce::Gtc));

    info!("Step 2: buy 1000 x 20 under B-1 fills part of S-1");
    submit(oms, AddOrderRequest::limit("B-1", "VN30", Side::Buy, 1_000, 20, TimeInForce::Gtc));

    info!("Step 3: price outside the band is rejected");
    submit(oms, AddOrderRequest::limit("B-2", "VN30", Side::Buy, 1_500, 10, TimeInForce::Gtc));

    info!("Step 4: replace S-1 (S-2) to 1010 x 60");
    if let Err(e) = oms.modify_order(ModifyOrderRequest::new("S-2", "S-1", 1_010, 60)) {
        warn!("replace refused: {}", e);
    }

    info!("Step 5: cancel through the latest gateway ID (S-3 -> S-2)");
    if let Err(e) = oms.cancel_order(CancelOrderRequest::new("S-3", "S-2")) {
        warn!("cancel refused: {}", e);
    }

    info!("Step 6: cancelling the stale ID S-1 fails");
    if let Err(e) = oms.cancel_order(CancelOrderRequest::new("S-4", "S-1")) {
        info!("expected: {}", e);
    }

    if let Some(order) = oms.get_order_by_gateway_id("S-3") {
        info!(
            "S-3 resolves to {} status {} cum {} leaves {} avg {:?}",
            order.order_id,
            order.status,
            order.cum_quantity,
            order.leaves_quantity,
            order.avg_price()
        );
        info!("chain: {:?}", oms.event_store().reconstruct_chain("S-3"));
        for event in oms.event_store().events(&order.order_id) {
            match serde_json::to_string(&event) {
                Ok(json) => info!("  {}", json),
                Err(e) => warn!("  unserialisable event: {}", e),
            }
        }
    }
    info!("orders tracked: {}", oms.order_count());
}

fn submit(oms: &Oms, request: AddOrderRequest) {
    let gateway_id = request.gateway_id.clone();
    match oms.add_order(request) {
        Ok(order_id) => info!("{} accepted as {}", gateway_id, order_id),
        Err(e) => info!("{} rejected: {}", gateway_id, e),
    }
}
