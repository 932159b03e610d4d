//! Order event storage and gateway-ID chain tracking.
//!
//! Every cancel or replace request arrives under a new gateway ID that points
//! back at the one it supersedes. The store keeps three maps so any gateway
//! ID can be resolved to its order and the full chain can be walked back to
//! the original request.

use crate::oms::dispatcher::EventDispatcher;
use crate::oms::event::OrderEvent;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Storage for order events and gateway-ID chains.
pub trait EventStore: Send + Sync {
    /// Bind a fresh gateway ID to an order. Returns `false` if it is already bound.
    fn claim_gateway_id(&self, gateway_id: &str, order_id: &str) -> bool;

    /// Record an event and update the chain from its gateway IDs.
    fn add_event(&self, event: OrderEvent);

    /// Make `gateway_id` the order's latest gateway ID, linked to `orig_gateway_id`.
    fn track_chain(&self, order_id: &str, gateway_id: &str, orig_gateway_id: Option<&str>);

    /// Latest gateway ID of an order.
    fn latest_gateway_id(&self, order_id: &str) -> Option<String>;

    /// Gateway ID that `gateway_id` replaced.
    fn orig_gateway_id(&self, gateway_id: &str) -> Option<String>;

    /// Order a gateway ID belongs to.
    fn order_id(&self, gateway_id: &str) -> Option<String>;

    /// `gateway_id` followed by each gateway ID it replaced, oldest last.
    fn reconstruct_chain(&self, gateway_id: &str) -> Vec<String>;

    /// Events recorded for an order, oldest first.
    fn events(&self, order_id: &str) -> Vec<OrderEvent>;
}

#[derive(Debug, Default)]
struct Chains {
    gateway_to_order: HashMap<String, String>,
    order_to_latest_gateway: HashMap<String, String>,
    gateway_to_orig: HashMap<String, String>,
}

impl Chains {
    fn track(&mut self, order_id: &str, gateway_id: &str, orig_gateway_id: Option<&str>) {
        self.order_to_latest_gateway
            .insert(order_id.to_string(), gateway_id.to_string());
        if let Some(orig) = orig_gateway_id.filter(|orig| *orig != gateway_id) {
            self.gateway_to_orig
                .insert(gateway_id.to_string(), orig.to_string());
        }
        self.gateway_to_order
            .insert(gateway_id.to_string(), order_id.to_string());
    }
}

/// In-process [`EventStore`], optionally forwarding events to an [`EventDispatcher`].
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    chains: RwLock<Chains>,
    history: RwLock<HashMap<String, Vec<OrderEvent>>>,
    sequence: AtomicU64,
    dispatcher: Option<EventDispatcher>,
}

impl InMemoryEventStore {
    /// A store that keeps events in memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that also publishes every recorded event.
    pub fn with_dispatcher(dispatcher: EventDispatcher) -> Self {
        Self {
            dispatcher: Some(dispatcher),
            ..Self::default()
        }
    }

    /// The attached dispatcher, if any.
    pub fn dispatcher(&self) -> Option<&EventDispatcher> {
        self.dispatcher.as_ref()
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl EventStore for InMemoryEventStore {
    fn claim_gateway_id(&self, gateway_id: &str, order_id: &str) -> bool {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        match chains.gateway_to_order.entry(gateway_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(order_id.to_string());
                true
            }
        }
    }

    fn add_event(&self, mut event: OrderEvent) {
        self.track_chain(
            &event.order_id,
            &event.gateway_id,
            event.orig_gateway_id.as_deref(),
        );
        event.sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;

        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.dispatch(event.clone());
        }
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.order_id.clone())
            .or_default()
            .push(event);
    }

    fn track_chain(&self, order_id: &str, gateway_id: &str, orig_gateway_id: Option<&str>) {
        self.chains
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .track(order_id, gateway_id, orig_gateway_id);
    }

    fn latest_gateway_id(&self, order_id: &str) -> Option<String> {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order_to_latest_gateway
            .get(order_id)
            .cloned()
    }

    fn orig_gateway_id(&self, gateway_id: &str) -> Option<String> {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .gateway_to_orig
            .get(gateway_id)
            .cloned()
    }

    fn order_id(&self, gateway_id: &str) -> Option<String> {
        self.chains
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .gateway_to_order
            .get(gateway_id)
            .cloned()
    }

    fn reconstruct_chain(&self, gateway_id: &str) -> Vec<String> {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        let mut chain = Vec::new();
        let mut current = Some(gateway_id);
        while let Some(id) = current {
            // A malformed map must not loop forever.
            if chain.iter().any(|seen| seen == id) {
                break;
            }
            chain.push(id.to_string());
            current = chains.gateway_to_orig.get(id).map(String::as_str);
        }
        chain
    }

    fn events(&self, order_id: &str) -> Vec<OrderEvent> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }
}
