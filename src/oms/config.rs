//! OMS configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "engine": { "enable_iceberg": true, "iceberg_interval_ms": 1 },
//!   "dispatcher": { "shards": 2, "queue_capacity": 100000 },
//!   "price_bands": { "AAA": { "floor": 90, "ceiling": 110 } },
//!   "tick_sizes": { "AAA": [ { "max_price": 0, "step": 5 } ] }
//! }
//! ```
//!
//! Every section is optional.

use crate::oms::dispatcher::DispatcherConfig;
use crate::oms::error::OmsError;
use crate::oms::risk::{LimitPriceRule, PriceBand, RiskRule, TickSizeRule, TickTier};
use crate::orderbook::manager::OrderBookManagerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Top-level OMS settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OmsConfig {
    /// Settings for the matching engine's book manager.
    pub engine: OrderBookManagerConfig,
    /// Settings for event publication.
    pub dispatcher: DispatcherConfig,
    /// Per-symbol price bands for [`LimitPriceRule`].
    pub price_bands: HashMap<String, PriceBand>,
    /// Per-symbol tick tables for [`TickSizeRule`].
    pub tick_sizes: HashMap<String, Vec<TickTier>>,
}

impl OmsConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    /// [`OmsError::Json`] if the document does not parse, [`OmsError::Config`]
    /// if it fails [`OmsConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, OmsError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    /// [`OmsError::Config`] for a dispatcher without shards or queue capacity,
    /// an inverted price band, or a tick tier with a zero step.
    pub fn validate(&self) -> Result<(), OmsError> {
        if self.dispatcher.shards == 0 || self.dispatcher.queue_capacity == 0 {
            return Err(OmsError::Config(
                "dispatcher needs at least one shard and a non-zero queue capacity".to_string(),
            ));
        }
        for (symbol, band) in &self.price_bands {
            if band.floor > band.ceiling {
                return Err(OmsError::Config(format!(
                    "price band for {symbol} has floor {} above ceiling {}",
                    band.floor, band.ceiling
                )));
            }
        }
        for (symbol, tiers) in &self.tick_sizes {
            if tiers.iter().any(|t| t.step == 0) {
                return Err(OmsError::Config(format!("tick table for {symbol} has a zero step")));
            }
        }
        Ok(())
    }

    /// Read and parse a JSON file.
    ///
    /// # Errors
    /// [`OmsError::Io`] if the file cannot be read, [`OmsError::Json`] if it
    /// does not parse.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OmsError> {
        let path = path.as_ref();
        debug!("Loading OMS config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Replace the engine settings.
    pub fn with_engine(mut self, engine: OrderBookManagerConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Set a price band.
    pub fn with_price_band(mut self, symbol: &str, floor: u128, ceiling: u128) -> Self {
        self.price_bands
            .insert(symbol.to_string(), PriceBand { floor, ceiling });
        self
    }

    /// Set a tick table.
    pub fn with_tick_sizes(mut self, symbol: &str, tiers: Vec<TickTier>) -> Self {
        self.tick_sizes.insert(symbol.to_string(), tiers);
        self
    }

    /// Risk rules for the configured sections. Empty sections add no rule.
    pub fn risk_rules(&self) -> Vec<Box<dyn RiskRule>> {
        let mut rules: Vec<Box<dyn RiskRule>> = Vec::new();
        if !self.price_bands.is_empty() {
            rules.push(Box::new(LimitPriceRule::new(self.price_bands.clone())));
        }
        if !self.tick_sizes.is_empty() {
            rules.push(Box::new(TickSizeRule::new(self.tick_sizes.clone())));
        }
        rules
    }
}
