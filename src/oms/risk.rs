//! Pre-trade risk rules applied before an order reaches the engine.

use crate::oms::error::OmsError;
use crate::oms::model::OmsOrder;
use crate::orderbook::order::OrderType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A check run against every new order.
pub trait RiskRule: Send + Sync {
    /// Short name used in rejections.
    fn name(&self) -> &'static str;

    /// # Errors
    /// [`OmsError::RiskRejected`] when the order violates the rule.
    fn check(&self, order: &OmsOrder) -> Result<(), OmsError>;
}

/// Inclusive price band for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub floor: u128,
    pub ceiling: u128,
}

/// Rejects limit prices outside a per-symbol band. Symbols without a band pass.
#[derive(Debug, Clone, Default)]
pub struct LimitPriceRule {
    bands: HashMap<String, PriceBand>,
}

impl LimitPriceRule {
    pub fn new(bands: HashMap<String, PriceBand>) -> Self {
        Self { bands }
    }

    /// Add or replace the band for `symbol`.
    pub fn with_band(mut self, symbol: &str, floor: u128, ceiling: u128) -> Self {
        self.bands
            .insert(symbol.to_string(), PriceBand { floor, ceiling });
        self
    }
}

impl RiskRule for LimitPriceRule {
    fn name(&self) -> &'static str {
        "limit_price"
    }

    fn check(&self, order: &OmsOrder) -> Result<(), OmsError> {
        if order.order_type == OrderType::Market {
            return Ok(());
        }
        let Some(band) = self.bands.get(&order.symbol) else {
            return Ok(());
        };
        if order.price < band.floor || order.price > band.ceiling {
            return Err(OmsError::RiskRejected {
                order_id: order.order_id.clone(),
                rule: self.name(),
                reason: format!(
                    "price {} outside [{}, {}]",
                    order.price, band.floor, band.ceiling
                ),
            });
        }
        Ok(())
    }
}

/// One tier of a tick-size table. `max_price == 0` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTier {
    pub max_price: u128,
    pub step: u128,
}

/// Requires prices to be a multiple of the tick step of their price tier.
///
/// Tiers are tried in order; the first with `max_price == 0` or
/// `price <= max_price` applies.
#[derive(Debug, Clone, Default)]
pub struct TickSizeRule {
    tiers: HashMap<String, Vec<TickTier>>,
}

impl TickSizeRule {
    pub fn new(tiers: HashMap<String, Vec<TickTier>>) -> Self {
        Self { tiers }
    }

    /// Set the tier table for `symbol`.
    pub fn with_tiers(mut self, symbol: &str, tiers: Vec<TickTier>) -> Self {
        self.tiers.insert(symbol.to_string(), tiers);
        self
    }

    /// Parse a `{ "SYMBOL": [ { "max_price": .., "step": .. }, .. ] }` table.
    ///
    /// # Errors
    /// [`OmsError::Json`] if the document does not parse.
    pub fn from_json_str(json: &str) -> Result<Self, OmsError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }
}

impl RiskRule for TickSizeRule {
    fn name(&self) -> &'static str {
        "tick_size"
    }

    fn check(&self, order: &OmsOrder) -> Result<(), OmsError> {
        if order.order_type == OrderType::Market {
            return Ok(());
        }
        let Some(tiers) = self.tiers.get(&order.symbol) else {
            return Ok(());
        };
        let tier = tiers
            .iter()
            .find(|t| t.max_price == 0 || order.price <= t.max_price);
        match tier {
            Some(tier) if tier.step > 0 && order.price % tier.step != 0 => {
                Err(OmsError::RiskRejected {
                    order_id: order.order_id.clone(),
                    rule: self.name(),
                    reason: format!("price {} is not a multiple of {}", order.price, tier.step),
                })
            }
            _ => Ok(()),
        }
    }
}
