//! Per-tier node state and the weekly sub-operations applied by the engine.
//!
//! One record type with a tier tag — tier-specific behavior (the factory's
//! production release, the retailer's exogenous demand) is selected by the
//! advance algorithm in `engine.rs`, not by dispatch here.

use crate::config::SimConfig;
use crate::error::{GameError, GameResult};
use crate::types::{Quantity, Week};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain position is fixed: Retailer → Wholesaler → Distributor → Factory.
pub const CHAIN: [NodeTier; 4] = [
    NodeTier::Retailer,
    NodeTier::Wholesaler,
    NodeTier::Distributor,
    NodeTier::Factory,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeTier {
    Retailer,
    Wholesaler,
    Distributor,
    Factory,
}

impl NodeTier {
    /// Position in the chain, 0 (retailer) .. 3 (factory).
    pub fn position(self) -> usize {
        match self {
            Self::Retailer => 0,
            Self::Wholesaler => 1,
            Self::Distributor => 2,
            Self::Factory => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Retailer => "retailer",
            Self::Wholesaler => "wholesaler",
            Self::Distributor => "distributor",
            Self::Factory => "factory",
        }
    }

    /// Resolve a tier from its wire name, as transports address roles by
    /// string.
    pub fn from_name(name: &str) -> GameResult<Self> {
        CHAIN
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .ok_or_else(|| GameError::UnknownNode {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for NodeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a node shipped this week, split by whether the demand was new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fulfilment {
    pub shipped: Quantity,
    /// Portion of this week's *new* demand served without entering backlog.
    /// Old backlog is implicitly served first (single running counter).
    pub filled_immediately: Quantity,
}

/// The mutable state of one supply-chain tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    pub tier: NodeTier,
    pub inventory: Quantity,
    pub backlog: Quantity,
    pub last_order_placed: Quantity,
    pub last_order_received: Quantity,
    pub last_shipment_received: Quantity,
    pub last_shipment_sent: Quantity,
    // Running cost accumulators, in currency units.
    cumulative_holding_cost_milli: u64,
    cumulative_backlog_cost_milli: u64,
}

impl NodeState {
    pub fn new(tier: NodeTier, config: &SimConfig) -> Self {
        Self {
            tier,
            inventory: config.initial_inventory,
            backlog: config.initial_backlog,
            last_order_placed: config.pipeline_prime,
            // Seeded with the prime quantity so pass-through policies
            // sustain a primed steady state from week 1.
            last_order_received: config.pipeline_prime,
            last_shipment_received: 0,
            last_shipment_sent: 0,
            cumulative_holding_cost_milli: 0,
            cumulative_backlog_cost_milli: 0,
        }
    }

    /// Step 1 of the weekly transition: an arriving shipment enters stock.
    /// Saturates rather than wrapping; a saturated inventory loses units
    /// and the engine's conservation check then aborts the game.
    pub fn receive_shipment(&mut self, quantity: Quantity) {
        self.inventory = self.inventory.saturating_add(quantity);
        self.last_shipment_received = quantity;
    }

    /// Steps 2–3: take this week's demand, ship what inventory permits,
    /// carry the shortfall as backlog.
    ///
    /// Decisions are unconstrained `u32`s, so owed = demand + backlog can
    /// exceed the type once hostile orders pile up. The arithmetic is done
    /// in `u64` and backlog saturates at `Quantity::MAX` instead of
    /// wrapping.
    pub fn fulfil(&mut self, demand: Quantity) -> Fulfilment {
        self.last_order_received = demand;

        let owed = u64::from(demand) + u64::from(self.backlog);
        let shipped = owed.min(u64::from(self.inventory)) as Quantity;
        self.inventory -= shipped;

        let filled_immediately = u64::from(shipped)
            .saturating_sub(u64::from(self.backlog))
            .min(u64::from(demand)) as Quantity;
        self.backlog = (owed - u64::from(shipped)).min(u64::from(Quantity::MAX)) as Quantity;
        self.last_shipment_sent = shipped;

        Fulfilment {
            shipped,
            filled_immediately,
        }
    }

    /// Step 5: accrue this week's costs. Returns (holding, backlog) for
    /// the week; totals accumulate internally.
    pub fn accrue_costs(&mut self, holding_rate: f64, backlog_rate: f64) -> (f64, f64) {
        let holding = f64::from(self.inventory) * holding_rate;
        let backlog = f64::from(self.backlog) * backlog_rate;
        self.cumulative_holding_cost_milli += to_milli(holding);
        self.cumulative_backlog_cost_milli += to_milli(backlog);
        (holding, backlog)
    }

    pub fn cumulative_holding_cost(&self) -> f64 {
        self.cumulative_holding_cost_milli as f64 / 1_000.0
    }

    pub fn cumulative_backlog_cost(&self) -> f64 {
        self.cumulative_backlog_cost_milli as f64 / 1_000.0
    }

    /// The state a decision source is allowed to see.
    pub fn view(&self, supply_line: Quantity) -> NodeView {
        NodeView {
            tier: self.tier,
            inventory: self.inventory,
            backlog: self.backlog,
            supply_line,
            last_demand: self.last_order_received,
        }
    }

    /// Externally visible projection of this node after a committed week.
    pub fn snapshot(
        &self,
        week: Week,
        holding_cost: f64,
        backlog_cost: f64,
        filled_immediately: Quantity,
    ) -> NodeSnapshot {
        NodeSnapshot {
            tier: self.tier,
            week,
            inventory: self.inventory,
            backlog: self.backlog,
            order_placed: self.last_order_placed,
            demand_observed: self.last_order_received,
            shipment_sent: self.last_shipment_sent,
            shipment_received: self.last_shipment_received,
            filled_immediately,
            holding_cost,
            backlog_cost,
            cumulative_holding_cost: self.cumulative_holding_cost(),
            cumulative_backlog_cost: self.cumulative_backlog_cost(),
        }
    }
}

/// Costs are accumulated in integer milli-units so that repeated f64
/// addition cannot drift between two same-seed runs.
fn to_milli(amount: f64) -> u64 {
    (amount * 1_000.0).round() as u64
}

/// The visible state handed to ordering policies. Pure data — policies
/// may not reach past it into the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub tier: NodeTier,
    pub inventory: Quantity,
    pub backlog: Quantity,
    /// Units ordered (or released to production) but not yet arrived.
    pub supply_line: Quantity,
    /// Demand observed in the most recently committed week.
    pub last_demand: Quantity,
}

/// Per-node slice of a committed week. These numeric fields are the
/// authoritative contract any transport serialization must preserve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSnapshot {
    pub tier: NodeTier,
    pub week: Week,
    pub inventory: Quantity,
    pub backlog: Quantity,
    pub order_placed: Quantity,
    pub demand_observed: Quantity,
    pub shipment_sent: Quantity,
    pub shipment_received: Quantity,
    pub filled_immediately: Quantity,
    pub holding_cost: f64,
    pub backlog_cost: f64,
    pub cumulative_holding_cost: f64,
    pub cumulative_backlog_cost: f64,
}
