//! Simulation configuration — immutable after game start.

use crate::demand::DemandPattern;
use crate::error::GameResult;
use crate::types::{Quantity, Week};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub max_weeks: Week,
    pub initial_inventory: Quantity,
    pub initial_backlog: Quantity,

    // Cost parameters (per unit per week).
    pub holding_cost_per_unit: f64,
    pub backlog_cost_per_unit: f64,

    // Lead times, in weeks. Fixed for the game's duration.
    pub order_delay: usize,
    pub shipment_delay: usize,
    pub production_delay: usize,

    /// Most units the factory may release into production per week.
    pub production_capacity: Quantity,

    /// Initial quantity in every pipeline slot. 0 = empty pipes; priming
    /// with the base demand starts the chain in steady state.
    pub pipeline_prime: Quantity,

    pub demand: DemandPattern,

    /// Master seed for all stochastic demand.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_weeks: 52,
            initial_inventory: 12,
            initial_backlog: 0,
            holding_cost_per_unit: 0.5,
            backlog_cost_per_unit: 1.0,
            order_delay: 2,
            shipment_delay: 2,
            production_delay: 2,
            production_capacity: 100,
            pipeline_prime: 0,
            demand: DemandPattern::default(),
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(raw: &str) -> GameResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GameResult<()> {
        if self.max_weeks == 0 {
            return Err(anyhow!("max_weeks must be at least 1").into());
        }
        if self.order_delay == 0 || self.shipment_delay == 0 || self.production_delay == 0 {
            return Err(anyhow!("lead times must be at least 1 week").into());
        }
        if self.holding_cost_per_unit < 0.0 || self.backlog_cost_per_unit < 0.0 {
            return Err(anyhow!("cost rates must be non-negative").into());
        }
        if self.production_capacity == 0 {
            return Err(anyhow!("production_capacity must be at least 1").into());
        }
        Ok(())
    }
}
