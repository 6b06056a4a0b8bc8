//! Exogenous customer demand at the retailer.
//!
//! RULE: nothing in the simulation may call any platform RNG. Stochastic
//! patterns draw from a single Pcg64Mcg seeded from the game rules, so the
//! same seed always yields the same demand sequence.

use crate::types::{Quantity, Week};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Demand patterns supported by the scenario layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum DemandPattern {
    /// The same quantity every week.
    Constant { level: Quantity },
    /// `base` until `step_week`, then `level` — the classic bullwhip shock.
    Step {
        base: Quantity,
        step_week: Week,
        level: Quantity,
    },
    /// Uniform draw in [base − spread, base + spread], floored at 0.
    Random { base: Quantity, spread: Quantity },
    /// Sinusoidal around `base` with the given amplitude and period.
    Seasonal {
        base: Quantity,
        amplitude: f64,
        period: Week,
    },
}

impl Default for DemandPattern {
    fn default() -> Self {
        Self::Constant { level: 4 }
    }
}

/// Owns the pattern plus its seeded rng; yields one quantity per week.
#[derive(Debug, Clone)]
pub struct DemandGenerator {
    pattern: DemandPattern,
    rng: Pcg64Mcg,
}

impl DemandGenerator {
    /// The seed is mixed with a fixed odd constant so the demand stream
    /// stays independent of any other consumer of the master seed.
    pub fn new(pattern: DemandPattern, master_seed: u64) -> Self {
        let derived = master_seed ^ 0x9e37_79b9_7f4a_7c15;
        Self {
            pattern,
            rng: Pcg64Mcg::seed_from_u64(derived),
        }
    }

    /// Customer demand for the given week. Mutates only the rng stream.
    pub fn next_demand(&mut self, week: Week) -> Quantity {
        match self.pattern {
            DemandPattern::Constant { level } => level,
            DemandPattern::Step {
                base,
                step_week,
                level,
            } => {
                if week >= step_week {
                    level
                } else {
                    base
                }
            }
            DemandPattern::Random { base, spread } => {
                let lo = base.saturating_sub(spread);
                let hi = base + spread;
                self.rng.gen_range(lo..=hi)
            }
            DemandPattern::Seasonal {
                base,
                amplitude,
                period,
            } => {
                let angle = 2.0 * std::f64::consts::PI * week as f64 / period.max(1) as f64;
                let level = f64::from(base) + amplitude * angle.sin();
                level.round().max(0.0) as Quantity
            }
        }
    }
}
