//! The weekly clock — owns the authoritative node state and exposes
//! "advance one week" as an atomic transaction.
//!
//! EXECUTION ORDER within a tick (fixed, documented, never reordered):
//!   1. Pop every arrival from the committed pipes
//!      (orders flowing upstream, shipments flowing downstream, production)
//!   2. Receive shipments, then fulfil demand, per node — all against the
//!      quantities popped in phase 1, so no node sees another's post-tick
//!      state within the same week
//!   3. Push the new orders and shipments into the pipes
//!   4. Accrue costs, verify unit conservation, commit the week
//!
//! RULES:
//!   - advance_week() is invoked at most once per week. The caller names
//!     the week it believes is open; a mismatch is rejected.
//!   - All randomness flows through the DemandGenerator's seeded rng.
//!   - A conservation failure is fatal to the game instance.

use crate::{
    config::SimConfig,
    demand::DemandGenerator,
    error::{GameError, GameResult},
    node::{NodeSnapshot, NodeState, NodeTier, NodeView, CHAIN},
    pipeline::DelayQueue,
    types::{Quantity, Week},
};
use serde::{Deserialize, Serialize};

/// One decision per tier for a single week. The factory's entry is its
/// production release, not an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decisions {
    slots: [Option<Quantity>; 4],
}

impl Decisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a decision, returning any value it overwrote.
    pub fn set(&mut self, tier: NodeTier, quantity: Quantity) -> Option<Quantity> {
        self.slots[tier.position()].replace(quantity)
    }

    pub fn get(&self, tier: NodeTier) -> Option<Quantity> {
        self.slots[tier.position()]
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    fn resolved(&self) -> GameResult<[Quantity; 4]> {
        let mut out = [0; 4];
        for tier in CHAIN {
            out[tier.position()] = self.slots[tier.position()]
                .ok_or(GameError::DecisionMissing { tier })?;
        }
        Ok(out)
    }
}

/// Per-node post-tick snapshots plus week-level aggregates for one
/// committed week. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekResult {
    pub week: Week,
    pub customer_demand: Quantity,
    pub nodes: [NodeSnapshot; 4],
    pub holding_cost: f64,
    pub backlog_cost: f64,
    pub total_cost: f64,
    pub cumulative_cost: f64,
}

/// The simulation environment: week counter, the four nodes in chain
/// order, and every transit pipe between them.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    /// Last committed week. Starts at 0; week `n + 1` is the open one.
    week: Week,
    nodes: [NodeState; 4],
    /// order_pipes[i] carries orders from CHAIN[i] up to CHAIN[i + 1].
    order_pipes: [DelayQueue; 3],
    /// shipment_pipes[i] carries goods from CHAIN[i + 1] down to CHAIN[i].
    shipment_pipes: [DelayQueue; 3],
    /// The factory's replenishment side: unlimited raw material, only a
    /// production delay. No backlog is possible on this edge.
    production_pipe: DelayQueue,
    demand: DemandGenerator,
    cumulative_cost: f64,
}

impl Simulation {
    pub fn new(config: SimConfig) -> GameResult<Self> {
        config.validate()?;
        let nodes = CHAIN.map(|tier| NodeState::new(tier, &config));
        let order_pipes =
            std::array::from_fn(|_| DelayQueue::primed(config.order_delay, config.pipeline_prime));
        let shipment_pipes = std::array::from_fn(|_| {
            DelayQueue::primed(config.shipment_delay, config.pipeline_prime)
        });
        let production_pipe =
            DelayQueue::primed(config.production_delay, config.pipeline_prime);
        let demand = DemandGenerator::new(config.demand.clone(), config.seed);
        Ok(Self {
            config,
            week: 0,
            nodes,
            order_pipes,
            shipment_pipes,
            production_pipe,
            demand,
            cumulative_cost: 0.0,
        })
    }

    pub fn week(&self) -> Week {
        self.week
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn is_finished(&self) -> bool {
        self.week >= self.config.max_weeks
    }

    pub fn node(&self, tier: NodeTier) -> &NodeState {
        &self.nodes[tier.position()]
    }

    /// The state a decision source for `tier` is allowed to see.
    pub fn node_view(&self, tier: NodeTier) -> NodeView {
        self.nodes[tier.position()].view(self.supply_line(tier))
    }

    /// Units this tier has ordered (or released) that have not yet arrived.
    /// Saturates at `Quantity::MAX` for the policy view; pipes can carry
    /// more than the slot type once extreme orders stack up.
    fn supply_line(&self, tier: NodeTier) -> Quantity {
        let total = match tier {
            NodeTier::Factory => self.production_pipe.in_transit(),
            t => {
                let i = t.position();
                self.order_pipes[i].in_transit() + self.shipment_pipes[i].in_transit()
            }
        };
        total.min(u64::from(Quantity::MAX)) as Quantity
    }

    /// Total physical units in the system: on-hand stock plus everything
    /// in a shipment or production pipe. Orders are information, not
    /// units, so order pipes are excluded.
    pub fn physical_units(&self) -> u64 {
        let stock: u64 = self.nodes.iter().map(|n| u64::from(n.inventory)).sum();
        let transit: u64 = self.shipment_pipes.iter().map(DelayQueue::in_transit).sum();
        stock + transit + self.production_pipe.in_transit()
    }

    /// Snapshots of the current committed state, with zeroed week costs.
    /// Used by `get_state` before the first week commits.
    pub fn current_snapshots(&self) -> [NodeSnapshot; 4] {
        CHAIN.map(|tier| self.nodes[tier.position()].snapshot(self.week, 0.0, 0.0, 0))
    }

    /// Advance the simulation by exactly one week.
    ///
    /// `for_week` must be the single open week (`week() + 1`); anything
    /// else fails with `WeekMismatch`, which is what makes a double
    /// advance without a new collection window impossible.
    pub fn advance_week(
        &mut self,
        for_week: Week,
        decisions: &Decisions,
    ) -> GameResult<WeekResult> {
        let open = self.week + 1;
        if for_week != open {
            return Err(GameError::WeekMismatch {
                expected: open,
                actual: for_week,
            });
        }
        if for_week > self.config.max_weeks {
            return Err(GameError::GameComplete);
        }
        let orders = decisions.resolved()?;

        let units_before = self.physical_units();

        // ── Phase 1: arrivals ────────────────────────────────────────
        let customer_demand = self.demand.next_demand(for_week);
        // Orders placed `order_delay` weeks ago become visible upstream.
        let arriving_orders: [Quantity; 3] =
            std::array::from_fn(|i| self.order_pipes[i].pop_arrival());
        // Goods shipped `shipment_delay` weeks ago reach their tier.
        let arriving_shipments: [Quantity; 3] =
            std::array::from_fn(|i| self.shipment_pipes[i].pop_arrival());
        let finished_production = self.production_pipe.pop_arrival();

        // ── Phase 2: receive, then fulfil ────────────────────────────
        for i in 0..3 {
            self.nodes[i].receive_shipment(arriving_shipments[i]);
        }
        self.nodes[3].receive_shipment(finished_production);

        let demands = [
            customer_demand,
            arriving_orders[0],
            arriving_orders[1],
            arriving_orders[2],
        ];
        let fulfilments = std::array::from_fn::<_, 4, _>(|i| self.nodes[i].fulfil(demands[i]));

        // ── Phase 3: departures ──────────────────────────────────────
        for i in 0..3 {
            self.nodes[i].last_order_placed = orders[i];
            self.order_pipes[i].push_departure(orders[i]);
        }
        // The factory releases production instead of ordering upstream.
        let release = orders[3].min(self.config.production_capacity);
        self.nodes[3].last_order_placed = release;
        self.production_pipe.push_departure(release);

        // Upstream tiers' shipments enter transit toward their customers.
        for i in 0..3 {
            self.shipment_pipes[i].push_departure(fulfilments[i + 1].shipped);
        }
        // The retailer's shipment leaves the system entirely.
        let sold = fulfilments[0].shipped;

        // ── Phase 4: costs, conservation, commit ─────────────────────
        let mut holding_cost = 0.0;
        let mut backlog_cost = 0.0;
        let mut week_costs = [(0.0, 0.0); 4];
        for i in 0..4 {
            let costs = self.nodes[i].accrue_costs(
                self.config.holding_cost_per_unit,
                self.config.backlog_cost_per_unit,
            );
            holding_cost += costs.0;
            backlog_cost += costs.1;
            week_costs[i] = costs;
        }

        let units_after = self.physical_units();
        let expected = units_before as i64 + i64::from(release) - i64::from(sold);
        if units_after as i64 != expected {
            return Err(GameError::InvariantViolation {
                week: for_week,
                detail: format!(
                    "physical units {units_after}, expected {expected} \
                     (before {units_before}, released {release}, sold {sold})"
                ),
            });
        }

        let total_cost = holding_cost + backlog_cost;
        self.cumulative_cost += total_cost;
        self.week = for_week;

        let nodes = std::array::from_fn::<_, 4, _>(|i| {
            self.nodes[i].snapshot(
                for_week,
                week_costs[i].0,
                week_costs[i].1,
                fulfilments[i].filled_immediately,
            )
        });

        log::debug!(
            "week={for_week} demand={customer_demand} sold={sold} released={release} \
             cost={total_cost:.2}"
        );

        Ok(WeekResult {
            week: for_week,
            customer_demand,
            nodes,
            holding_cost,
            backlog_cost,
            total_cost,
            cumulative_cost: self.cumulative_cost,
        })
    }
}
