//! Metrics collection and derived aggregates.
//!
//! The controller pushes every committed `WeekResult` here; nothing else
//! mutates the collector, and read operations never do.

use crate::engine::WeekResult;
use crate::node::{NodeTier, CHAIN};
use crate::types::Week;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default)]
struct NodeSeries {
    orders: Vec<f64>,
    demands: Vec<f64>,
    demand_total: u64,
    filled_total: u64,
    inventory_total: u64,
    inventory_max: u64,
    backlog_total: u64,
    backlog_max: u64,
    stockout_weeks: u64,
    holding_cost: f64,
    backlog_cost: f64,
}

/// Append-only per-node time series plus on-demand aggregates.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    weeks: Week,
    series: [NodeSeries; 4],
    total_holding_cost: f64,
    total_backlog_cost: f64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one committed week. Exactly one call per committed week.
    pub fn record(&mut self, result: &WeekResult) {
        self.weeks = result.week;
        self.total_holding_cost += result.holding_cost;
        self.total_backlog_cost += result.backlog_cost;

        for snapshot in &result.nodes {
            let series = &mut self.series[snapshot.tier.position()];
            series.orders.push(f64::from(snapshot.order_placed));
            series.demands.push(f64::from(snapshot.demand_observed));
            series.demand_total += u64::from(snapshot.demand_observed);
            series.filled_total += u64::from(snapshot.filled_immediately);
            series.inventory_total += u64::from(snapshot.inventory);
            series.inventory_max = series.inventory_max.max(u64::from(snapshot.inventory));
            series.backlog_total += u64::from(snapshot.backlog);
            series.backlog_max = series.backlog_max.max(u64::from(snapshot.backlog));
            if snapshot.backlog > 0 {
                series.stockout_weeks += 1;
            }
            series.holding_cost += snapshot.holding_cost;
            series.backlog_cost += snapshot.backlog_cost;
        }
    }

    pub fn weeks_recorded(&self) -> Week {
        self.weeks
    }

    /// Cumulative demand served without entering backlog, over cumulative
    /// demand. 1.0 while no demand has been observed.
    pub fn fill_rate(&self, tier: NodeTier) -> f64 {
        let series = &self.series[tier.position()];
        if series.demand_total == 0 {
            return 1.0;
        }
        series.filled_total as f64 / series.demand_total as f64
    }

    pub fn system_fill_rate(&self) -> f64 {
        let demand: u64 = self.series.iter().map(|s| s.demand_total).sum();
        let filled: u64 = self.series.iter().map(|s| s.filled_total).sum();
        if demand == 0 {
            return 1.0;
        }
        filled as f64 / demand as f64
    }

    /// Variance of orders placed over variance of demand observed.
    /// Undefined — reported as `None`, not an error — before two weeks of
    /// data exist or when the observed demand has zero variance.
    pub fn bullwhip_ratio(&self, tier: NodeTier) -> Option<f64> {
        let series = &self.series[tier.position()];
        if series.demands.len() < 2 {
            return None;
        }
        let demand_var = variance(&series.demands);
        if demand_var == 0.0 {
            return None;
        }
        Some(variance(&series.orders) / demand_var)
    }

    pub fn total_holding_cost(&self) -> f64 {
        self.total_holding_cost
    }

    pub fn total_backlog_cost(&self) -> f64 {
        self.total_backlog_cost
    }

    /// Sum of all nodes' holding + backlog accumulators at the current week.
    pub fn total_cost(&self) -> f64 {
        self.total_holding_cost + self.total_backlog_cost
    }

    pub fn node_summary(&self, tier: NodeTier) -> NodeMetrics {
        let series = &self.series[tier.position()];
        let weeks = series.orders.len() as f64;
        let avg = |total: u64| if weeks > 0.0 { total as f64 / weeks } else { 0.0 };
        NodeMetrics {
            tier,
            fill_rate: self.fill_rate(tier),
            bullwhip_ratio: self.bullwhip_ratio(tier),
            total_cost: series.holding_cost + series.backlog_cost,
            average_inventory: avg(series.inventory_total),
            max_inventory: series.inventory_max,
            average_backlog: avg(series.backlog_total),
            max_backlog: series.backlog_max,
            stockout_weeks: series.stockout_weeks,
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            weeks: self.weeks,
            total_cost: self.total_cost(),
            total_holding_cost: self.total_holding_cost,
            total_backlog_cost: self.total_backlog_cost,
            system_fill_rate: self.system_fill_rate(),
            nodes: CHAIN.map(|tier| self.node_summary(tier)),
        }
    }
}

/// Population variance. Two entries minimum; callers gate on that.
fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeMetrics {
    pub tier: NodeTier,
    pub fill_rate: f64,
    pub bullwhip_ratio: Option<f64>,
    pub total_cost: f64,
    pub average_inventory: f64,
    pub max_inventory: u64,
    pub average_backlog: f64,
    pub max_backlog: u64,
    pub stockout_weeks: u64,
}

/// System-wide aggregate view, published with every committed week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    pub weeks: Week,
    pub total_cost: f64,
    pub total_holding_cost: f64,
    pub total_backlog_cost: f64,
    pub system_fill_rate: f64,
    pub nodes: [NodeMetrics; 4],
}
