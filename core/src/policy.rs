//! Ordering policies for AI-controlled tiers.
//!
//! RULE: policies are pure, non-blocking functions of the visible node
//! state. They run inside the controller's critical section, so anything
//! slower than arithmetic does not belong here. Richer heuristics are the
//! collaborator layer's concern — this enum is closed.

use crate::node::NodeView;
use crate::types::{Quantity, Week};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyKind {
    /// Order exactly the demand observed last week.
    PassThrough,
    /// Order a fixed quantity every week.
    Constant { quantity: Quantity },
    /// Order-up-to: cover observed demand plus the gap between `target`
    /// and the net inventory position (on hand − backlog + supply line).
    BaseStock { target: Quantity },
}

impl Default for PolicyKind {
    fn default() -> Self {
        Self::PassThrough
    }
}

impl PolicyKind {
    pub fn decide(&self, _week: Week, view: &NodeView) -> Quantity {
        match self {
            Self::PassThrough => view.last_demand,
            Self::Constant { quantity } => *quantity,
            Self::BaseStock { target } => {
                let position = i64::from(view.inventory) - i64::from(view.backlog)
                    + i64::from(view.supply_line);
                let gap = i64::from(*target) - position;
                let order = i64::from(view.last_demand) + gap;
                order.clamp(0, i64::from(Quantity::MAX)) as Quantity
            }
        }
    }
}
