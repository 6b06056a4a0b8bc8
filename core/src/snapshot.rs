//! Game-state snapshot — the `get_state` projection handed to transports.
//!
//! This is a read-only copy; serializing it is the collaborator's concern,
//! but the numeric fields here are the authoritative contract.

use crate::controller::{GameStatus, Participant};
use crate::metrics::MetricsSummary;
use crate::node::NodeSnapshot;
use crate::types::{GameId, Week};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub status: GameStatus,
    pub failed: bool,
    /// Last committed week.
    pub week: Week,
    pub max_weeks: Week,
    pub nodes: [NodeSnapshot; 4],
    pub metrics: MetricsSummary,
    pub participants: Vec<Participant>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}
