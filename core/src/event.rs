//! Outbound notifications for the transport layer.
//!
//! RULE: the core never blocks on delivery. The controller pushes events
//! into a queue; the collaborator drains it outside the critical section.
//! There is no subscriber graph.

use crate::engine::WeekResult;
use crate::metrics::MetricsSummary;
use crate::node::NodeTier;
use crate::types::{GameId, ParticipantId, Week};
use serde::{Deserialize, Serialize};

/// Every notification a game emits, in emission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Lifecycle ─────────────────────────────────
    GameCreated {
        game_id: GameId,
    },
    ParticipantJoined {
        game_id: GameId,
        participant_id: ParticipantId,
        name: String,
        role: NodeTier,
        human: bool,
    },
    GameStarted {
        game_id: GameId,
    },
    GamePaused {
        game_id: GameId,
        week: Week,
    },
    GameResumed {
        game_id: GameId,
        week: Week,
    },

    // ── Per committed week ────────────────────────
    WeekCompleted {
        game_id: GameId,
        week: Week,
        result: WeekResult,
        metrics: MetricsSummary,
    },

    // ── Terminal ──────────────────────────────────
    GameEnded {
        game_id: GameId,
        week: Week,
        reason: EndReason,
        final_metrics: MetricsSummary,
        scores: Vec<ParticipantScore>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    MaxWeeksReached,
    WinConditionMet,
    Stopped,
    /// The core's central invariant was broken; the game aborted.
    InvariantViolation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantScore {
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub name: String,
    pub role: NodeTier,
    pub score: f64,
    pub node_cost: f64,
}
