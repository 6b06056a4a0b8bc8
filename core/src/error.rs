use crate::controller::GameStatus;
use crate::node::NodeTier;
use crate::types::{GameId, ParticipantId, Week};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("operation '{op}' not valid while game is {status:?}")]
    InvalidState { status: GameStatus, op: &'static str },

    #[error("collection window for week {week} is closed")]
    WindowClosed { week: Week },

    #[error("no decision supplied for {tier}")]
    DecisionMissing { tier: NodeTier },

    #[error("advance requested for week {actual}, but week {expected} is open")]
    WeekMismatch { expected: Week, actual: Week },

    #[error("game already completed")]
    GameComplete,

    #[error("role {role} is already assigned")]
    RoleTaken { role: NodeTier },

    #[error("unknown participant '{id}'")]
    UnknownParticipant { id: ParticipantId },

    #[error("unknown game '{id}'")]
    UnknownGame { id: GameId },

    #[error("unknown node '{name}'")]
    UnknownNode { name: String },

    #[error("conservation violated at week {week}: {detail}")]
    InvariantViolation { week: Week, detail: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GameResult<T> = Result<T, GameError>;
