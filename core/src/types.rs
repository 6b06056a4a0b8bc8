//! Shared primitive types used across the entire simulation.

/// A committed-week counter. One tick = one in-game week, starting at 0.
pub type Week = u64;

/// A count of physical units. Quantities are never negative by construction.
pub type Quantity = u32;

/// The canonical game identifier (uuid v4).
pub type GameId = String;

/// A stable, unique identifier for a participant in a game.
pub type ParticipantId = String;
