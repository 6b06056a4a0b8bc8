//! Process-level game registry — the surface the transport layer calls.
//!
//! RULES:
//!   - Each game owns exactly one controller and one simulation; they are
//!     never shared across games.
//!   - One mutex per game. Decision submission, the window close check,
//!     policy fill-in and the advance all serialize on it, so no two
//!     submissions can race to trigger a double advance.
//!   - A failed game never corrupts the registry; games are isolated.

use crate::{
    controller::{GameController, GameRules},
    engine::WeekResult,
    error::{GameError, GameResult},
    event::GameEvent,
    node::NodeTier,
    policy::PolicyKind,
    snapshot::GameSnapshot,
    types::{GameId, ParticipantId, Quantity, Week},
};
use anyhow::anyhow;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

#[derive(Default)]
pub struct GameManager {
    games: RwLock<HashMap<GameId, Arc<Mutex<GameController>>>>,
}

impl GameManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_game(&self, rules: GameRules) -> GameResult<GameId> {
        let controller = GameController::new(rules)?;
        let game_id = controller.game_id().clone();
        self.games
            .write()
            .map_err(|_| GameError::Other(anyhow!("game registry lock poisoned")))?
            .insert(game_id.clone(), Arc::new(Mutex::new(controller)));
        log::info!("created game {game_id}");
        Ok(game_id)
    }

    /// Drop a finished game. The simulation state dies with it.
    pub fn remove_game(&self, game_id: &str) -> GameResult<()> {
        let removed = self
            .games
            .write()
            .map_err(|_| GameError::Other(anyhow!("game registry lock poisoned")))?
            .remove(game_id);
        match removed {
            Some(_) => Ok(()),
            None => Err(GameError::UnknownGame {
                id: game_id.to_string(),
            }),
        }
    }

    pub fn add_participant(
        &self,
        game_id: &str,
        name: &str,
        role: NodeTier,
        human: bool,
        policy: Option<PolicyKind>,
    ) -> GameResult<ParticipantId> {
        self.with_game(game_id, |game| game.add_participant(name, role, human, policy))
    }

    pub fn start(&self, game_id: &str) -> GameResult<()> {
        self.with_game(game_id, |game| game.start())
    }

    pub fn pause(&self, game_id: &str) -> GameResult<()> {
        self.with_game(game_id, |game| game.pause())
    }

    pub fn resume(&self, game_id: &str) -> GameResult<()> {
        self.with_game(game_id, |game| game.resume())
    }

    pub fn stop(&self, game_id: &str) -> GameResult<()> {
        self.with_game(game_id, |game| game.stop())
    }

    pub fn submit_decision(
        &self,
        game_id: &str,
        participant_id: &str,
        quantity: Quantity,
    ) -> GameResult<()> {
        self.with_game(game_id, |game| game.submit_decision(participant_id, quantity))
    }

    /// Pump for AI-only games and timeouts: advances when every
    /// human-controlled tier has decided. Returns whether a week committed.
    pub fn advance_if_ready(&self, game_id: &str) -> GameResult<bool> {
        self.with_game(game_id, |game| game.advance_if_ready())
    }

    pub fn state_snapshot(&self, game_id: &str) -> GameResult<GameSnapshot> {
        self.with_game(game_id, |game| Ok(game.state_snapshot()))
    }

    pub fn week_result(&self, game_id: &str, week: Week) -> GameResult<Option<WeekResult>> {
        self.with_game(game_id, |game| Ok(game.week_result(week).cloned()))
    }

    /// Drain queued notifications for asynchronous delivery.
    pub fn drain_events(&self, game_id: &str) -> GameResult<Vec<GameEvent>> {
        self.with_game(game_id, |game| Ok(game.drain_events()))
    }

    fn with_game<T>(
        &self,
        game_id: &str,
        f: impl FnOnce(&mut GameController) -> GameResult<T>,
    ) -> GameResult<T> {
        let game = self.lookup(game_id)?;
        let mut guard: MutexGuard<'_, GameController> = game
            .lock()
            .map_err(|_| GameError::Other(anyhow!("game {game_id} mutex poisoned")))?;
        f(&mut guard)
    }

    fn lookup(&self, game_id: &str) -> GameResult<Arc<Mutex<GameController>>> {
        self.games
            .read()
            .map_err(|_| GameError::Other(anyhow!("game registry lock poisoned")))?
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::UnknownGame {
                id: game_id.to_string(),
            })
    }
}
