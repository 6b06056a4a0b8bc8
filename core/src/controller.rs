//! Game controller — participant bookkeeping and turn synchronization.
//!
//! STATE MACHINE: Setup → Ready → InProgress ⇄ Paused → Completed.
//!
//! RULES:
//!   - Exactly one collection window is open at a time, for week() + 1.
//!   - The window close check, policy fill-in and advance_week() form one
//!     critical section; `GameManager` serializes callers on a per-game
//!     mutex, so the controller itself takes `&mut self` and stays
//!     lock-free.
//!   - pause/resume only gate submissions. Simulation state is untouched.
//!   - A conservation failure marks the game completed-with-error; no
//!     other game is affected.

use crate::{
    config::SimConfig,
    engine::{Decisions, Simulation, WeekResult},
    error::{GameError, GameResult},
    event::{EndReason, GameEvent, ParticipantScore},
    metrics::MetricsCollector,
    node::{NodeTier, CHAIN},
    policy::PolicyKind,
    snapshot::GameSnapshot,
    types::{GameId, ParticipantId, Quantity, Week},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Setup,
    Ready,
    InProgress,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Human,
    Policy,
}

/// One decision for one (tier, week). Overwritable while the window is
/// open; immutable history once the week commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionRecord {
    pub tier: NodeTier,
    pub week: Week,
    pub quantity: Quantity,
    pub source: DecisionSource,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub role: NodeTier,
    pub human: bool,
    /// Used to fill this tier's slot when no human decision arrives
    /// before the window closes, and for AI-controlled tiers every week.
    pub policy: PolicyKind,
}

/// Rules and win-condition thresholds. Any breached threshold forces the
/// game to Completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GameRules {
    /// Cost ceiling: the game ends once total cost reaches this.
    pub max_total_cost: Option<f64>,
    /// Service-level floor: the game ends if system fill rate drops below.
    pub min_fill_rate: Option<f64>,
    /// Bullwhip ceiling: the game ends if any node's ratio exceeds this.
    pub max_bullwhip: Option<f64>,
    pub sim: SimConfig,
}

impl GameRules {
    pub fn max_weeks(&self) -> Week {
        self.sim.max_weeks
    }
}

pub struct GameController {
    game_id: GameId,
    rules: GameRules,
    status: GameStatus,
    /// Set when the game aborted on an invariant violation.
    failed: bool,
    simulation: Simulation,
    metrics: MetricsCollector,
    participants: Vec<Participant>,
    /// Pending decisions for the open week, one slot per tier.
    pending: [Option<DecisionRecord>; 4],
    history: Vec<WeekResult>,
    decision_log: Vec<DecisionRecord>,
    events: VecDeque<GameEvent>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl GameController {
    pub fn new(rules: GameRules) -> GameResult<Self> {
        let simulation = Simulation::new(rules.sim.clone())?;
        let game_id = Uuid::new_v4().to_string();
        let mut events = VecDeque::new();
        events.push_back(GameEvent::GameCreated {
            game_id: game_id.clone(),
        });
        Ok(Self {
            game_id,
            rules,
            status: GameStatus::Setup,
            failed: false,
            simulation,
            metrics: MetricsCollector::new(),
            participants: Vec::new(),
            pending: Default::default(),
            history: Vec::new(),
            decision_log: Vec::new(),
            events,
            started_at: None,
            ended_at: None,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Last committed week.
    pub fn current_week(&self) -> Week {
        self.simulation.week()
    }

    /// The week whose collection window is (or would be) open.
    pub fn open_week(&self) -> Week {
        self.simulation.week() + 1
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Historical result for a committed week; `None` if that week never
    /// committed (including a week discarded by `stop`).
    pub fn week_result(&self, week: Week) -> Option<&WeekResult> {
        if week == 0 {
            return None;
        }
        self.history.get(week as usize - 1)
    }

    /// Immutable record of every decision actually used at an advance.
    pub fn decision_log(&self) -> &[DecisionRecord] {
        &self.decision_log
    }

    /// Drain queued notifications for asynchronous delivery.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn state_snapshot(&self) -> GameSnapshot {
        let nodes = match self.history.last() {
            Some(result) => result.nodes.clone(),
            None => self.simulation.current_snapshots(),
        };
        GameSnapshot {
            game_id: self.game_id.clone(),
            status: self.status,
            failed: self.failed,
            week: self.simulation.week(),
            max_weeks: self.rules.max_weeks(),
            nodes,
            metrics: self.metrics.summary(),
            participants: self.participants.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }

    // ── Setup ────────────────────────────────────────────────────────

    /// Register a participant for a tier. Only valid during Setup; each
    /// tier takes at most one participant. Tiers left unassigned are
    /// AI-controlled with the default policy.
    pub fn add_participant(
        &mut self,
        name: &str,
        role: NodeTier,
        human: bool,
        policy: Option<PolicyKind>,
    ) -> GameResult<ParticipantId> {
        if self.status != GameStatus::Setup {
            return Err(GameError::InvalidState {
                status: self.status,
                op: "add_participant",
            });
        }
        if self.participants.iter().any(|p| p.role == role) {
            return Err(GameError::RoleTaken { role });
        }
        let participant = Participant {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role,
            human,
            policy: policy.unwrap_or_default(),
        };
        let id = participant.id.clone();
        self.events.push_back(GameEvent::ParticipantJoined {
            game_id: self.game_id.clone(),
            participant_id: id.clone(),
            name: participant.name.clone(),
            role,
            human,
        });
        self.participants.push(participant);
        Ok(id)
    }

    /// Setup → Ready. All roles are considered filled: unassigned tiers
    /// default to AI control.
    pub fn initialize(&mut self) -> GameResult<()> {
        if self.status != GameStatus::Setup {
            return Err(GameError::InvalidState {
                status: self.status,
                op: "initialize",
            });
        }
        self.status = GameStatus::Ready;
        log::info!("game {} ready with {} participants", self.game_id, self.participants.len());
        Ok(())
    }

    /// (Setup | Ready) → InProgress. Opens the collection window for week 1.
    pub fn start(&mut self) -> GameResult<()> {
        match self.status {
            GameStatus::Setup => self.initialize()?,
            GameStatus::Ready => {}
            status => {
                return Err(GameError::InvalidState { status, op: "start" });
            }
        }
        self.status = GameStatus::InProgress;
        self.started_at = Some(Utc::now());
        self.events.push_back(GameEvent::GameStarted {
            game_id: self.game_id.clone(),
        });
        log::info!("game {} started", self.game_id);
        Ok(())
    }

    // ── Pause / resume / stop ────────────────────────────────────────

    /// Reject new submissions until resumed. Never touches simulation state.
    pub fn pause(&mut self) -> GameResult<()> {
        if self.status != GameStatus::InProgress {
            return Err(GameError::InvalidState {
                status: self.status,
                op: "pause",
            });
        }
        self.status = GameStatus::Paused;
        self.events.push_back(GameEvent::GamePaused {
            game_id: self.game_id.clone(),
            week: self.simulation.week(),
        });
        Ok(())
    }

    pub fn resume(&mut self) -> GameResult<()> {
        if self.status != GameStatus::Paused {
            return Err(GameError::InvalidState {
                status: self.status,
                op: "resume",
            });
        }
        self.status = GameStatus::InProgress;
        self.events.push_back(GameEvent::GameResumed {
            game_id: self.game_id.clone(),
            week: self.simulation.week(),
        });
        Ok(())
    }

    /// Transition directly to Completed. Decisions pending in the open
    /// window are discarded; no partial week is ever committed.
    pub fn stop(&mut self) -> GameResult<()> {
        if self.status == GameStatus::Completed {
            return Err(GameError::GameComplete);
        }
        self.pending = Default::default();
        self.complete(EndReason::Stopped);
        Ok(())
    }

    // ── Decision collection ──────────────────────────────────────────

    /// Submit (or overwrite) a decision for the currently open week.
    /// When every human-controlled tier has decided, the window closes
    /// and the week advances within this same call.
    pub fn submit_decision(
        &mut self,
        participant_id: &str,
        quantity: Quantity,
    ) -> GameResult<()> {
        let week = self.open_week();
        self.submit_decision_for(participant_id, week, quantity)
    }

    /// Week-tagged submission for transports that label decisions. A week
    /// other than the single open one is rejected with `WindowClosed` —
    /// stale callers must resubmit for the next open week.
    pub fn submit_decision_for(
        &mut self,
        participant_id: &str,
        week: Week,
        quantity: Quantity,
    ) -> GameResult<()> {
        match self.status {
            GameStatus::InProgress => {}
            GameStatus::Completed => return Err(GameError::GameComplete),
            status => {
                return Err(GameError::InvalidState {
                    status,
                    op: "submit_decision",
                });
            }
        }
        let role = self
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .map(|p| p.role)
            .ok_or_else(|| GameError::UnknownParticipant {
                id: participant_id.to_string(),
            })?;
        if week != self.open_week() {
            return Err(GameError::WindowClosed { week });
        }

        self.pending[role.position()] = Some(DecisionRecord {
            tier: role,
            week,
            quantity,
            source: DecisionSource::Human,
            submitted_at: Utc::now(),
        });
        log::debug!("game {} week {week}: {role} submitted {quantity}", self.game_id);

        self.advance_if_ready().map(|_| ())
    }

    /// Close the window and advance if every human-controlled tier has a
    /// pending decision; missing AI slots are filled from their policies
    /// first. Returns whether a week committed. Drivers of AI-only games
    /// pump this directly.
    pub fn advance_if_ready(&mut self) -> GameResult<bool> {
        match self.status {
            GameStatus::InProgress => {}
            GameStatus::Completed => return Err(GameError::GameComplete),
            status => {
                return Err(GameError::InvalidState {
                    status,
                    op: "advance_if_ready",
                });
            }
        }
        let waiting_on_human = CHAIN.iter().any(|&tier| {
            self.pending[tier.position()].is_none() && self.human_controls(tier)
        });
        if waiting_on_human {
            return Ok(false);
        }
        self.close_window_and_advance()?;
        Ok(true)
    }

    /// Evaluate win-condition thresholds against current metrics and
    /// force Completed if any is breached. Returns whether the game ended.
    pub fn check_win_conditions(&mut self) -> bool {
        if self.status == GameStatus::Completed {
            return false;
        }
        if self.breached_threshold().is_some() {
            self.complete(EndReason::WinConditionMet);
            return true;
        }
        false
    }

    // ── Internals ────────────────────────────────────────────────────

    fn human_controls(&self, tier: NodeTier) -> bool {
        self.participants
            .iter()
            .any(|p| p.role == tier && p.human)
    }

    fn policy_for(&self, tier: NodeTier) -> PolicyKind {
        self.participants
            .iter()
            .find(|p| p.role == tier)
            .map(|p| p.policy)
            .unwrap_or_default()
    }

    /// The critical section: fill AI slots, advance the clock, publish.
    fn close_window_and_advance(&mut self) -> GameResult<()> {
        let week = self.open_week();

        for tier in CHAIN {
            if self.pending[tier.position()].is_none() {
                let policy = self.policy_for(tier);
                let view = self.simulation.node_view(tier);
                self.pending[tier.position()] = Some(DecisionRecord {
                    tier,
                    week,
                    quantity: policy.decide(week, &view),
                    source: DecisionSource::Policy,
                    submitted_at: Utc::now(),
                });
            }
        }

        let mut decisions = Decisions::new();
        for record in self.pending.iter().flatten() {
            decisions.set(record.tier, record.quantity);
        }

        let result = match self.simulation.advance_week(week, &decisions) {
            Ok(result) => result,
            Err(err @ GameError::InvariantViolation { .. }) => {
                // Fatal to this game instance only.
                log::error!("game {}: {err}", self.game_id);
                self.failed = true;
                self.pending = Default::default();
                self.complete(EndReason::InvariantViolation);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        // The window is closed: pending records become immutable history
        // and the next window opens empty.
        for record in std::mem::take(&mut self.pending).into_iter().flatten() {
            self.decision_log.push(record);
        }

        self.metrics.record(&result);
        self.events.push_back(GameEvent::WeekCompleted {
            game_id: self.game_id.clone(),
            week,
            result: result.clone(),
            metrics: self.metrics.summary(),
        });
        self.history.push(result);

        if self.simulation.is_finished() {
            self.complete(EndReason::MaxWeeksReached);
        } else if self.breached_threshold().is_some() {
            self.complete(EndReason::WinConditionMet);
        }
        Ok(())
    }

    fn breached_threshold(&self) -> Option<&'static str> {
        let rules = &self.rules;
        if let Some(ceiling) = rules.max_total_cost {
            if self.metrics.total_cost() >= ceiling {
                return Some("cost ceiling");
            }
        }
        if let Some(floor) = rules.min_fill_rate {
            if self.metrics.weeks_recorded() > 0 && self.metrics.system_fill_rate() < floor {
                return Some("service-level floor");
            }
        }
        if let Some(ceiling) = rules.max_bullwhip {
            for tier in CHAIN {
                if matches!(self.metrics.bullwhip_ratio(tier), Some(ratio) if ratio > ceiling) {
                    return Some("bullwhip ceiling");
                }
            }
        }
        None
    }

    fn complete(&mut self, reason: EndReason) {
        self.status = GameStatus::Completed;
        self.ended_at = Some(Utc::now());
        let scores = self.final_scores();
        self.events.push_back(GameEvent::GameEnded {
            game_id: self.game_id.clone(),
            week: self.simulation.week(),
            reason,
            final_metrics: self.metrics.summary(),
            scores,
        });
        log::info!(
            "game {} ended at week {} ({reason:?})",
            self.game_id,
            self.simulation.week()
        );
    }

    /// Per-participant score: 10 000 − capped node cost, plus a fill-rate
    /// bonus, minus a bullwhip penalty. Ranked descending.
    fn final_scores(&self) -> Vec<ParticipantScore> {
        let mut scores: Vec<ParticipantScore> = self
            .participants
            .iter()
            .map(|p| {
                let node = self.metrics.node_summary(p.role);
                let base = 10_000.0 - node.total_cost.min(10_000.0);
                let service_bonus = node.fill_rate * 1_000.0;
                let bullwhip_penalty =
                    (node.bullwhip_ratio.unwrap_or(1.0) * 100.0).min(1_000.0);
                ParticipantScore {
                    rank: 0,
                    participant_id: p.id.clone(),
                    name: p.name.clone(),
                    role: p.role,
                    score: (base + service_bonus - bullwhip_penalty).max(0.0),
                    node_cost: node.total_cost,
                }
            })
            .collect();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        for (i, entry) in scores.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        scores
    }
}
