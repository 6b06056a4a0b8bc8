//! Lifecycle and window semantics of the game controller.

use beergame_core::{
    controller::{DecisionSource, GameController, GameRules, GameStatus},
    error::GameError,
    event::{EndReason, GameEvent},
    node::{NodeTier, CHAIN},
    policy::PolicyKind,
};

fn short_rules(max_weeks: u64) -> GameRules {
    let mut rules = GameRules::default();
    rules.sim.max_weeks = max_weeks;
    rules.sim.pipeline_prime = 4;
    rules
}

/// Two humans, two AI tiers. The window stays open until the last human
/// decides, and a resubmission before the close wins.
#[test]
fn resubmission_overwrites_before_close() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    let retailer = game
        .add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");
    let wholesaler = game
        .add_participant("bob", NodeTier::Wholesaler, true, None)
        .expect("add wholesaler");
    game.start().expect("start");

    game.submit_decision(&retailer, 5).expect("first submission");
    assert_eq!(game.current_week(), 0, "window must stay open for bob");

    game.submit_decision(&retailer, 10).expect("resubmission");
    assert_eq!(game.current_week(), 0);

    game.submit_decision(&wholesaler, 4).expect("closing submission");
    assert_eq!(game.current_week(), 1, "all humans in, week must commit");

    let result = game.week_result(1).expect("committed week");
    assert_eq!(
        result.nodes[0].order_placed, 10,
        "the overwrite, not the first submission, must be used"
    );
}

#[test]
fn late_and_future_submissions_are_rejected() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    let retailer = game
        .add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");
    game.start().expect("start");
    game.submit_decision(&retailer, 4).expect("week 1");
    assert_eq!(game.current_week(), 1);

    let err = game.submit_decision_for(&retailer, 1, 7).unwrap_err();
    assert!(
        matches!(err, GameError::WindowClosed { week: 1 }),
        "committed week must reject resubmission, got {err:?}"
    );

    let err = game.submit_decision_for(&retailer, 9, 7).unwrap_err();
    assert!(matches!(err, GameError::WindowClosed { week: 9 }));

    // The open week still accepts.
    game.submit_decision_for(&retailer, 2, 6).expect("open week");
    assert_eq!(game.current_week(), 2);
}

#[test]
fn pause_blocks_submissions_and_resume_restores_them() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    let retailer = game
        .add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");
    game.start().expect("start");
    game.pause().expect("pause");

    let err = game.submit_decision(&retailer, 4).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidState {
            status: GameStatus::Paused,
            ..
        }
    ));
    assert_eq!(game.current_week(), 0, "pause must not touch the clock");

    game.resume().expect("resume");
    game.submit_decision(&retailer, 4).expect("submit after resume");
    assert_eq!(game.current_week(), 1);
}

#[test]
fn submissions_before_start_are_rejected() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    let retailer = game
        .add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");

    let err = game.submit_decision(&retailer, 4).unwrap_err();
    assert!(matches!(
        err,
        GameError::InvalidState {
            status: GameStatus::Setup,
            ..
        }
    ));
}

#[test]
fn unknown_participant_is_rejected() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    game.start().expect("start");

    let err = game.submit_decision("no-such-id", 4).unwrap_err();
    assert!(matches!(err, GameError::UnknownParticipant { .. }), "got {err:?}");
}

#[test]
fn roles_are_exclusive_and_locked_after_start() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    game.add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");

    let err = game
        .add_participant("mallory", NodeTier::Retailer, true, None)
        .unwrap_err();
    assert!(matches!(err, GameError::RoleTaken { role: NodeTier::Retailer }));

    game.start().expect("start");
    let err = game
        .add_participant("late", NodeTier::Factory, false, None)
        .unwrap_err();
    assert!(matches!(err, GameError::InvalidState { .. }));
}

/// `stop` throws away the half-collected window. Week 1 never existed.
#[test]
fn stop_discards_the_open_week() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    let retailer = game
        .add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");
    let _wholesaler = game
        .add_participant("bob", NodeTier::Wholesaler, true, None)
        .expect("add wholesaler");
    game.start().expect("start");
    game.submit_decision(&retailer, 4).expect("partial window");

    game.stop().expect("stop");
    assert_eq!(game.status(), GameStatus::Completed);
    assert_eq!(game.current_week(), 0);
    assert!(game.week_result(1).is_none(), "partial week must not commit");
    assert!(game.decision_log().is_empty());

    let events = game.drain_events();
    assert!(
        events.iter().any(|e| matches!(
            e,
            GameEvent::GameEnded {
                reason: EndReason::Stopped,
                ..
            }
        )),
        "expected a Stopped GameEnded event"
    );

    let err = game.submit_decision(&retailer, 4).unwrap_err();
    assert!(matches!(err, GameError::GameComplete));
    assert!(matches!(game.stop().unwrap_err(), GameError::GameComplete));
}

#[test]
fn max_weeks_completes_with_ranked_scores() {
    let mut game = GameController::new(short_rules(5)).expect("controller");
    for tier in CHAIN {
        game.add_participant(tier.name(), tier, false, Some(PolicyKind::PassThrough))
            .expect("add participant");
    }
    game.start().expect("start");

    for week in 1..=5 {
        let committed = game.advance_if_ready().expect("advance");
        assert!(committed, "AI-only game must commit every pump (week {week})");
    }
    assert_eq!(game.status(), GameStatus::Completed);
    assert_eq!(game.current_week(), 5);

    let events = game.drain_events();
    let scores = events
        .iter()
        .find_map(|e| match e {
            GameEvent::GameEnded {
                reason: EndReason::MaxWeeksReached,
                scores,
                ..
            } => Some(scores),
            _ => None,
        })
        .expect("MaxWeeksReached GameEnded event");
    assert_eq!(scores.len(), 4, "one score per participant");
    for (i, entry) in scores.iter().enumerate() {
        assert_eq!(entry.rank, i + 1, "ranks must be dense and 1-based");
    }
    for pair in scores.windows(2) {
        assert!(pair[0].score >= pair[1].score, "scores must be sorted descending");
    }

    let err = game.advance_if_ready().unwrap_err();
    assert!(matches!(err, GameError::GameComplete));
}

#[test]
fn cost_ceiling_forces_completion() {
    let mut rules = short_rules(50);
    rules.max_total_cost = Some(1.0);
    let mut game = GameController::new(rules).expect("controller");
    game.start().expect("start");

    // Holding costs alone blow through a $1 ceiling in the first week.
    game.advance_if_ready().expect("advance");
    assert_eq!(game.status(), GameStatus::Completed);
    assert_eq!(game.current_week(), 1);

    let events = game.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::GameEnded {
            reason: EndReason::WinConditionMet,
            ..
        }
    )));
}

#[test]
fn win_condition_check_is_a_no_op_without_thresholds() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    game.start().expect("start");
    game.advance_if_ready().expect("advance");

    assert!(!game.check_win_conditions(), "no thresholds configured");
    assert_eq!(game.status(), GameStatus::InProgress);

    game.stop().expect("stop");
    assert!(!game.check_win_conditions(), "completed games never re-end");
}

#[test]
fn decision_log_records_every_source() {
    let mut game = GameController::new(short_rules(10)).expect("controller");
    let retailer = game
        .add_participant("alice", NodeTier::Retailer, true, None)
        .expect("add retailer");
    game.add_participant("cpu", NodeTier::Factory, false, Some(PolicyKind::Constant { quantity: 6 }))
        .expect("add factory");
    game.start().expect("start");
    game.submit_decision(&retailer, 9).expect("submit");
    assert_eq!(game.current_week(), 1);

    let log = game.decision_log();
    assert_eq!(log.len(), 4, "one record per tier per committed week");
    for record in log {
        assert_eq!(record.week, 1);
        let expected = if record.tier == NodeTier::Retailer {
            DecisionSource::Human
        } else {
            DecisionSource::Policy
        };
        assert_eq!(record.source, expected, "wrong source for {}", record.tier);
    }
    let factory = log
        .iter()
        .find(|r| r.tier == NodeTier::Factory)
        .expect("factory record");
    assert_eq!(factory.quantity, 6, "constant policy quantity must be used");
}
