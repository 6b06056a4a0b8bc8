//! Weekly-advance scenarios for the clock itself.

use beergame_core::{
    config::SimConfig,
    demand::DemandPattern,
    engine::{Decisions, Simulation},
    error::GameError,
    node::{NodeState, NodeTier, CHAIN},
};

fn uniform_decisions(q: u32) -> Decisions {
    let mut decisions = Decisions::new();
    for tier in CHAIN {
        decisions.set(tier, q);
    }
    decisions
}

/// Classic opening with empty pipes: the retailer sells 4 with nothing
/// arriving, so inventory drops 12 → 8 with no backlog.
#[test]
fn retailer_week_one_matches_classic_opening() {
    let mut sim = Simulation::new(SimConfig::default()).expect("simulation");

    let result = sim.advance_week(1, &uniform_decisions(4)).expect("advance");

    let retailer = &result.nodes[0];
    assert_eq!(retailer.inventory, 8, "12 on hand minus 4 sold");
    assert_eq!(retailer.backlog, 0);
    assert_eq!(retailer.shipment_received, 0, "pipes start empty");
    assert_eq!(retailer.shipment_sent, 4);
    assert_eq!(result.customer_demand, 4);

    // Upstream tiers see no orders yet (order delay = 2) and ship nothing.
    for snapshot in &result.nodes[1..] {
        assert_eq!(snapshot.demand_observed, 0);
        assert_eq!(snapshot.inventory, 12);
    }
}

/// Pipes primed with the base demand start the chain in equilibrium:
/// inventory holds at 12 with zero backlog indefinitely when everyone
/// orders what they observe.
#[test]
fn primed_chain_holds_steady_state() {
    let config = SimConfig {
        pipeline_prime: 4,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).expect("simulation");

    for week in 1..=10 {
        let result = sim.advance_week(week, &uniform_decisions(4)).expect("advance");
        for snapshot in &result.nodes {
            assert_eq!(
                snapshot.inventory, 12,
                "week {week}: {} left equilibrium",
                snapshot.tier
            );
            assert_eq!(snapshot.backlog, 0, "week {week}: {} backlogged", snapshot.tier);
            assert_eq!(snapshot.shipment_received, 4);
            assert_eq!(snapshot.shipment_sent, 4);
        }
        // 0.5/unit holding on 4 × 12 units, no backlog anywhere.
        assert!((result.total_cost - 24.0).abs() < 1e-9);
    }
}

#[test]
fn advance_twice_for_same_week_fails() {
    let mut sim = Simulation::new(SimConfig::default()).expect("simulation");

    sim.advance_week(1, &uniform_decisions(4)).expect("first advance");
    let err = sim.advance_week(1, &uniform_decisions(4)).unwrap_err();
    assert!(
        matches!(err, GameError::WeekMismatch { expected: 2, actual: 1 }),
        "expected WeekMismatch, got {err:?}"
    );

    // Skipping ahead is just as invalid.
    let err = sim.advance_week(5, &uniform_decisions(4)).unwrap_err();
    assert!(matches!(err, GameError::WeekMismatch { expected: 2, actual: 5 }));
}

#[test]
fn advance_past_max_weeks_fails() {
    let config = SimConfig {
        max_weeks: 2,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).expect("simulation");

    sim.advance_week(1, &uniform_decisions(4)).expect("week 1");
    sim.advance_week(2, &uniform_decisions(4)).expect("week 2");
    assert!(sim.is_finished());

    let err = sim.advance_week(3, &uniform_decisions(4)).unwrap_err();
    assert!(matches!(err, GameError::GameComplete), "got {err:?}");
}

#[test]
fn missing_decision_names_the_tier() {
    let mut sim = Simulation::new(SimConfig::default()).expect("simulation");

    let mut decisions = Decisions::new();
    decisions.set(NodeTier::Retailer, 4);
    decisions.set(NodeTier::Distributor, 4);
    decisions.set(NodeTier::Factory, 4);
    assert!(!decisions.is_complete());
    assert_eq!(decisions.get(NodeTier::Wholesaler), None);
    assert_eq!(decisions.get(NodeTier::Factory), Some(4));

    let err = sim.advance_week(1, &decisions).unwrap_err();
    assert!(
        matches!(err, GameError::DecisionMissing { tier: NodeTier::Wholesaler }),
        "got {err:?}"
    );
}

#[test]
fn factory_release_clamped_to_capacity() {
    let config = SimConfig {
        production_capacity: 5,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).expect("simulation");

    let mut decisions = uniform_decisions(4);
    decisions.set(NodeTier::Factory, 50);
    let result = sim.advance_week(1, &decisions).expect("advance");
    assert_eq!(
        result.nodes[3].order_placed, 5,
        "release must be capped at production capacity"
    );

    // The release finishes production_delay weeks later.
    sim.advance_week(2, &uniform_decisions(0)).expect("week 2");
    let week3 = sim.advance_week(3, &uniform_decisions(0)).expect("week 3");
    assert_eq!(week3.nodes[3].shipment_received, 5);
}

/// Any `u32` is a legal decision, so week after week of `u32::MAX` orders
/// must neither panic nor wrap: backlog and the policy's supply-line view
/// pin at the type limit, and physical units stay conserved throughout.
#[test]
fn extreme_orders_saturate_instead_of_overflowing() {
    let mut sim = Simulation::new(SimConfig::default()).expect("simulation");

    for week in 1..=6 {
        let before = sim.physical_units();
        let result = sim
            .advance_week(week, &uniform_decisions(u32::MAX))
            .expect("hostile quantities must not abort the week");

        let released = u64::from(result.nodes[3].order_placed);
        let sold = u64::from(result.nodes[0].shipment_sent);
        assert_eq!(
            sim.physical_units(),
            before + released - sold,
            "week {week}: units drifted under extreme orders"
        );
    }

    // Two u32::MAX orders were owed by week 4.
    assert_eq!(sim.node(NodeTier::Wholesaler).backlog, u32::MAX);
    assert_eq!(
        sim.node_view(NodeTier::Wholesaler).supply_line,
        u32::MAX,
        "the view of an overfull pipe must saturate, not wrap"
    );
}

/// A decision exceeding physical limits is accepted as-is; the shortfall
/// lands in backlog. Unconstrained ordering is the bullwhip mechanism.
#[test]
fn oversized_demand_is_absorbed_by_backlog() {
    let mut node = NodeState::new(NodeTier::Wholesaler, &SimConfig::default());

    let fulfilment = node.fulfil(40);
    assert_eq!(fulfilment.shipped, 12, "ships all on-hand stock");
    assert_eq!(fulfilment.filled_immediately, 12);
    assert_eq!(node.inventory, 0);
    assert_eq!(node.backlog, 28);

    // Arriving stock serves the oldest owed units first.
    node.receive_shipment(10);
    let fulfilment = node.fulfil(2);
    assert_eq!(fulfilment.shipped, 10);
    assert_eq!(
        fulfilment.filled_immediately, 0,
        "everything shipped went to old backlog"
    );
    assert_eq!(node.backlog, 20);
}

#[test]
fn config_round_trips_through_json_and_rejects_nonsense() {
    let config = SimConfig::from_json_str(
        r#"{"max_weeks": 20, "shipment_delay": 3, "demand": {"pattern": "constant", "level": 6}}"#,
    )
    .expect("partial configs fill in defaults");
    assert_eq!(config.max_weeks, 20);
    assert_eq!(config.shipment_delay, 3);
    assert_eq!(config.order_delay, 2, "unspecified fields keep defaults");
    assert_eq!(config.demand, DemandPattern::Constant { level: 6 });

    assert!(SimConfig::from_json_str(r#"{"max_weeks": 0}"#).is_err());
    assert!(SimConfig::from_json_str(r#"{"shipment_delay": 0}"#).is_err());
    assert!(SimConfig::from_json_str(r#"{"holding_cost_per_unit": -1.0}"#).is_err());
    assert!(SimConfig::from_json_str(r#"{"production_capacity": 0}"#).is_err());
}

#[test]
fn tier_names_round_trip() {
    for tier in CHAIN {
        assert_eq!(NodeTier::from_name(tier.name()).expect("known tier"), tier);
        assert_eq!(tier.to_string(), tier.name());
    }
    let err = NodeTier::from_name("customer").unwrap_err();
    assert!(matches!(err, GameError::UnknownNode { .. }), "got {err:?}");
}

#[test]
fn seasonal_and_step_demand_stay_non_negative() {
    let config = SimConfig {
        demand: DemandPattern::Seasonal {
            base: 2,
            amplitude: 5.0,
            period: 8,
        },
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(config).expect("simulation");
    for week in 1..=16 {
        // A trough deeper than the base must clamp at zero, not wrap.
        let result = sim.advance_week(week, &uniform_decisions(0)).expect("advance");
        assert!(result.customer_demand <= 7, "amplitude bound exceeded");
    }
}
