//! sim-runner: headless beer-game runner.
//!
//! Usage:
//!   sim-runner --seed 12345 --weeks 52
//!   sim-runner --seed 12345 --weeks 52 --base-stock 20 --json

use anyhow::Result;
use beergame_core::{
    controller::{GameRules, GameStatus},
    demand::DemandPattern,
    event::GameEvent,
    manager::GameManager,
    node::CHAIN,
    policy::PolicyKind,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let weeks = parse_arg(&args, "--weeks", 52u64);
    let base_stock = args
        .windows(2)
        .find(|w| w[0] == "--base-stock")
        .and_then(|w| w[1].parse::<u32>().ok());
    let json = args.iter().any(|a| a == "--json");

    if !json {
        println!("beer game — sim-runner");
        println!("  seed:   {seed}");
        println!("  weeks:  {weeks}");
        println!();
    }

    let mut rules = GameRules::default();
    rules.sim.seed = seed;
    rules.sim.max_weeks = weeks;
    rules.sim.pipeline_prime = 4;
    rules.sim.demand = DemandPattern::Step {
        base: 4,
        step_week: 5,
        level: 8,
    };

    let policy = match base_stock {
        Some(target) => PolicyKind::BaseStock { target },
        None => PolicyKind::PassThrough,
    };

    let manager = GameManager::new();
    let game_id = manager.create_game(rules)?;
    for tier in CHAIN {
        manager.add_participant(&game_id, tier.name(), tier, false, Some(policy))?;
    }
    manager.start(&game_id)?;

    // AI-only game: pump until the controller reports terminal state.
    let mut ending: Option<GameEvent> = None;
    loop {
        manager.advance_if_ready(&game_id)?;
        for event in manager.drain_events(&game_id)? {
            match &event {
                GameEvent::WeekCompleted { week, result, .. } => {
                    if week % 5 == 0 && !json {
                        let retailer = &result.nodes[0];
                        println!(
                            "week {week:>3}: retailer inv={:<3} backlog={:<3} cost=${:.2}",
                            retailer.inventory, retailer.backlog, result.total_cost
                        );
                    }
                }
                GameEvent::GameEnded { .. } => ending = Some(event),
                _ => {}
            }
        }
        if manager.state_snapshot(&game_id)?.status == GameStatus::Completed {
            break;
        }
    }

    let snapshot = manager.state_snapshot(&game_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        manager.remove_game(&game_id)?;
        return Ok(());
    }

    println!();
    println!("final week: {}", snapshot.week);
    println!("total cost: ${:.2}", snapshot.metrics.total_cost);
    println!("fill rate:  {:.1}%", snapshot.metrics.system_fill_rate * 100.0);
    println!();
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>10}",
        "node", "cost", "fill", "bullwhip", "stockouts"
    );
    for node in &snapshot.metrics.nodes {
        println!(
            "{:<12} {:>10.2} {:>9.1}% {:>10} {:>10}",
            node.tier.name(),
            node.total_cost,
            node.fill_rate * 100.0,
            node.bullwhip_ratio
                .map(|r| format!("{r:.2}"))
                .unwrap_or_else(|| "n/a".to_string()),
            node.stockout_weeks
        );
    }

    if let Some(GameEvent::GameEnded { scores, reason, .. }) = ending {
        println!();
        println!("ended: {reason:?}");
        for entry in scores {
            println!(
                "  #{} {:<12} score={:.0} cost=${:.2}",
                entry.rank, entry.name, entry.score, entry.node_cost
            );
        }
    }

    manager.remove_game(&game_id)?;
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
