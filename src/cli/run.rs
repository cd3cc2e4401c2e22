//! Run command implementation.

use std::path::Path;

use super::{load_scenario, seed_or_random, CliError, OutputFormat};
use botwar::runner::{self, BattleReport};
use botwar::CostModel;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or the battle fails
/// to set up.
pub(crate) fn execute(
    scenario: &Path,
    seed: Option<u64>,
    turns: Option<u32>,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let scenario = load_scenario(scenario)?;
    let mut config = scenario.config;
    if let Some(t) = turns {
        config.max_turns = t;
    }
    let costs = CostModel::default();
    let seed = seed_or_random(seed);

    let report = if quiet || format == OutputFormat::Json {
        runner::run_battle(seed, &scenario.robots, &config, &costs)?
    } else {
        let mut battle = runner::build_battle(seed, &scenario.robots, &config, &costs)?;
        while battle.execute_turn() {
            for line in battle.combat_log() {
                println!("turn {:>4}: {line}", battle.turn());
            }
        }
        runner::report(&battle, seed)
    };

    match format {
        OutputFormat::Text => print_text(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn print_text(report: &BattleReport) {
    println!();
    println!(
        "Battle over after {} turns (seed {})",
        report.turns_played, report.seed
    );
    match report.winner {
        Some(side) => println!("Winner: side {side}"),
        None => println!("Draw: no side survived"),
    }
    for robot in &report.robots {
        let state = if robot.alive { "alive" } else { "destroyed" };
        println!(
            "  side {} {:<16} energy {:>5}  {state}",
            robot.side, robot.name, robot.final_energy
        );
    }
}
