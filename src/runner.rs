//! Headless battle runner.
//!
//! Provides a pure function interface: `(seed, robot specs, config) ->
//! BattleReport`. A single battle is strictly sequential; the series runner
//! parallelizes across independent seeds with rayon.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::battle::{check_invariants, Battle, BattleConfig, CostModel, SideId};
use crate::error::ArenaError;

/// Minimum roster size for a battle.
pub const MIN_ROBOTS: usize = 2;
/// Maximum roster size for a battle.
pub const MAX_ROBOTS: usize = 8;

/// Externally supplied description of one robot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotSpec {
    /// Side the robot fights for.
    pub side: SideId,
    /// Display name.
    pub name: String,
    /// Ordered instruction strings; executed circularly.
    #[serde(default)]
    pub program: Vec<String>,
    /// Optional emergency fallback instruction.
    #[serde(default)]
    pub emergency: Option<String>,
}

/// Error type for runner operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerError {
    /// Not enough robots (minimum 2).
    TooFewRobots(usize),
    /// Too many robots (maximum 8).
    TooManyRobots(usize),
    /// The battle configuration has invalid arena dimensions.
    InvalidConfig,
    /// A robot could not be placed.
    Placement(ArenaError),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewRobots(n) => write!(f, "too few robots: {n} (minimum {MIN_ROBOTS})"),
            Self::TooManyRobots(n) => write!(f, "too many robots: {n} (maximum {MAX_ROBOTS})"),
            Self::InvalidConfig => write!(f, "invalid battle configuration"),
            Self::Placement(e) => write!(f, "robot placement failed: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {}

/// Final state of one robot after a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotReport {
    /// Side the robot fought for.
    pub side: SideId,
    /// Display name.
    pub name: String,
    /// Energy at the end of the battle.
    pub final_energy: i32,
    /// Whether the robot survived.
    pub alive: bool,
}

/// Final result of a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    /// The seed this battle ran under.
    pub seed: u64,
    /// The winning side (None when no robot survived).
    pub winner: Option<SideId>,
    /// Turns executed before the battle was decided.
    pub turns_played: u32,
    /// Per-robot final state, in roster order.
    pub robots: Vec<RobotReport>,
}

/// Aggregated result of a seed series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesReport {
    /// Battles run.
    pub games: u32,
    /// First seed of the series; battle `i` used `base_seed + i`.
    pub base_seed: u64,
    /// Wins per side.
    pub wins: BTreeMap<SideId, u32>,
    /// Battles with no surviving robot.
    pub draws: u32,
}

/// Build a battle from external specs, ready for its first turn.
///
/// # Errors
///
/// Returns a [`RunnerError`] for an invalid roster size, invalid arena
/// dimensions, or a placement failure (arena full).
pub fn build_battle(
    seed: u64,
    specs: &[RobotSpec],
    config: &BattleConfig,
    costs: &CostModel,
) -> Result<Battle, RunnerError> {
    if specs.len() < MIN_ROBOTS {
        return Err(RunnerError::TooFewRobots(specs.len()));
    }
    if specs.len() > MAX_ROBOTS {
        return Err(RunnerError::TooManyRobots(specs.len()));
    }

    let mut battle = Battle::new(*config, *costs, seed).ok_or(RunnerError::InvalidConfig)?;

    for spec in specs {
        let id = battle
            .add_robot(spec.side, &spec.name, None)
            .map_err(RunnerError::Placement)?;
        battle.set_program(id, spec.program.clone());
        battle.set_emergency(id, spec.emergency.clone());
    }
    battle.scatter_obstacles();

    battle.start_programming();
    battle.start_battle();
    Ok(battle)
}

/// Snapshot a battle into a report.
#[must_use]
pub fn report(battle: &Battle, seed: u64) -> BattleReport {
    BattleReport {
        seed,
        winner: battle.winner(),
        turns_played: battle.turn(),
        robots: battle
            .robots()
            .iter()
            .map(|r| RobotReport {
                side: r.side,
                name: r.name.clone(),
                final_energy: r.energy,
                alive: r.is_alive(),
            })
            .collect(),
    }
}

/// Run one battle to completion.
///
/// # Errors
///
/// Returns a [`RunnerError`] for an invalid roster size, invalid arena
/// dimensions, or a placement failure (arena full).
pub fn run_battle(
    seed: u64,
    specs: &[RobotSpec],
    config: &BattleConfig,
    costs: &CostModel,
) -> Result<BattleReport, RunnerError> {
    let mut battle = build_battle(seed, specs, config, costs)?;
    battle.run_to_completion();

    debug_assert!(check_invariants(&battle).is_empty());

    Ok(report(&battle, seed))
}

/// Run `games` battles on consecutive seeds, in parallel, and aggregate
/// wins per side.
///
/// `on_game` is invoked once per finished battle (from worker threads), for
/// progress reporting.
///
/// # Errors
///
/// Returns the first [`RunnerError`] any battle produced.
pub fn run_series(
    base_seed: u64,
    games: u32,
    specs: &[RobotSpec],
    config: &BattleConfig,
    costs: &CostModel,
    on_game: impl Fn(&BattleReport) + Sync,
) -> Result<SeriesReport, RunnerError> {
    let reports: Vec<BattleReport> = (0..games)
        .into_par_iter()
        .map(|i| {
            let report = run_battle(base_seed.wrapping_add(u64::from(i)), specs, config, costs)?;
            on_game(&report);
            Ok(report)
        })
        .collect::<Result<_, RunnerError>>()?;

    let mut wins: BTreeMap<SideId, u32> = BTreeMap::new();
    let mut draws = 0;
    for report in &reports {
        match report.winner {
            Some(side) => *wins.entry(side).or_insert(0) += 1,
            None => draws += 1,
        }
    }

    Ok(SeriesReport {
        games,
        base_seed,
        wins,
        draws,
    })
}
