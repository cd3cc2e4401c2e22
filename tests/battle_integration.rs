//! Multi-turn integration tests for battle mechanics.
//!
//! These tests run scripted battles through the public API and verify
//! combat resolution, mine ownership, emergency routing, turn-limit
//! decisions, and seed determinism end to end.
//!
//! Run with: cargo test --release battle_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::io::Write as _;

use botwar::battle::check_invariants;
use botwar::runner::{run_battle, run_series, RobotSpec};
use botwar::{Battle, BattleConfig, Coord, CostModel, Phase};

fn small_arena() -> BattleConfig {
    BattleConfig {
        width: 10,
        height: 10,
        obstacle_count: 0,
        ..BattleConfig::default()
    }
}

fn spec(side: u8, name: &str, program: &[&str]) -> RobotSpec {
    RobotSpec {
        side,
        name: name.to_string(),
        program: program.iter().map(ToString::to_string).collect(),
        emergency: None,
    }
}

#[test]
fn test_row_fire_damages_first_enemy_only() {
    let mut b = Battle::new(small_arena(), CostModel::default(), 42).unwrap();
    let shooter = b
        .add_robot_at(1, "Shooter", Some(1000), Coord::new(5, 5))
        .unwrap();
    let near = b
        .add_robot_at(2, "Near", Some(1000), Coord::new(2, 5))
        .unwrap();
    let behind = b
        .add_robot_at(2, "Behind", Some(1000), Coord::new(1, 5))
        .unwrap();
    b.set_program(shooter, vec!["FIREROW".to_string()]);
    b.start_programming();
    b.start_battle();

    b.execute_turn();

    // The shot stops at the first occupant in each direction.
    assert_eq!(b.robot(near).unwrap().energy, 800);
    assert_eq!(b.robot(behind).unwrap().energy, 1000);
    assert_eq!(b.robot(shooter).unwrap().energy, 900);
    assert!(b
        .combat_log()
        .iter()
        .any(|line| line.contains("hits Near")));
}

#[test]
fn test_own_mine_blocks_movement_and_stays_armed() {
    let mut b = Battle::new(small_arena(), CostModel::default(), 42).unwrap();
    let miner = b
        .add_robot_at(1, "Miner", Some(1000), Coord::new(5, 5))
        .unwrap();
    let _enemy = b
        .add_robot_at(2, "Idle", Some(1000), Coord::new(9, 9))
        .unwrap();
    // Lay a mine, step off it, then try to step back onto it.
    b.set_program(
        miner,
        vec![
            "PLACEMINE".to_string(),
            "DIRECTEDMOVE(E)".to_string(),
            "DIRECTEDMOVE(W)".to_string(),
        ],
    );
    b.start_programming();
    b.start_battle();

    b.execute_turn();
    b.execute_turn();
    b.execute_turn();

    let robot = b.robot(miner).unwrap();
    // The return move onto the robot's own mine is blocked.
    assert_eq!(robot.pos, Coord::new(6, 5));
    // The blocked move was still paid for.
    assert_eq!(robot.energy, 1000 - 200 - 5 - 5);
    assert!(b.arena().mine_at(Coord::new(5, 5)).is_some());
}

#[test]
fn test_emergency_routing_at_exact_threshold() {
    let mut b = Battle::new(small_arena(), CostModel::default(), 42).unwrap();
    // 210 is the default emergency threshold (max cost 200 plus a buffer
    // of 10). At exactly that energy the programmed instruction is
    // abandoned in favor of the fallback.
    let low = b
        .add_robot_at(1, "Low", Some(210), Coord::new(5, 5))
        .unwrap();
    let _enemy = b
        .add_robot_at(2, "Idle", Some(1000), Coord::new(9, 9))
        .unwrap();
    b.set_program(low, vec!["PLACEMINE".to_string()]);
    b.set_emergency(low, Some("DIRECTEDMOVE(E)".to_string()));
    b.start_programming();
    b.start_battle();

    b.execute_turn();

    let robot = b.robot(low).unwrap();
    assert_eq!(robot.pos, Coord::new(6, 5));
    assert_eq!(robot.energy, 205);
    assert_eq!(b.arena().mine_count(), 0);
}

#[test]
fn test_turn_limit_decides_on_energy() {
    let config = BattleConfig {
        max_turns: 5,
        ..small_arena()
    };
    let mut b = Battle::new(config, CostModel::default(), 42).unwrap();
    // Side 2 idles with more energy; side 1 burns energy moving.
    let mover = b
        .add_robot_at(1, "Mover", Some(800), Coord::new(2, 2))
        .unwrap();
    let _idle = b
        .add_robot_at(2, "Idle", Some(1200), Coord::new(8, 8))
        .unwrap();
    b.set_program(mover, vec!["RANDOMMOVE".to_string()]);
    b.start_programming();
    b.start_battle();

    let turns = b.run_to_completion();

    assert_eq!(turns, 5);
    assert_eq!(b.phase(), Phase::Finished);
    assert_eq!(b.winner(), Some(2));
}

#[test]
fn test_full_battle_respects_invariants_across_seeds() {
    let specs = vec![
        spec(1, "Hunter", &["PURSUE", "PROXIMITYTEST(FIREROW,PURSUE)"]),
        spec(2, "Trapper", &["PLACEMINE", "AVOID", "RANDOMMOVE"]),
    ];
    let config = BattleConfig {
        max_turns: 300,
        ..BattleConfig::default()
    };
    let costs = CostModel::default();

    for seed in 0..20 {
        let report = run_battle(seed, &specs, &config, &costs).unwrap();
        assert!(report.turns_played <= 300, "seed {seed} overran the limit");
        assert_eq!(report.robots.len(), 2);
        for robot in &report.robots {
            assert!(robot.final_energy >= 0, "seed {seed} went negative");
        }
    }
}

#[test]
fn test_same_seed_same_battle() {
    let specs = vec![
        spec(1, "Alpha", &["PURSUE", "FIREROW", "FIRECOLUMN"]),
        spec(2, "Beta", &["AVOID", "INVISIBILITY", "PLACEMINE"]),
        spec(2, "Gamma", &["RANDOMMOVE", "PROXIMITYTEST(FIREROW,AVOID)"]),
    ];
    let config = BattleConfig::default();
    let costs = CostModel::default();

    let a = run_battle(987_654, &specs, &config, &costs).unwrap();
    let b = run_battle(987_654, &specs, &config, &costs).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_different_seeds_eventually_diverge() {
    let specs = vec![
        spec(1, "Alpha", &["RANDOMMOVE", "PLACEMINE"]),
        spec(2, "Beta", &["RANDOMMOVE", "FIREROW"]),
    ];
    let config = BattleConfig::default();
    let costs = CostModel::default();

    let base = run_battle(0, &specs, &config, &costs).unwrap();
    let diverged = (1..50).any(|seed| {
        let other = run_battle(seed, &specs, &config, &costs).unwrap();
        other.turns_played != base.turns_played || other.robots != base.robots
    });
    assert!(diverged, "fifty seeds produced identical battles");
}

#[test]
fn test_series_counts_add_up() {
    let specs = vec![
        spec(1, "Hunter", &["PURSUE", "PROXIMITYTEST(FIREROW,PURSUE)"]),
        spec(2, "Coward", &["AVOID", "PLACEMINE"]),
    ];
    let config = BattleConfig {
        max_turns: 200,
        ..BattleConfig::default()
    };
    let report = run_series(11, 25, &specs, &config, &CostModel::default(), |_| {}).unwrap();

    assert_eq!(report.games, 25);
    let wins: u32 = report.wins.values().sum();
    assert_eq!(wins + report.draws, 25);
}

#[test]
fn test_scenario_file_round_trip() {
    // The CLI consumes scenario files of this shape; make sure the
    // library types deserialize them with defaults applied.
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "config": {{ "width": 12, "height": 12, "max_turns": 50 }},
            "robots": [
                {{ "side": 1, "name": "A", "program": ["PURSUE"] }},
                {{ "side": 2, "name": "B" }}
            ]
        }}"#
    )
    .unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    #[derive(serde::Deserialize)]
    struct Scenario {
        #[serde(default)]
        config: BattleConfig,
        robots: Vec<RobotSpec>,
    }
    let scenario: Scenario = serde_json::from_str(&text).unwrap();

    assert_eq!(scenario.config.width, 12);
    assert_eq!(scenario.config.max_turns, 50);
    // Omitted fields take engine defaults.
    assert_eq!(scenario.config.starting_energy, 1500);
    assert_eq!(scenario.robots.len(), 2);
    assert!(scenario.robots[1].program.is_empty());
    assert!(scenario.robots[1].emergency.is_none());

    let report = run_battle(
        3,
        &scenario.robots,
        &scenario.config,
        &CostModel::default(),
    )
    .unwrap();
    assert!(report.turns_played <= 50);
}

#[test]
fn test_long_battle_leaves_consistent_state() {
    let mut b = Battle::new(BattleConfig::default(), CostModel::default(), 7).unwrap();
    let a = b.add_robot(1, "A", None).unwrap();
    let c = b.add_robot(2, "B", None).unwrap();
    b.set_program(a, vec!["PURSUE".to_string(), "FIREROW".to_string()]);
    b.set_program(
        c,
        vec!["AVOID".to_string(), "PLACEMINE".to_string(), "RANDOMMOVE".to_string()],
    );
    b.scatter_obstacles();
    b.start_programming();
    b.start_battle();

    b.run_to_completion();

    assert!(b.is_over());
    assert!(check_invariants(&b).is_empty());
}
