//! Property-based tests for battle mechanics.
//!
//! These tests verify parser totality, energy accounting, and structural
//! invariants across randomized seeds and rosters.
//! Run with: cargo test --release prop_battle

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use botwar::battle::check_invariants;
use botwar::{Battle, BattleConfig, Coord, CostModel, Instruction};

/// A strategy over valid instruction strings.
fn valid_instruction() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("RANDOMMOVE".to_string()),
        Just("PURSUE".to_string()),
        Just("AVOID".to_string()),
        Just("PLACEMINE".to_string()),
        Just("INVISIBILITY".to_string()),
        Just("FIREROW".to_string()),
        Just("FIRECOLUMN".to_string()),
        "(N|NE|E|SE|S|SW|W|NW)".prop_map(|d| format!("DIRECTEDMOVE({d})")),
        ("(N|E|S|W)", "(FIREROW|PURSUE|AVOID|PLACEMINE)").prop_map(|(d, branch)| {
            format!("PROXIMITYTEST({branch},DIRECTEDMOVE({d}))")
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// The parser is total: arbitrary input never panics, it only
    /// returns Ok or Err.
    #[test]
    fn prop_parser_never_panics(input in ".*") {
        let _ = Instruction::parse(&input);
    }

    /// Parsing a valid instruction and re-parsing its display form
    /// yields the same instruction.
    #[test]
    fn prop_display_is_reparseable(text in valid_instruction()) {
        let parsed = Instruction::parse(&text).unwrap();
        let redisplayed = Instruction::parse(&parsed.to_string()).unwrap();
        prop_assert_eq!(parsed, redisplayed);
    }

    /// Mixed-case spellings parse to the same instruction as uppercase.
    #[test]
    fn prop_parse_is_case_insensitive(text in valid_instruction()) {
        let upper = Instruction::parse(&text).unwrap();
        let lower = Instruction::parse(&text.to_lowercase()).unwrap();
        prop_assert_eq!(upper, lower);
    }

    /// Line of sight is total over arbitrary in-bounds endpoints.
    #[test]
    fn prop_line_of_sight_total(
        seed in any::<u64>(),
        x1 in 0i32..20, y1 in 0i32..20,
        x2 in 0i32..20, y2 in 0i32..20,
    ) {
        let mut battle = Battle::new(BattleConfig::default(), CostModel::default(), seed).unwrap();
        battle.add_robot(1, "A", None).unwrap();
        battle.add_robot(2, "B", None).unwrap();
        battle.scatter_obstacles();

        let _ = battle.arena().line_of_sight(Coord::new(x1, y1), Coord::new(x2, y2));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Whole battles on random seeds and rosters never violate the
    /// structural invariants, and energy stays non-negative throughout.
    #[test]
    fn prop_battle_invariants_hold(
        seed in any::<u64>(),
        programs in prop::collection::vec(
            prop::collection::vec(valid_instruction(), 1..5),
            2..5,
        ),
        turns in 1u32..80,
    ) {
        let config = BattleConfig {
            max_turns: turns,
            ..BattleConfig::default()
        };
        let mut battle = Battle::new(config, CostModel::default(), seed).unwrap();

        for (i, program) in programs.iter().enumerate() {
            let side = u8::try_from(i % 2 + 1).unwrap();
            let id = battle.add_robot(side, &format!("R{i}"), None).unwrap();
            battle.set_program(id, program.clone());
        }
        battle.scatter_obstacles();
        battle.start_programming();
        battle.start_battle();

        while battle.execute_turn() {
            let violations = check_invariants(&battle);
            prop_assert!(violations.is_empty(), "violations: {violations:?}");
            for robot in battle.robots() {
                prop_assert!(robot.energy >= 0);
            }
        }
    }

    /// A battle always terminates within its turn limit.
    #[test]
    fn prop_battle_terminates(seed in any::<u64>(), turns in 1u32..100) {
        let config = BattleConfig {
            max_turns: turns,
            ..BattleConfig::default()
        };
        let mut battle = Battle::new(config, CostModel::default(), seed).unwrap();
        let a = battle.add_robot(1, "A", None).unwrap();
        let b = battle.add_robot(2, "B", None).unwrap();
        battle.set_program(a, vec!["PURSUE".to_string(), "FIREROW".to_string()]);
        battle.set_program(b, vec!["RANDOMMOVE".to_string()]);
        battle.scatter_obstacles();
        battle.start_programming();
        battle.start_battle();

        let played = battle.run_to_completion();
        prop_assert!(played <= turns);
        prop_assert!(battle.is_over());
    }
}
