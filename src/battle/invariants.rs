//! Battle invariants - sanity checks that detect bugs.
//!
//! In a correctly implemented engine these never trigger. They exist for
//! property tests and debug assertions, not as gameplay limits.

use std::collections::BTreeSet;

use crate::battle::{Battle, Coord, Status};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all battle invariants.
///
/// Returns the violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(battle: &Battle) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let arena = battle.arena();

    let mut live_positions: BTreeSet<Coord> = BTreeSet::new();

    for robot in battle.robots() {
        // Energy is floored at zero, always.
        if robot.energy < 0 {
            violations.push(InvariantViolation {
                message: format!("{} has negative energy {}", robot.name, robot.energy),
            });
        }

        // Dead exactly when energy has reached zero.
        if (robot.status == Status::Dead) != (robot.energy == 0) {
            violations.push(InvariantViolation {
                message: format!(
                    "{} status {:?} inconsistent with energy {}",
                    robot.name, robot.status, robot.energy
                ),
            });
        }

        if robot.is_alive() {
            live_positions.insert(robot.pos);

            // Every live robot's recorded position matches the occupancy map.
            if arena.occupant(robot.pos) != Some(robot.id) {
                violations.push(InvariantViolation {
                    message: format!(
                        "{} at ({},{}) not recorded in occupancy",
                        robot.name, robot.pos.x, robot.pos.y
                    ),
                });
            }

            // Live robots never stand on impassable cells.
            if !arena.is_passable(robot.pos) {
                violations.push(InvariantViolation {
                    message: format!(
                        "{} stands on an impassable cell ({},{})",
                        robot.name, robot.pos.x, robot.pos.y
                    ),
                });
            }
        } else if arena.occupant(robot.pos) == Some(robot.id) {
            violations.push(InvariantViolation {
                message: format!("dead robot {} still occupies a cell", robot.name),
            });
        }
    }

    // No occupancy entries beyond the live robots.
    for (pos, id) in arena.occupied_positions() {
        if !live_positions.contains(&pos) {
            violations.push(InvariantViolation {
                message: format!("stale occupancy entry for robot {id} at ({},{})", pos.x, pos.y),
            });
        }
    }

    // Mines stay inside the arena.
    for (pos, _) in arena.mines() {
        if !arena.in_bounds(pos) {
            violations.push(InvariantViolation {
                message: format!("mine out of bounds at ({},{})", pos.x, pos.y),
            });
        }
    }

    violations
}
