//! Robot state: energy, status machine, and the circular program counter.

use crate::battle::Coord;

/// Identifier of the side (player) a robot fights for.
pub type SideId = u8;

/// Index of a robot in the battle roster.
pub type RobotId = usize;

/// Robot status state machine.
///
/// `Dead` is terminal. `Invisible` is self-timed and reverts to `Alive`.
/// `Frozen` means the robot could not afford its next action and had no
/// usable emergency fallback; since energy never regenerates it is sticky
/// in practice, but the dispatch loop re-evaluates it every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Normal operation.
    Alive,
    /// Hidden from proximity detection and pursuit for a limited number of turns.
    Invisible,
    /// Energy-preservation mode; skipped by the dispatch loop.
    Frozen,
    /// Destroyed. No transitions out.
    Dead,
}

/// A programmable robot in the arena.
#[derive(Debug, Clone)]
pub struct Robot {
    /// Roster index of this robot.
    pub id: RobotId,
    /// The side this robot fights for.
    pub side: SideId,
    /// Display name used in combat log lines.
    pub name: String,
    /// Current position on the grid.
    pub pos: Coord,
    /// Current energy. Always >= 0.
    pub energy: i32,
    /// Energy at creation.
    pub max_energy: i32,
    /// Circular instruction sequence, kept in string form.
    pub program: Vec<String>,
    /// Index of the next instruction to execute.
    pub pc: usize,
    /// Current status.
    pub status: Status,
    /// Turns of invisibility remaining.
    pub invisible_turns: u32,
    /// Fallback instruction used when normal instructions are abandoned.
    pub emergency_action: Option<String>,
    /// Energy floor below which the emergency fallback takes over.
    ///
    /// Fixed at creation: highest tabled instruction cost plus a small
    /// buffer, so the fallback is always affordable when first reached.
    pub emergency_threshold: i32,
}

impl Robot {
    /// Create a robot at a position with full energy.
    #[must_use]
    pub fn new(
        id: RobotId,
        side: SideId,
        name: String,
        pos: Coord,
        energy: i32,
        emergency_threshold: i32,
    ) -> Self {
        Self {
            id,
            side,
            name,
            pos,
            energy,
            max_energy: energy,
            program: Vec::new(),
            pc: 0,
            status: Status::Alive,
            invisible_turns: 0,
            emergency_action: None,
            emergency_threshold,
        }
    }

    /// The instruction string at the program counter, or `None` for an
    /// empty program.
    #[must_use]
    pub fn current_instruction(&self) -> Option<&str> {
        self.program.get(self.pc).map(String::as_str)
    }

    /// Advance the program counter, wrapping at the program length.
    ///
    /// The dispatch loop only calls this for robots that are neither Dead
    /// nor Frozen.
    pub fn advance_pc(&mut self) {
        if !self.program.is_empty() {
            self.pc = (self.pc + 1) % self.program.len();
        }
    }

    /// Spend energy on an action.
    ///
    /// Returns `false` without mutating when the robot cannot afford the
    /// cost. Otherwise deducts, floors at zero, and flips to Dead when the
    /// result reaches zero.
    pub fn use_energy(&mut self, cost: i32) -> bool {
        if self.energy < cost {
            return false;
        }
        self.energy = (self.energy - cost).max(0);
        if self.energy == 0 {
            self.status = Status::Dead;
        }
        true
    }

    /// Apply raw damage, independent of affordability.
    ///
    /// Energy is floored at zero and the robot flips to Dead when it
    /// reaches zero. Applying damage to an already-dead robot leaves it at
    /// zero.
    pub fn take_damage(&mut self, damage: i32) {
        self.energy = (self.energy - damage).max(0);
        if self.energy == 0 {
            self.status = Status::Dead;
        }
    }

    /// Become invisible for the given number of turns.
    pub fn set_invisible(&mut self, turns: u32) {
        self.status = Status::Invisible;
        self.invisible_turns = turns;
    }

    /// Tick down invisibility at the start of turn processing, reverting to
    /// Alive at zero.
    pub fn tick_invisibility(&mut self) {
        if self.status == Status::Invisible {
            self.invisible_turns = self.invisible_turns.saturating_sub(1);
            if self.invisible_turns == 0 {
                self.status = Status::Alive;
            }
        }
    }

    /// Check whether the robot is alive. Frozen and Invisible robots count
    /// as alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status != Status::Dead
    }

    /// Check whether the robot may execute instructions this turn.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !matches!(self.status, Status::Dead | Status::Frozen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot(energy: i32) -> Robot {
        Robot::new(0, 1, "Robot 1".to_string(), Coord::new(5, 5), energy, 210)
    }

    #[test]
    fn test_use_energy_success_and_failure() {
        let mut r = robot(100);
        assert!(r.use_energy(40));
        assert_eq!(r.energy, 60);
        assert_eq!(r.status, Status::Alive);

        assert!(!r.use_energy(61));
        assert_eq!(r.energy, 60);
    }

    #[test]
    fn test_use_energy_exact_depletion_kills() {
        let mut r = robot(50);
        assert!(r.use_energy(50));
        assert_eq!(r.energy, 0);
        assert_eq!(r.status, Status::Dead);
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut r = robot(50);
        r.take_damage(100);
        assert_eq!(r.energy, 0);
        assert_eq!(r.status, Status::Dead);

        // Further damage never drives energy negative.
        r.take_damage(50);
        assert_eq!(r.energy, 0);
        assert_eq!(r.status, Status::Dead);
    }

    #[test]
    fn test_take_damage_partial() {
        let mut r = robot(100);
        r.take_damage(60);
        assert_eq!(r.energy, 40);
        assert_eq!(r.status, Status::Alive);

        r.take_damage(50);
        assert_eq!(r.energy, 0);
        assert_eq!(r.status, Status::Dead);
    }

    #[test]
    fn test_pc_wraps() {
        let mut r = robot(100);
        r.program = vec!["PURSUE".to_string(), "FIREROW".to_string()];

        assert_eq!(r.current_instruction(), Some("PURSUE"));
        r.advance_pc();
        assert_eq!(r.current_instruction(), Some("FIREROW"));
        r.advance_pc();
        assert_eq!(r.current_instruction(), Some("PURSUE"));
    }

    #[test]
    fn test_empty_program() {
        let mut r = robot(100);
        assert_eq!(r.current_instruction(), None);
        r.advance_pc();
        assert_eq!(r.pc, 0);
    }

    #[test]
    fn test_invisibility_lifecycle() {
        let mut r = robot(100);
        r.set_invisible(1);
        assert_eq!(r.status, Status::Invisible);
        assert!(r.can_act());

        r.tick_invisibility();
        assert_eq!(r.status, Status::Alive);
    }

    #[test]
    fn test_frozen_cannot_act_but_is_alive() {
        let mut r = robot(100);
        r.status = Status::Frozen;
        assert!(r.is_alive());
        assert!(!r.can_act());
    }
}
