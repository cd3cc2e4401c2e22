//! Battle engine: phases, the per-turn dispatch algorithm, and win
//! determination.
//!
//! One turn is a deterministic sequential pass over the roster in a fixed
//! order. State mutated by an earlier robot in the pass (occupancy, mines,
//! wrecks) is immediately visible to later robots in the same pass; this
//! ordering is a load-bearing property of the design, not an artifact.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::battle::{
    Arena, Coord, CostModel, Direction, Instruction, Robot, RobotId, Rng, SideId, Status,
};
use crate::error::{ArenaError, ArenaResult};

/// Battle phases, advancing strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Arena and roster construction.
    Setup,
    /// Programs are being assigned.
    Programming,
    /// Turns are being executed.
    Battle,
    /// The battle has ended; the winner (if any) is recorded.
    Finished,
}

/// Configuration consumed by the engine at battle start.
///
/// The engine performs no I/O; external collaborators populate this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Arena width in cells.
    pub width: i32,
    /// Arena height in cells.
    pub height: i32,
    /// Turn limit before the battle is decided on energy.
    pub max_turns: u32,
    /// Shared radius for proximity detection and fire range.
    pub proximity_range: i32,
    /// Energy each robot starts with.
    pub starting_energy: i32,
    /// Obstacles scattered at setup.
    pub obstacle_count: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            max_turns: 1000,
            proximity_range: 5,
            starting_energy: 1500,
            obstacle_count: 20,
        }
    }
}

/// Snapshot of battle progress, queryable at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleStats {
    /// Current phase.
    pub phase: Phase,
    /// Turns executed so far.
    pub turn: u32,
    /// Robots still alive (Frozen and Invisible count as alive).
    pub living_robots: usize,
    /// Total roster size, dead robots included.
    pub total_robots: usize,
    /// Winning side, set only on transition into Finished.
    pub winner: Option<SideId>,
}

/// Fire axis for row and column shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Row,
    Column,
}

/// A complete battle: arena, roster, and turn state.
#[derive(Debug, Clone)]
pub struct Battle {
    arena: Arena,
    robots: Vec<Robot>,
    phase: Phase,
    turn: u32,
    config: BattleConfig,
    costs: CostModel,
    rng: Rng,
    combat_log: Vec<String>,
    winner: Option<SideId>,
}

impl Battle {
    /// Create a battle in the Setup phase.
    ///
    /// Returns `None` if the configured arena dimensions are invalid.
    #[must_use]
    pub fn new(config: BattleConfig, costs: CostModel, seed: u64) -> Option<Self> {
        let arena = Arena::new(config.width, config.height)?;
        Some(Self {
            arena,
            robots: Vec::new(),
            phase: Phase::Setup,
            turn: 0,
            config,
            costs,
            rng: Rng::new(seed),
            combat_log: Vec::new(),
            winner: None,
        })
    }

    /// The arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// The full roster, dead robots included.
    #[must_use]
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    /// A robot by roster index.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.get(id)
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Turns executed so far.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// The winning side, if the battle has been decided.
    #[must_use]
    pub const fn winner(&self) -> Option<SideId> {
        self.winner
    }

    /// Check whether the battle has finished.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// The cost model in effect.
    #[must_use]
    pub const fn costs(&self) -> &CostModel {
        &self.costs
    }

    /// Human-readable events of the current turn only.
    #[must_use]
    pub fn combat_log(&self) -> &[String] {
        &self.combat_log
    }

    /// Snapshot of battle progress.
    #[must_use]
    pub fn stats(&self) -> BattleStats {
        BattleStats {
            phase: self.phase,
            turn: self.turn,
            living_robots: self.living_ids().len(),
            total_robots: self.robots.len(),
            winner: self.winner,
        }
    }

    /// Add a robot at a random unoccupied passable cell with full energy.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ArenaFull`] when no cell is available.
    pub fn add_robot(
        &mut self,
        side: SideId,
        name: &str,
        energy: Option<i32>,
    ) -> ArenaResult<RobotId> {
        let exclude: BTreeSet<Coord> = self
            .robots
            .iter()
            .filter(|r| r.is_alive())
            .map(|r| r.pos)
            .collect();
        let pos = self.arena.random_empty_position(&mut self.rng, &exclude)?;
        Ok(self.insert_robot(side, name, energy, pos))
    }

    /// Add a robot at a fixed cell (used by scripted scenarios and tests).
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::CellUnavailable`] if the cell is impassable or
    /// occupied.
    pub fn add_robot_at(
        &mut self,
        side: SideId,
        name: &str,
        energy: Option<i32>,
        pos: Coord,
    ) -> ArenaResult<RobotId> {
        if !self.arena.is_passable(pos) || self.arena.occupant(pos).is_some() {
            return Err(ArenaError::CellUnavailable);
        }
        Ok(self.insert_robot(side, name, energy, pos))
    }

    fn insert_robot(
        &mut self,
        side: SideId,
        name: &str,
        energy: Option<i32>,
        pos: Coord,
    ) -> RobotId {
        let id = self.robots.len();
        let energy = energy.unwrap_or(self.config.starting_energy);
        let robot = Robot::new(
            id,
            side,
            name.to_string(),
            pos,
            energy,
            self.costs.emergency_threshold(),
        );
        self.robots.push(robot);
        self.arena.set_occupant(pos, id);
        id
    }

    /// Assign a robot's program. Unknown ids are ignored.
    pub fn set_program(&mut self, id: RobotId, program: Vec<String>) {
        if let Some(robot) = self.robots.get_mut(id) {
            robot.program = program;
            robot.pc = 0;
        }
    }

    /// Assign or clear a robot's emergency fallback. Unknown ids are ignored.
    pub fn set_emergency(&mut self, id: RobotId, emergency: Option<String>) {
        if let Some(robot) = self.robots.get_mut(id) {
            robot.emergency_action = emergency;
        }
    }

    /// Scatter the configured number of obstacles, avoiding robot cells.
    ///
    /// Stops early without failing if the arena fills up first.
    pub fn scatter_obstacles(&mut self) {
        let exclude: BTreeSet<Coord> = self
            .robots
            .iter()
            .filter(|r| r.is_alive())
            .map(|r| r.pos)
            .collect();
        self.arena
            .scatter_obstacles(self.config.obstacle_count, &exclude, &mut self.rng);
    }

    /// Transition Setup -> Programming. Any other transition attempt is a
    /// silent no-op.
    pub fn start_programming(&mut self) {
        if self.phase == Phase::Setup {
            self.phase = Phase::Programming;
        }
    }

    /// Transition Setup/Programming -> Battle, resetting the turn counter.
    /// Any other transition attempt is a silent no-op.
    pub fn start_battle(&mut self) {
        if matches!(self.phase, Phase::Setup | Phase::Programming) {
            self.phase = Phase::Battle;
            self.turn = 0;
        }
    }

    fn living_ids(&self) -> Vec<RobotId> {
        self.robots
            .iter()
            .filter(|r| r.is_alive())
            .map(|r| r.id)
            .collect()
    }

    /// Execute one turn of the battle. Returns `true` if the battle
    /// continues, `false` once it is decided (or when not in Battle phase).
    pub fn execute_turn(&mut self) -> bool {
        if self.phase != Phase::Battle {
            return false;
        }

        let living = self.living_ids();
        if living.len() <= 1 || self.turn >= self.config.max_turns {
            self.determine_winner();
            return false;
        }

        self.combat_log.clear();

        // Last turn's invisibility lapses before any new action this turn.
        for &id in &living {
            self.robots[id].tick_invisibility();
        }

        self.dispatch_all(&living);

        // Counters advance for every non-dead, non-frozen robot whether or
        // not its instruction had an effect.
        for &id in &living {
            let robot = &mut self.robots[id];
            if robot.can_act() {
                robot.advance_pc();
            }
        }

        self.turn += 1;
        true
    }

    /// Run turns until the battle finishes, returning the turn count.
    pub fn run_to_completion(&mut self) -> u32 {
        while self.execute_turn() {}
        self.turn
    }

    fn dispatch_all(&mut self, living: &[RobotId]) {
        for &id in living {
            // A robot killed earlier in this same pass takes no action.
            if !self.robots[id].is_alive() || !self.robots[id].can_act() {
                continue;
            }

            let Some(text) = self.robots[id].current_instruction().map(String::from) else {
                continue;
            };
            // An unparseable instruction is a silent no-op for this turn.
            let Ok(instruction) = Instruction::parse(&text) else {
                continue;
            };

            let cost = self.costs.cost(instruction.kind());
            let robot = &self.robots[id];
            if robot.energy < cost || robot.energy <= robot.emergency_threshold {
                if self.robots[id].emergency_action.is_some() {
                    self.run_emergency(id);
                } else {
                    self.robots[id].status = Status::Frozen;
                }
                continue;
            }

            if !self.robots[id].use_energy(cost) {
                continue;
            }
            if !self.robots[id].is_alive() {
                self.handle_death(id);
                continue;
            }

            self.execute_effect(id, &instruction);
        }
    }

    /// Run the emergency fallback in place of the skipped instruction.
    fn run_emergency(&mut self, id: RobotId) {
        let Some(text) = self.robots[id].emergency_action.clone() else {
            return;
        };
        // An unparseable emergency is a silent no-op, not a freeze.
        let Ok(instruction) = Instruction::parse(&text) else {
            return;
        };

        let cost = self.costs.cost(instruction.kind());
        if self.robots[id].energy < cost {
            self.robots[id].status = Status::Frozen;
            return;
        }
        if self.robots[id].use_energy(cost) {
            if !self.robots[id].is_alive() {
                self.handle_death(id);
                return;
            }
            self.execute_effect(id, &instruction);
        }
    }

    fn execute_effect(&mut self, id: RobotId, instruction: &Instruction) {
        match instruction {
            Instruction::DirectedMove(direction) => self.move_robot(id, *direction),
            Instruction::RandomMove => {
                let direction = Direction::ALL[self.rng.next_index(Direction::ALL.len())];
                self.move_robot(id, direction);
            }
            Instruction::Pursue => {
                if let Some(direction) = self.direction_to_nearest_enemy(id) {
                    self.move_robot(id, direction);
                }
            }
            Instruction::Avoid => {
                if let Some(direction) = self.direction_from_nearest_enemy(id) {
                    self.move_robot(id, direction);
                }
            }
            Instruction::PlaceMine => self.place_mine(id),
            Instruction::Invisibility => self.robots[id].set_invisible(1),
            Instruction::FireRow => self.fire(id, Axis::Row),
            Instruction::FireColumn => self.fire(id, Axis::Column),
            Instruction::ProximityTest { on_true, on_false } => {
                self.run_conditional(id, on_true, on_false);
            }
        }
    }

    /// Resolve a one-step move, including mine interaction at the
    /// destination.
    fn move_robot(&mut self, id: RobotId, direction: Direction) {
        let from = self.robots[id].pos;
        let dest = from.step(direction);

        if !self.arena.is_passable(dest) {
            return;
        }
        if self.arena.occupant(dest).is_some() {
            return;
        }

        if let Some(mine) = self.arena.mine_at(dest) {
            if mine.owner() == self.robots[id].side {
                // Own mine blocks the move and stays armed.
                return;
            }
            // Enemy mine: complete the move, consume the mine, apply its
            // damage at the new position.
            self.arena.trigger_mine(dest);
            self.arena.clear_occupant(from);
            self.robots[id].pos = dest;
            self.arena.set_occupant(dest, id);

            let name = self.robots[id].name.clone();
            self.combat_log.push(format!(
                "{name} triggers a mine at ({},{}) for {} damage",
                dest.x, dest.y, mine.damage
            ));

            self.robots[id].take_damage(mine.damage);
            if !self.robots[id].is_alive() {
                self.handle_death(id);
            }
            return;
        }

        self.arena.clear_occupant(from);
        self.robots[id].pos = dest;
        self.arena.set_occupant(dest, id);
    }

    /// Place a mine under the acting robot; no-op on an already-mined cell.
    fn place_mine(&mut self, id: RobotId) {
        let pos = self.robots[id].pos;
        if self.arena.mine_at(pos).is_some() {
            return;
        }
        let damage = self.costs.mine_damage;
        self.arena.place_mine(pos, self.robots[id].side, damage);
    }

    /// Nearest living enemy position for pursuit; Invisible enemies are
    /// undetectable, Frozen ones are not.
    fn nearest_enemy_pos(&self, id: RobotId) -> Option<Coord> {
        let me = &self.robots[id];
        let exclude: BTreeSet<Coord> = self
            .robots
            .iter()
            .filter(|r| r.is_alive())
            .filter(|r| r.side == me.side || r.status == Status::Invisible)
            .map(|r| r.pos)
            .collect();
        self.arena.nearest_occupied(me.pos, &exclude)
    }

    fn direction_to_nearest_enemy(&self, id: RobotId) -> Option<Direction> {
        let target = self.nearest_enemy_pos(id)?;
        self.arena.direction_to(self.robots[id].pos, target)
    }

    fn direction_from_nearest_enemy(&self, id: RobotId) -> Option<Direction> {
        let target = self.nearest_enemy_pos(id)?;
        self.arena.direction_away(self.robots[id].pos, target)
    }

    /// Proximity detection: a living enemy within the configured Manhattan
    /// radius with unobstructed line of sight. Invisible and Frozen robots
    /// are never matched, at any distance.
    fn check_proximity(&self, id: RobotId) -> bool {
        let me = &self.robots[id];
        for other in &self.robots {
            if !other.is_alive() || other.side == me.side {
                continue;
            }
            if matches!(other.status, Status::Invisible | Status::Frozen) {
                continue;
            }
            if me.pos.manhattan(other.pos) <= self.config.proximity_range
                && self.arena.line_of_sight(me.pos, other.pos)
            {
                return true;
            }
        }
        false
    }

    /// Conditional dispatch. The test's own cost has already been charged;
    /// the chosen branch is charged separately and silently does nothing if
    /// unaffordable (it never freezes the robot).
    fn run_conditional(&mut self, id: RobotId, on_true: &str, on_false: &str) {
        let detected = self.check_proximity(id);
        let chosen = if detected { on_true } else { on_false };

        let Ok(instruction) = Instruction::parse(chosen) else {
            return;
        };

        let cost = self.costs.cost(instruction.kind());
        if self.robots[id].energy < cost {
            return;
        }
        if self.robots[id].use_energy(cost) {
            if !self.robots[id].is_alive() {
                self.handle_death(id);
                return;
            }
            self.execute_effect(id, &instruction);
        }
    }

    /// Fire simultaneously outward in both directions along an axis.
    ///
    /// Per direction: the scan stops at the first out-of-bounds or
    /// impassable cell, and at the first occupied cell. An enemy occupant
    /// (Invisible included) takes the fire damage; a same-side occupant
    /// blocks the shot without damage.
    fn fire(&mut self, id: RobotId, axis: Axis) {
        let origin = self.robots[id].pos;
        let side = self.robots[id].side;
        let shooter = self.robots[id].name.clone();

        let (damage, label, deltas) = match axis {
            Axis::Row => (self.costs.fire_row_damage, "row", [(-1, 0), (1, 0)]),
            Axis::Column => (self.costs.fire_column_damage, "column", [(0, -1), (0, 1)]),
        };

        self.combat_log.push(format!(
            "{shooter} fires a {label} shot from ({},{})",
            origin.x, origin.y
        ));

        for (dx, dy) in deltas {
            for distance in 1..=self.config.proximity_range {
                let cell = Coord::new(origin.x + dx * distance, origin.y + dy * distance);
                if !self.arena.in_bounds(cell) || !self.arena.is_passable(cell) {
                    break;
                }

                if let Some(target) = self.arena.occupant(cell) {
                    if self.robots[target].side == side {
                        // Friendly robots block but are never damaged.
                        break;
                    }

                    self.robots[target].take_damage(damage);
                    let outcome = if self.robots[target].is_alive() {
                        format!("damaged for {damage}")
                    } else {
                        "destroyed".to_string()
                    };
                    let target_name = self.robots[target].name.clone();
                    self.combat_log.push(format!(
                        "{shooter} hits {target_name} at ({},{}) - {outcome}",
                        cell.x, cell.y
                    ));

                    if !self.robots[target].is_alive() {
                        self.handle_death(target);
                    }
                    break;
                }
            }
        }
    }

    /// Uniform death handling: remove the robot from occupancy and leave a
    /// permanent wreck at the death cell.
    fn handle_death(&mut self, id: RobotId) {
        let pos = self.robots[id].pos;
        self.arena.clear_occupant(pos);
        self.arena.place_wreck(pos);

        let name = self.robots[id].name.clone();
        self.combat_log
            .push(format!("{name} is destroyed at ({},{})", pos.x, pos.y));
    }

    /// Decide the winner and transition into Finished.
    ///
    /// No survivors means no winner; a sole survivor's side wins; at the
    /// turn limit the side of the robot with the strictly highest energy
    /// wins, ties resolving to the earliest roster entry.
    fn determine_winner(&mut self) {
        let living: Vec<&Robot> = self.robots.iter().filter(|r| r.is_alive()).collect();

        self.winner = match living.as_slice() {
            [] => None,
            [sole] => Some(sole.side),
            [first, rest @ ..] => {
                let mut best = *first;
                for robot in rest {
                    if robot.energy > best.energy {
                        best = *robot;
                    }
                }
                Some(best.side)
            }
        };

        self.phase = Phase::Finished;
    }
}
