//! Battle layer for Botwar.
//!
//! Implements the battle-resolution engine:
//! - Arena with obstacles, wrecks, mines, and robot occupancy
//! - Robots with energy, a status machine, and circular programs
//! - The instruction grammar, parser, and cost model
//! - The turn scheduler, combat resolution, and win determination

mod arena;
mod engine;
mod instruction;
mod invariants;
mod rng;
mod robot;

pub use arena::{Arena, CellKind, Coord, Direction, Mine};
pub use engine::{Battle, BattleConfig, BattleStats, Phase};
pub use instruction::{CostModel, Instruction, InstructionKind, ParseError};
pub use invariants::{check_invariants, InvariantViolation};
pub use rng::Rng;
pub use robot::{Robot, RobotId, SideId, Status};
