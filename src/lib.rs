// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Botwar: a deterministic grid-based robot battle simulator.
//!
//! Programmable robots carry fixed circular instruction sequences and act
//! on a shared grid, spending energy to move, detect, lay mines, and fire
//! until one side remains or the turn limit hits. Everything is driven by a
//! single seeded PRNG, so a battle is exactly reproducible from its seed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          Series Runner              │
//! ├─────────────────────────────────────┤
//! │         Battle Engine               │
//! ├──────────────┬──────────────────────┤
//! │    Arena     │  Robots, Programs    │
//! └──────────────┴──────────────────────┘
//! ```

pub mod battle;
pub mod error;
pub mod runner;

pub use error::{ArenaError, ArenaResult};

// Re-export key battle types at crate root for convenience
pub use battle::{
    Arena, Battle, BattleConfig, BattleStats, CellKind, Coord, CostModel, Direction, Instruction,
    InstructionKind, Phase, Robot, RobotId, SideId, Status,
};
