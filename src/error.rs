//! Error types for the battle simulator.

use std::fmt;

/// Errors raised by arena placement operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// No unoccupied passable cell is left for placement.
    ///
    /// This indicates a configuration problem (too many obstacles or robots
    /// for the grid), not a recoverable runtime condition.
    ArenaFull,
    /// The requested cell is impassable or already occupied.
    CellUnavailable,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::ArenaFull => write!(f, "no empty positions available in arena"),
            ArenaError::CellUnavailable => write!(f, "cell is not passable or already occupied"),
        }
    }
}

impl std::error::Error for ArenaError {}

/// Result type for arena placement operations.
pub type ArenaResult<T> = Result<T, ArenaError>;
