//! Arena: the battle grid, obstacles, wrecks, mines, and robot positions.

use std::collections::{BTreeMap, BTreeSet};

use crate::battle::{RobotId, Rng, SideId};
use crate::error::{ArenaError, ArenaResult};

/// Random probes attempted before falling back to an exhaustive scan.
const PLACEMENT_ATTEMPTS: u32 = 1000;

/// A coordinate on the arena grid.
///
/// Signed so that off-grid destinations (current position plus a direction
/// offset) can be represented and rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The coordinate one step in the given direction.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }
}

/// The eight compass directions, with grid offsets.
///
/// Y grows downward, so N is (0, -1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// North (0, -1).
    N,
    /// North-east (1, -1).
    NE,
    /// East (1, 0).
    E,
    /// South-east (1, 1).
    SE,
    /// South (0, 1).
    S,
    /// South-west (-1, 1).
    SW,
    /// West (-1, 0).
    W,
    /// North-west (-1, -1).
    NW,
}

impl Direction {
    /// All directions in canonical order (clockwise from north).
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Grid offset `(dx, dy)` for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::N => (0, -1),
            Direction::NE => (1, -1),
            Direction::E => (1, 0),
            Direction::SE => (1, 1),
            Direction::S => (0, 1),
            Direction::SW => (-1, 1),
            Direction::W => (-1, 0),
            Direction::NW => (-1, -1),
        }
    }

    /// Find the direction matching a unit offset, if any.
    #[must_use]
    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.offset() == (dx, dy))
    }

    /// The opposite direction.
    #[must_use]
    pub fn opposite(self) -> Direction {
        let (dx, dy) = self.offset();
        // Every unit offset has a matching opposite in the table.
        Direction::from_offset(-dx, -dy).unwrap_or(self)
    }

    /// Parse a compass code such as `NE` (case-insensitive).
    #[must_use]
    pub fn parse(code: &str) -> Option<Direction> {
        match code.trim().to_ascii_uppercase().as_str() {
            "N" => Some(Direction::N),
            "NE" => Some(Direction::NE),
            "E" => Some(Direction::E),
            "SE" => Some(Direction::SE),
            "S" => Some(Direction::S),
            "SW" => Some(Direction::SW),
            "W" => Some(Direction::W),
            "NW" => Some(Direction::NW),
            _ => None,
        }
    }

    /// Canonical compass code for this direction.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Direction::N => "N",
            Direction::NE => "NE",
            Direction::E => "E",
            Direction::SE => "SE",
            Direction::S => "S",
            Direction::SW => "SW",
            Direction::W => "W",
            Direction::NW => "NW",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// What permanently occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CellKind {
    /// Nothing fixed on the cell.
    Empty = 0,
    /// Impassable obstacle placed at setup.
    Obstacle = 1,
    /// Impassable wreck left where a robot died.
    Wreck = 2,
}

impl CellKind {
    /// Check whether robots can stand on this kind of cell.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        matches!(self, CellKind::Empty)
    }
}

/// A single-use damage trap bound to a cell.
///
/// Ownership is encoded as `side * 10`, the wire value the trap carries;
/// [`Mine::owner`] decodes it back to the owning side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mine {
    /// Encoded owner tag (`side * 10`). Wide enough that every `SideId`
    /// encodes without overflow.
    pub owner_tag: u32,
    /// Damage applied to an enemy robot stepping on the mine.
    pub damage: i32,
}

impl Mine {
    /// Create a mine owned by the given side.
    #[must_use]
    pub const fn new(owner: SideId, damage: i32) -> Self {
        Self {
            owner_tag: owner as u32 * 10,
            damage,
        }
    }

    /// Decode the owning side from the tag.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn owner(self) -> SideId {
        // The tag is only ever built from a SideId, so the division fits.
        (self.owner_tag / 10) as SideId
    }
}

/// The battle grid: bounded cell space, mine index, and robot occupancy.
///
/// All mutation funnels through these operations; the engine never writes
/// the maps directly, so the occupancy and mine invariants are preserved
/// centrally.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Width of the arena in cells.
    width: i32,
    /// Height of the arena in cells.
    height: i32,
    /// Cells stored in row-major order.
    cells: Vec<CellKind>,
    /// One mine at most per cell.
    mines: BTreeMap<Coord, Mine>,
    /// Position of every live robot. `BTreeMap` keeps iteration deterministic.
    occupancy: BTreeMap<Coord, RobotId>,
}

impl Arena {
    /// Create a new empty arena.
    ///
    /// Returns `None` if either dimension is zero or negative.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }

        #[allow(clippy::cast_sign_loss)]
        let size = (width as usize) * (height as usize);
        Some(Self {
            width,
            height,
            cells: vec![CellKind::Empty; size],
            mines: BTreeMap::new(),
            occupancy: BTreeMap::new(),
        })
    }

    /// Arena width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Arena height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check whether a coordinate is within the arena bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some((coord.y as usize) * (self.width as usize) + (coord.x as usize))
        } else {
            None
        }
    }

    /// The fixed contents of a cell, or `None` out of bounds.
    #[must_use]
    pub fn cell(&self, coord: Coord) -> Option<CellKind> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    /// Check whether a cell can be moved onto.
    ///
    /// False for out-of-bounds, Obstacle, and Wreck cells. Mines and robot
    /// occupancy do not affect passability.
    #[must_use]
    pub fn is_passable(&self, coord: Coord) -> bool {
        self.index(coord)
            .is_some_and(|idx| self.cells[idx].is_passable())
    }

    /// Place an obstacle. Out-of-bounds placements are ignored.
    pub fn place_obstacle(&mut self, coord: Coord) {
        if let Some(idx) = self.index(coord) {
            self.cells[idx] = CellKind::Obstacle;
        }
    }

    /// Place a wreck where a robot died. Out-of-bounds placements are ignored.
    pub fn place_wreck(&mut self, coord: Coord) {
        if let Some(idx) = self.index(coord) {
            self.cells[idx] = CellKind::Wreck;
        }
    }

    /// Place a mine at a cell. Out-of-bounds placements are ignored.
    ///
    /// The caller is responsible for refusing placement on an already-mined
    /// cell; a second placement here overwrites.
    pub fn place_mine(&mut self, coord: Coord, owner: SideId, damage: i32) {
        if self.in_bounds(coord) {
            self.mines.insert(coord, Mine::new(owner, damage));
        }
    }

    /// The mine at a cell, if any, without removing it.
    #[must_use]
    pub fn mine_at(&self, coord: Coord) -> Option<Mine> {
        self.mines.get(&coord).copied()
    }

    /// Remove and return the mine at a cell, if any.
    pub fn trigger_mine(&mut self, coord: Coord) -> Option<Mine> {
        self.mines.remove(&coord)
    }

    /// Number of live mines on the grid.
    #[must_use]
    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    /// Iterate over all mines and their coordinates.
    pub fn mines(&self) -> impl Iterator<Item = (Coord, Mine)> + '_ {
        self.mines.iter().map(|(c, m)| (*c, *m))
    }

    /// The robot occupying a cell, if any.
    #[must_use]
    pub fn occupant(&self, coord: Coord) -> Option<RobotId> {
        self.occupancy.get(&coord).copied()
    }

    /// Record a robot at a cell.
    pub fn set_occupant(&mut self, coord: Coord, robot: RobotId) {
        self.occupancy.insert(coord, robot);
    }

    /// Clear the occupant of a cell, returning it if one was present.
    pub fn clear_occupant(&mut self, coord: Coord) -> Option<RobotId> {
        self.occupancy.remove(&coord)
    }

    /// Iterate over occupied positions in deterministic coordinate order.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (Coord, RobotId)> + '_ {
        self.occupancy.iter().map(|(c, r)| (*c, *r))
    }

    /// In-bounds neighbours of a cell in canonical direction order.
    ///
    /// Returns a fixed-size array and count to avoid heap allocation. The
    /// array contains valid coordinates in indices `0..count`.
    #[must_use]
    pub fn adjacent(&self, coord: Coord) -> ([Coord; 8], u8) {
        let mut result = [Coord::new(0, 0); 8];
        let mut count = 0u8;

        for direction in Direction::ALL {
            let next = coord.step(direction);
            if self.in_bounds(next) {
                result[count as usize] = next;
                count += 1;
            }
        }

        (result, count)
    }

    /// The occupied position nearest to `from` by Manhattan distance.
    ///
    /// Positions in `exclude` are skipped. Ties resolve to the smallest
    /// coordinate in `Ord` order (occupancy iterates sorted).
    #[must_use]
    pub fn nearest_occupied(&self, from: Coord, exclude: &BTreeSet<Coord>) -> Option<Coord> {
        let mut nearest = None;
        let mut best = i32::MAX;

        for (&pos, _) in &self.occupancy {
            if exclude.contains(&pos) {
                continue;
            }
            let distance = from.manhattan(pos);
            if distance < best {
                best = distance;
                nearest = Some(pos);
            }
        }

        nearest
    }

    /// The direction that steps toward `to` from `from`.
    ///
    /// Each axis delta is sign-clamped to {-1, 0, 1} and matched against the
    /// eight compass offsets. `None` when the coordinates are equal.
    #[must_use]
    pub fn direction_to(&self, from: Coord, to: Coord) -> Option<Direction> {
        let dx = (to.x - from.x).clamp(-1, 1);
        let dy = (to.y - from.y).clamp(-1, 1);
        if dx == 0 && dy == 0 {
            return None;
        }
        Direction::from_offset(dx, dy)
    }

    /// The direction that steps away from `avoid`, the inverse of
    /// [`Arena::direction_to`]. `None` when the coordinates are equal.
    #[must_use]
    pub fn direction_away(&self, from: Coord, avoid: Coord) -> Option<Direction> {
        self.direction_to(from, avoid).map(Direction::opposite)
    }

    /// Pick a random unoccupied passable cell.
    ///
    /// Probes random cells a bounded number of times, then falls back to an
    /// exhaustive row-major scan.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::ArenaFull`] when no cell qualifies.
    pub fn random_empty_position(
        &self,
        rng: &mut Rng,
        exclude: &BTreeSet<Coord>,
    ) -> ArenaResult<Coord> {
        for _ in 0..PLACEMENT_ATTEMPTS {
            #[allow(clippy::cast_sign_loss)]
            let coord = Coord::new(
                i32::try_from(rng.next_u32(self.width as u32)).unwrap_or(0),
                i32::try_from(rng.next_u32(self.height as u32)).unwrap_or(0),
            );
            if !exclude.contains(&coord) && self.is_passable(coord) {
                return Ok(coord);
            }
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let coord = Coord::new(x, y);
                if !exclude.contains(&coord) && self.is_passable(coord) {
                    return Ok(coord);
                }
            }
        }

        Err(ArenaError::ArenaFull)
    }

    /// Randomly place up to `count` obstacles, honouring an exclusion set.
    ///
    /// Stops early without failing when the arena fills before the requested
    /// count is reached. Returns the number actually placed.
    pub fn scatter_obstacles(
        &mut self,
        count: usize,
        exclude: &BTreeSet<Coord>,
        rng: &mut Rng,
    ) -> usize {
        let mut taken = exclude.clone();
        let mut placed = 0;

        while placed < count {
            let Ok(coord) = self.random_empty_position(rng, &taken) else {
                break;
            };
            self.place_obstacle(coord);
            taken.insert(coord);
            placed += 1;
        }

        placed
    }

    /// Check for an unobstructed straight line between two cells.
    ///
    /// Walks `max(|dx|, |dy|)` interpolated samples; every intermediate
    /// sample must be in-bounds and passable. Mines and robot occupancy are
    /// ignored, and the destination cell's passability is never checked (a
    /// robot may legitimately stand there).
    #[must_use]
    pub fn line_of_sight(&self, from: Coord, to: Coord) -> bool {
        if from == to {
            return true;
        }

        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let steps = dx.abs().max(dy.abs());

        let x_step = f64::from(dx) / f64::from(steps);
        let y_step = f64::from(dy) / f64::from(steps);

        for i in 1..=steps {
            let sample = Coord::new(
                from.x + round_half_to_even(x_step * f64::from(i)),
                from.y + round_half_to_even(y_step * f64::from(i)),
            );

            if !self.in_bounds(sample) {
                return false;
            }
            if sample == to {
                return true;
            }
            if !self.is_passable(sample) {
                return false;
            }
        }

        true
    }
}

/// Round to the nearest integer, ties to even.
///
/// The interpolation rounding is part of the observable line-of-sight
/// behaviour and must not drift to half-away-from-zero rounding.
#[allow(clippy::cast_possible_truncation)]
fn round_half_to_even(value: f64) -> i32 {
    let floor = value.floor();
    let fraction = value - floor;
    let base = floor as i32;
    if fraction > 0.5 {
        base + 1
    } else if fraction < 0.5 {
        base
    } else if base % 2 == 0 {
        base
    } else {
        base + 1
    }
}
