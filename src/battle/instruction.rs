//! Instruction grammar, parser, and the cost/damage tables.
//!
//! Robot programs are sequences of instruction strings. The grammar is
//! case-insensitive:
//!
//! - bare mnemonics: `RANDOMMOVE`, `PURSUE`, `AVOID`, `PLACEMINE`,
//!   `INVISIBILITY`, `FIREROW`, `FIRECOLUMN`
//! - `DIRECTEDMOVE(D)` with `D` one of the eight compass codes
//! - `PROXIMITYTEST(a,b)` where `a` and `b` are themselves instruction
//!   strings, split on top-level commas only, and neither is itself a
//!   proximity test
//!
//! A malformed string never produces a partial instruction; the dispatch
//! layer treats parse failures as no-ops.

use std::fmt;

use crate::battle::Direction;

/// A parsed robot instruction.
///
/// Conditional branches stay in string form and are re-parsed when the
/// branch is chosen; the parser guarantees they are valid and
/// non-conditional, so nesting is excluded by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Move one step in a fixed direction.
    DirectedMove(Direction),
    /// Move one step in a randomly drawn direction.
    RandomMove,
    /// Move one step toward the nearest detectable enemy.
    Pursue,
    /// Move one step away from the nearest detectable enemy.
    Avoid,
    /// Place a mine on the current cell.
    PlaceMine,
    /// Become invisible for one turn.
    Invisibility,
    /// Fire along the current row, both directions at once.
    FireRow,
    /// Fire along the current column, both directions at once.
    FireColumn,
    /// Run a proximity test and execute one of two pre-declared branches.
    ProximityTest {
        /// Branch executed when an enemy is detected.
        on_true: String,
        /// Branch executed otherwise.
        on_false: String,
    },
}

/// Instruction type tag, used as the key into the cost and damage tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    /// [`Instruction::DirectedMove`].
    DirectedMove,
    /// [`Instruction::RandomMove`].
    RandomMove,
    /// [`Instruction::Pursue`].
    Pursue,
    /// [`Instruction::Avoid`].
    Avoid,
    /// [`Instruction::PlaceMine`].
    PlaceMine,
    /// [`Instruction::Invisibility`].
    Invisibility,
    /// [`Instruction::FireRow`].
    FireRow,
    /// [`Instruction::FireColumn`].
    FireColumn,
    /// [`Instruction::ProximityTest`].
    ProximityTest,
}

impl Instruction {
    /// The type tag of this instruction.
    #[must_use]
    pub const fn kind(&self) -> InstructionKind {
        match self {
            Instruction::DirectedMove(_) => InstructionKind::DirectedMove,
            Instruction::RandomMove => InstructionKind::RandomMove,
            Instruction::Pursue => InstructionKind::Pursue,
            Instruction::Avoid => InstructionKind::Avoid,
            Instruction::PlaceMine => InstructionKind::PlaceMine,
            Instruction::Invisibility => InstructionKind::Invisibility,
            Instruction::FireRow => InstructionKind::FireRow,
            Instruction::FireColumn => InstructionKind::FireColumn,
            Instruction::ProximityTest { .. } => InstructionKind::ProximityTest,
        }
    }

    /// Parse an instruction string.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the first problem found; never a
    /// partial instruction.
    pub fn parse(input: &str) -> Result<Instruction, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let (mnemonic, args) = match input.find('(') {
            Some(open) => (&input[..open], Some(&input[open..])),
            None => (input, None),
        };
        let mnemonic = mnemonic.trim().to_ascii_uppercase();

        match mnemonic.as_str() {
            "DIRECTEDMOVE" => {
                let Some(args) = args else {
                    return Err(ParseError::MissingDirection);
                };
                let code = args
                    .strip_prefix('(')
                    .unwrap_or(args)
                    .trim_end_matches(')')
                    .trim();
                Direction::parse(code)
                    .map(Instruction::DirectedMove)
                    .ok_or_else(|| ParseError::BadDirection(code.to_string()))
            }
            "PROXIMITYTEST" => parse_conditional(input),
            // Arguments on the simple mnemonics are tolerated and ignored.
            "RANDOMMOVE" => Ok(Instruction::RandomMove),
            "PURSUE" => Ok(Instruction::Pursue),
            "AVOID" => Ok(Instruction::Avoid),
            "PLACEMINE" => Ok(Instruction::PlaceMine),
            "INVISIBILITY" => Ok(Instruction::Invisibility),
            "FIREROW" => Ok(Instruction::FireRow),
            "FIRECOLUMN" => Ok(Instruction::FireColumn),
            _ => Err(ParseError::UnknownMnemonic(mnemonic)),
        }
    }
}

/// Parse `PROXIMITYTEST(a,b)`, splitting on top-level commas only.
fn parse_conditional(input: &str) -> Result<Instruction, ParseError> {
    let (Some(open), Some(close)) = (input.find('('), input.rfind(')')) else {
        return Err(ParseError::MalformedConditional);
    };
    if close <= open {
        return Err(ParseError::MalformedConditional);
    }
    let body = &input[open + 1..close];

    let mut branches = Vec::new();
    let mut depth = 0u32;
    let mut current = String::new();
    for ch in body.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                branches.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        branches.push(current.trim().to_string());
    }

    if branches.len() != 2 || branches.iter().any(String::is_empty) {
        return Err(ParseError::MalformedConditional);
    }

    // Branches are stored in canonical form so mixed-case spellings of the
    // same conditional compare equal.
    let mut canonical = Vec::with_capacity(2);
    for branch in &branches {
        let parsed = Instruction::parse(branch)?;
        if parsed.kind() == InstructionKind::ProximityTest {
            return Err(ParseError::NestedConditional);
        }
        canonical.push(parsed.to_string());
    }

    let mut canonical = canonical.into_iter();
    // Two entries guaranteed by the arity check above.
    let on_true = canonical.next().unwrap_or_default();
    let on_false = canonical.next().unwrap_or_default();
    Ok(Instruction::ProximityTest { on_true, on_false })
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::DirectedMove(d) => write!(f, "DIRECTEDMOVE({d})"),
            Instruction::RandomMove => f.write_str("RANDOMMOVE"),
            Instruction::Pursue => f.write_str("PURSUE"),
            Instruction::Avoid => f.write_str("AVOID"),
            Instruction::PlaceMine => f.write_str("PLACEMINE"),
            Instruction::Invisibility => f.write_str("INVISIBILITY"),
            Instruction::FireRow => f.write_str("FIREROW"),
            Instruction::FireColumn => f.write_str("FIRECOLUMN"),
            Instruction::ProximityTest { on_true, on_false } => {
                write!(f, "PROXIMITYTEST({on_true},{on_false})")
            }
        }
    }
}

/// Why an instruction string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The string was empty or all whitespace.
    Empty,
    /// The mnemonic is not in the instruction set.
    UnknownMnemonic(String),
    /// `DIRECTEDMOVE` without a direction argument.
    MissingDirection,
    /// The direction argument is not one of the eight compass codes.
    BadDirection(String),
    /// A proximity test without exactly two non-empty branches.
    MalformedConditional,
    /// A proximity test branch is itself a proximity test.
    NestedConditional,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty instruction"),
            ParseError::UnknownMnemonic(m) => write!(f, "unknown mnemonic: {m}"),
            ParseError::MissingDirection => write!(f, "DIRECTEDMOVE requires a direction"),
            ParseError::BadDirection(d) => write!(f, "invalid direction: {d}"),
            ParseError::MalformedConditional => {
                write!(f, "PROXIMITYTEST requires exactly two non-empty actions")
            }
            ParseError::NestedConditional => {
                write!(f, "PROXIMITYTEST branches cannot be proximity tests")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Buffer added on top of the highest instruction cost to form the
/// emergency threshold.
const EMERGENCY_BUFFER: i32 = 10;

/// Immutable energy-cost and damage tables.
///
/// Owned by the instruction model and passed to the battle engine, so tests
/// can run alternate tunings without touching global state.
#[derive(Debug, Clone, Copy)]
pub struct CostModel {
    /// Cost of a directed move.
    pub directed_move: i32,
    /// Cost of a random move.
    pub random_move: i32,
    /// Cost of a pursue step.
    pub pursue: i32,
    /// Cost of an avoid step.
    pub avoid: i32,
    /// Cost of placing a mine.
    pub place_mine: i32,
    /// Cost of one turn of invisibility.
    pub invisibility: i32,
    /// Cost of a row shot.
    pub fire_row: i32,
    /// Cost of a column shot.
    pub fire_column: i32,
    /// Flat cost of the proximity test itself, charged separately from the
    /// chosen branch.
    pub proximity_test: i32,
    /// Damage dealt by a triggered mine.
    pub mine_damage: i32,
    /// Damage dealt by a row shot.
    pub fire_row_damage: i32,
    /// Damage dealt by a column shot.
    pub fire_column_damage: i32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            directed_move: 5,
            random_move: 5,
            pursue: 10,
            avoid: 15,
            place_mine: 200,
            invisibility: 200,
            fire_row: 100,
            fire_column: 100,
            proximity_test: 4,
            mine_damage: 200,
            fire_row_damage: 200,
            fire_column_damage: 200,
        }
    }
}

impl CostModel {
    /// Energy cost of one invocation of the given instruction kind.
    #[must_use]
    pub const fn cost(&self, kind: InstructionKind) -> i32 {
        match kind {
            InstructionKind::DirectedMove => self.directed_move,
            InstructionKind::RandomMove => self.random_move,
            InstructionKind::Pursue => self.pursue,
            InstructionKind::Avoid => self.avoid,
            InstructionKind::PlaceMine => self.place_mine,
            InstructionKind::Invisibility => self.invisibility,
            InstructionKind::FireRow => self.fire_row,
            InstructionKind::FireColumn => self.fire_column,
            InstructionKind::ProximityTest => self.proximity_test,
        }
    }

    /// Damage value of the given instruction kind; zero for instructions
    /// that deal none.
    #[must_use]
    pub const fn damage(&self, kind: InstructionKind) -> i32 {
        match kind {
            InstructionKind::PlaceMine => self.mine_damage,
            InstructionKind::FireRow => self.fire_row_damage,
            InstructionKind::FireColumn => self.fire_column_damage,
            _ => 0,
        }
    }

    /// The highest single-instruction cost in the table.
    #[must_use]
    pub fn max_cost(&self) -> i32 {
        [
            self.directed_move,
            self.random_move,
            self.pursue,
            self.avoid,
            self.place_mine,
            self.invisibility,
            self.fire_row,
            self.fire_column,
            self.proximity_test,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    /// The per-robot energy floor below which normal instructions are
    /// abandoned in favour of the emergency fallback.
    #[must_use]
    pub fn emergency_threshold(&self) -> i32 {
        self.max_cost() + EMERGENCY_BUFFER
    }
}
