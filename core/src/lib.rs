#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Chase engine.
//!
//! This crate defines the vocabulary that connects the authoritative world
//! snapshots, the turn scheduler and the adapters. Agents answer with a
//! [`Direction`], the world validates it against the [`actions`] rules
//! library and produces a new immutable snapshot, and the scheduler records
//! every applied move as a [`MoveRecord`].

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

pub mod actions;
mod agent_state;
mod grid;

pub use agent_state::{AgentState, Configuration};
pub use grid::{Grid, GridError, PackedGrid};

/// Symbolic movement directions an agent may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `y`.
    North,
    /// Movement toward decreasing `y`.
    South,
    /// Movement toward increasing `x`.
    East,
    /// Movement toward decreasing `x`.
    West,
    /// No movement.
    Stop,
}

impl Direction {
    /// The four cardinal directions in canonical order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Every direction, cardinals first and [`Direction::Stop`] last.
    pub const ALL: [Direction; 5] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Stop,
    ];

    /// Returns the opposite heading. `Stop` reverses to itself.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Stop => Self::Stop,
        }
    }

    /// Returns the heading after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::South => Self::East,
            Self::East => Self::North,
            Self::West => Self::South,
            Self::Stop => Self::Stop,
        }
    }

    /// Returns the heading after a quarter turn clockwise.
    #[must_use]
    pub const fn right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::South => Self::West,
            Self::East => Self::South,
            Self::West => Self::North,
            Self::Stop => Self::Stop,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
            Self::Stop => "Stop",
        };
        f.write_str(name)
    }
}

/// Location of a single grid cell. The origin sits in the bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index, growing eastward.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index, growing northward.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Continuous agent position measured in cell units.
///
/// Agents moving at fractional speeds sit between cells; equality and
/// hashing compare the exact bit patterns so that snapshots reached through
/// the same arithmetic always collide.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Returns the position translated by the provided vector.
    #[must_use]
    pub fn translated(self, (dx, dy): (f64, f64)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Rounds the position to the nearest lattice point, halves rounding up.
    #[must_use]
    pub fn nearest_point(self) -> Self {
        Self::new((self.x + 0.5).floor(), (self.y + 0.5).floor())
    }

    /// Nearest grid cell, or `None` when the position lies west or south of the origin.
    #[must_use]
    pub fn nearest_cell(self) -> Option<CellCoord> {
        let point = self.nearest_point();
        let limit = f64::from(u32::MAX);
        if point.x < 0.0 || point.y < 0.0 || point.x > limit || point.y > limit {
            return None;
        }
        Some(CellCoord::new(point.x as u32, point.y as u32))
    }

    /// Manhattan distance between two continuous positions.
    #[must_use]
    pub fn manhattan_distance(self, other: Position) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    fn canonical_bits(value: f64) -> u64 {
        if value == 0.0 {
            0.0_f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl From<CellCoord> for Position {
    fn from(cell: CellCoord) -> Self {
        Self::new(f64::from(cell.x()), f64::from(cell.y()))
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        Self::canonical_bits(self.x) == Self::canonical_bits(other.x)
            && Self::canonical_bits(self.y) == Self::canonical_bits(other.y)
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Self::canonical_bits(self.x).hash(state);
        Self::canonical_bits(self.y).hash(state);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Slot index of an agent within the turn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentIndex(usize);

impl AgentIndex {
    /// Index of the controlled agent in every layout.
    pub const CONTROLLED: AgentIndex = AgentIndex(0);

    /// Creates a new agent index.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the numeric slot.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for AgentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Part an agent plays in the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The single agent whose capture by a non-scared adversary ends the game.
    Controlled,
    /// Any other agent.
    Adversary,
}

/// One applied move, as stored in a game's move history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Agent that moved.
    pub agent: AgentIndex,
    /// Direction that was applied.
    pub direction: Direction,
}

impl MoveRecord {
    /// Creates a new move record.
    #[must_use]
    pub const fn new(agent: AgentIndex, direction: Direction) -> Self {
        Self { agent, direction }
    }
}

#[cfg(test)]
mod tests {
    use super::{AgentIndex, CellCoord, Direction, MoveRecord, Position};
    use serde::{de::DeserializeOwned, Serialize};
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn rotations_compose() {
        for direction in Direction::CARDINALS {
            assert_eq!(direction.left().right(), direction);
            assert_eq!(direction.reverse().reverse(), direction);
            assert_eq!(direction.left().left(), direction.reverse());
        }
        assert_eq!(Direction::Stop.reverse(), Direction::Stop);
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn nearest_cell_rounds_halves_up() {
        assert_eq!(
            Position::new(1.5, 2.49).nearest_cell(),
            Some(CellCoord::new(2, 2))
        );
        assert_eq!(Position::new(-0.7, 0.0).nearest_cell(), None);
    }

    #[test]
    fn signed_zero_positions_hash_identically() {
        let positive = Position::new(0.0, 1.0);
        let negative = Position::new(-0.0, 1.0);
        assert_eq!(positive, negative);
        assert_eq!(hash_of(&positive), hash_of(&negative));
    }

    #[test]
    fn move_record_round_trips_through_bincode() {
        assert_round_trip(&MoveRecord::new(AgentIndex::new(2), Direction::West));
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(5, 7));
    }
}
