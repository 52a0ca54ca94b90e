//! Agent kinematics and per-agent bookkeeping.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::{actions, Direction, Position, Role};

/// Continuous position of an agent together with its heading.
///
/// A configuration is immutable; moving produces a new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    position: Position,
    direction: Direction,
}

impl Configuration {
    /// Creates a new configuration.
    #[must_use]
    pub const fn new(position: Position, direction: Direction) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current heading.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Reports whether the position lies exactly on a grid cell.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.position.x() == self.position.x().trunc()
            && self.position.y() == self.position.y().trunc()
    }

    /// Translates by `vector` without checking legality.
    ///
    /// The heading follows the vector; a zero vector keeps the previous
    /// heading so that a travelling agent never faces `Stop`.
    #[must_use]
    pub fn translated(&self, vector: (f64, f64)) -> Self {
        let direction = match actions::vector_to_direction(vector) {
            Direction::Stop => self.direction,
            direction => direction,
        };
        Self::new(self.position.translated(vector), direction)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x,y)={}, {}", self.position, self.direction)
    }
}

/// Everything the world tracks about one agent slot.
///
/// Equality and hashing only consider the configuration and the scared
/// timer. The start configuration, role and food count are bookkeeping.
#[derive(Clone, Copy, Debug)]
pub struct AgentState {
    start: Configuration,
    configuration: Configuration,
    role: Role,
    scared_timer: u32,
    food_carried: u32,
}

impl AgentState {
    /// Creates a fresh agent state resting at its start configuration.
    #[must_use]
    pub const fn new(start: Configuration, role: Role) -> Self {
        Self {
            start,
            configuration: start,
            role,
            scared_timer: 0,
            food_carried: 0,
        }
    }

    /// Configuration the agent returns to when consumed.
    #[must_use]
    pub const fn start(&self) -> Configuration {
        self.start
    }

    /// Current configuration.
    #[must_use]
    pub const fn configuration(&self) -> Configuration {
        self.configuration
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.configuration.position()
    }

    /// Current heading.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.configuration.direction()
    }

    /// Role of the agent.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Reports whether this is the controlled agent.
    #[must_use]
    pub fn is_controlled(&self) -> bool {
        self.role == Role::Controlled
    }

    /// Remaining scared moves. Zero means the agent is dangerous.
    #[must_use]
    pub const fn scared_timer(&self) -> u32 {
        self.scared_timer
    }

    /// Reports whether the scared countdown is running.
    #[must_use]
    pub const fn is_scared(&self) -> bool {
        self.scared_timer > 0
    }

    /// Food items this agent has eaten.
    #[must_use]
    pub const fn food_carried(&self) -> u32 {
        self.food_carried
    }

    /// Copy of this state with a new configuration.
    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Copy of this state with a new scared countdown.
    #[must_use]
    pub fn with_scared_timer(mut self, scared_timer: u32) -> Self {
        self.scared_timer = scared_timer;
        self
    }

    /// Copy of this state with a new food count.
    #[must_use]
    pub fn with_food_carried(mut self, carried: u32) -> Self {
        self.food_carried = carried;
        self
    }

    /// Copy of this state sent back to its start with the scared countdown cleared.
    #[must_use]
    pub fn reset_to_start(mut self) -> Self {
        self.configuration = self.start;
        self.scared_timer = 0;
        self
    }
}

impl PartialEq for AgentState {
    fn eq(&self, other: &Self) -> bool {
        self.configuration == other.configuration && self.scared_timer == other.scared_timer
    }
}

impl Eq for AgentState {}

impl Hash for AgentState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.configuration.hash(state);
        self.scared_timer.hash(state);
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Controlled => write!(f, "Controlled: {}", self.configuration),
            Role::Adversary => write!(f, "Adversary: {}", self.configuration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64, direction: Direction) -> Configuration {
        Configuration::new(Position::new(x, y), direction)
    }

    #[test]
    fn integer_detection_rejects_half_steps() {
        assert!(at(3.0, 1.0, Direction::East).is_integer());
        assert!(!at(3.5, 1.0, Direction::East).is_integer());
    }

    #[test]
    fn zero_translation_keeps_heading() {
        let moved = at(1.0, 1.0, Direction::West).translated((0.0, 0.0));
        assert_eq!(moved.direction(), Direction::West);
        assert_eq!(moved.position(), Position::new(1.0, 1.0));

        let turned = moved.translated((0.0, -0.5));
        assert_eq!(turned.direction(), Direction::South);
        assert_eq!(turned.position(), Position::new(1.0, 0.5));
    }

    #[test]
    fn equality_ignores_counters_and_start() {
        let base = AgentState::new(at(1.0, 1.0, Direction::Stop), Role::Adversary);
        let other = AgentState::new(at(4.0, 4.0, Direction::Stop), Role::Adversary)
            .with_configuration(at(1.0, 1.0, Direction::Stop))
            .with_food_carried(3);
        assert_eq!(base, other);
        assert_ne!(base, base.with_scared_timer(1));
    }

    #[test]
    fn reset_clears_scared_timer() {
        let start = at(2.0, 2.0, Direction::Stop);
        let state = AgentState::new(start, Role::Adversary)
            .with_configuration(at(5.0, 2.0, Direction::East))
            .with_scared_timer(7)
            .reset_to_start();
        assert_eq!(state.configuration(), start);
        assert_eq!(state.scared_timer(), 0);
    }
}
