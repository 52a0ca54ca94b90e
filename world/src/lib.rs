#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world snapshots for Maze Chase.
//!
//! A [`WorldState`] is immutable once built. The only way to obtain a new
//! snapshot from an existing one is [`apply_action`], which validates the
//! requested move against the [`maze_chase_core::actions`] rules and returns a
//! successor that shares every unchanged component with its predecessor.

use std::{
    collections::BTreeSet,
    hash::{Hash, Hasher},
    sync::Arc,
};

use maze_chase_core::{
    actions, AgentIndex, AgentState, CellCoord, Configuration, Direction, Grid, GridError,
    Position, Role,
};
use thiserror::Error;

mod layout;
mod render;
mod scoring;

pub use layout::{AgentStart, Layout, LayoutError};
pub use scoring::ScoreTable;

/// Largest Manhattan distance at which the controlled agent and an adversary collide.
pub const COLLISION_TOLERANCE: f64 = 0.7;

const CONTROLLED_SPEED: f64 = 1.0;
const ADVERSARY_SPEED: f64 = 1.0;
const SCARED_SPEED_FACTOR: f64 = 0.5;

/// Reasons a transition is refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The requested direction is not currently possible for the agent.
    #[error("agent {agent} cannot move {direction}; possible directions are {possible:?}")]
    IllegalAction {
        /// Agent that requested the move.
        agent: AgentIndex,
        /// Direction that was requested.
        direction: Direction,
        /// Directions the agent could have taken.
        possible: Vec<Direction>,
    },
    /// The agent index does not name a slot in the snapshot.
    #[error("agent {agent} does not exist in a world of {agent_count} agents")]
    UnknownAgent {
        /// Requested index.
        agent: AgentIndex,
        /// Number of agent slots.
        agent_count: usize,
    },
    /// The snapshot already records a win or a loss.
    #[error("cannot move from a terminal snapshot")]
    TerminalState,
    /// An eaten item could not be cleared from the food grid.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Bookkeeping about the transition that produced a snapshot.
///
/// Consumers such as displays use it to redraw only what changed. It is not
/// part of snapshot equality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionDelta {
    /// Agent whose move produced the snapshot.
    pub moved: Option<AgentIndex>,
    /// Food cell eaten by the move.
    pub food_eaten: Option<CellCoord>,
    /// Collectible cell eaten by the move.
    pub collectible_eaten: Option<CellCoord>,
    /// Net score change of the move.
    pub score_change: i64,
}

#[derive(Debug)]
struct Arena {
    walls: Grid,
    scoring: ScoreTable,
}

/// Immutable snapshot of the whole world.
///
/// Two snapshots are equal when their agent states, food, collectibles and
/// score are equal. Win/loss flags, eaten markers and the transition delta
/// are excluded from both equality and hashing.
#[derive(Clone, Debug)]
pub struct WorldState {
    arena: Arc<Arena>,
    food: Arc<Grid>,
    collectibles: Arc<BTreeSet<CellCoord>>,
    agents: Vec<AgentState>,
    eaten: Vec<bool>,
    score: i64,
    won: bool,
    lost: bool,
    delta: TransitionDelta,
}

impl WorldState {
    /// Builds the first snapshot of a level.
    ///
    /// The controlled agent always takes slot 0; at most `adversary_limit`
    /// adversaries follow in layout order.
    #[must_use]
    pub fn initial(layout: &Layout, adversary_limit: usize, scoring: ScoreTable) -> Self {
        let agents: Vec<AgentState> = layout
            .agent_starts()
            .iter()
            .filter(|start| start.role == Role::Controlled)
            .chain(
                layout
                    .agent_starts()
                    .iter()
                    .filter(|start| start.role == Role::Adversary)
                    .take(adversary_limit),
            )
            .map(|start| {
                let configuration = Configuration::new(Position::from(start.cell), Direction::Stop);
                AgentState::new(configuration, start.role)
            })
            .collect();

        Self {
            arena: Arc::new(Arena {
                walls: layout.walls().clone(),
                scoring,
            }),
            food: Arc::new(layout.food().clone()),
            collectibles: Arc::new(layout.collectibles().iter().copied().collect()),
            eaten: vec![false; agents.len()],
            agents,
            score: 0,
            won: false,
            lost: false,
            delta: TransitionDelta::default(),
        }
    }

    /// Wall cells of the level.
    #[must_use]
    pub fn walls(&self) -> &Grid {
        &self.arena.walls
    }

    /// Score values applied by transitions.
    #[must_use]
    pub fn scoring(&self) -> &ScoreTable {
        &self.arena.scoring
    }

    /// Remaining food.
    #[must_use]
    pub fn food(&self) -> &Grid {
        &self.food
    }

    /// Remaining collectibles in ascending cell order.
    #[must_use]
    pub fn collectibles(&self) -> &BTreeSet<CellCoord> {
        &self.collectibles
    }

    /// States of every agent slot in turn order.
    #[must_use]
    pub fn agent_states(&self) -> &[AgentState] {
        &self.agents
    }

    /// State of a single agent slot.
    #[must_use]
    pub fn agent(&self, index: AgentIndex) -> Option<&AgentState> {
        self.agents.get(index.get())
    }

    /// Number of agent slots.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Reports whether the adversary in `index` was consumed by the latest transition.
    #[must_use]
    pub fn was_eaten(&self, index: AgentIndex) -> bool {
        self.eaten.get(index.get()).copied().unwrap_or(false)
    }

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.score
    }

    /// Reports whether every food item was eaten before a capture.
    #[must_use]
    pub const fn is_win(&self) -> bool {
        self.won
    }

    /// Reports whether the controlled agent was captured.
    #[must_use]
    pub const fn is_lose(&self) -> bool {
        self.lost
    }

    /// Bookkeeping about the transition that produced this snapshot.
    #[must_use]
    pub const fn delta(&self) -> &TransitionDelta {
        &self.delta
    }

    fn successor_base(&self, mover: AgentIndex) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            food: Arc::clone(&self.food),
            collectibles: Arc::clone(&self.collectibles),
            agents: self.agents.clone(),
            eaten: vec![false; self.agents.len()],
            score: self.score,
            won: self.won,
            lost: self.lost,
            delta: TransitionDelta {
                moved: Some(mover),
                ..TransitionDelta::default()
            },
        }
    }

    fn move_controlled(
        &mut self,
        index: usize,
        direction: Direction,
    ) -> Result<(), TransitionError> {
        let mover = self.agents[index];
        let vector = actions::direction_to_vector(direction, CONTROLLED_SPEED);
        let configuration = mover.configuration().translated(vector);
        self.agents[index] = mover.with_configuration(configuration);
        self.delta.score_change -= self.arena.scoring.time_penalty();

        let position = configuration.position();
        let nearest = position.nearest_point();
        if position.manhattan_distance(nearest) <= 0.5 {
            if let Some(cell) = nearest.nearest_cell() {
                self.consume(index, cell)?;
            }
        }

        for adversary in 0..self.agents.len() {
            if self.lost {
                break;
            }
            if self.agents[adversary].role() == Role::Adversary {
                self.resolve_collision(index, adversary);
            }
        }
        Ok(())
    }

    fn move_adversary(&mut self, index: usize, direction: Direction) {
        let mover = self.agents[index];
        let speed = if mover.is_scared() {
            ADVERSARY_SPEED * SCARED_SPEED_FACTOR
        } else {
            ADVERSARY_SPEED
        };
        let vector = actions::direction_to_vector(direction, speed);
        let mut configuration = mover.configuration().translated(vector);

        let timer = mover.scared_timer();
        if timer == 1 {
            configuration = Configuration::new(
                configuration.position().nearest_point(),
                configuration.direction(),
            );
        }
        self.agents[index] = mover
            .with_configuration(configuration)
            .with_scared_timer(timer.saturating_sub(1));

        if let Some(controlled) = self.agents.iter().position(AgentState::is_controlled) {
            self.resolve_collision(controlled, index);
        }
    }

    fn consume(&mut self, eater: usize, cell: CellCoord) -> Result<(), TransitionError> {
        let scoring = self.arena.scoring;

        if self.food.is_set(cell) {
            Arc::make_mut(&mut self.food).set(cell, false)?;
            self.delta.food_eaten = Some(cell);
            self.delta.score_change += scoring.food();
            let state = self.agents[eater];
            self.agents[eater] = state.with_food_carried(state.food_carried() + 1);

            if self.food.count() == 0 && !self.lost {
                self.delta.score_change += scoring.win_bonus();
                self.won = true;
            }
        }

        if self.collectibles.contains(&cell) {
            let _ = Arc::make_mut(&mut self.collectibles).remove(&cell);
            self.delta.collectible_eaten = Some(cell);
            self.delta.score_change += scoring.collectible();
            for agent in &mut self.agents {
                if agent.role() == Role::Adversary {
                    *agent = agent.with_scared_timer(scoring.scared_duration());
                }
            }
        }
        Ok(())
    }

    fn resolve_collision(&mut self, controlled: usize, adversary: usize) {
        let distance = self.agents[controlled]
            .position()
            .manhattan_distance(self.agents[adversary].position());
        if distance > COLLISION_TOLERANCE {
            return;
        }

        let scoring = self.arena.scoring;
        if self.agents[adversary].is_scared() {
            self.agents[adversary] = self.agents[adversary].reset_to_start();
            self.eaten[adversary] = true;
            self.delta.score_change += scoring.adversary_capture();
        } else if !self.won {
            self.lost = true;
            self.delta.score_change -= scoring.loss_penalty();
        }
    }
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.agents == other.agents
            && self.food == other.food
            && self.collectibles == other.collectibles
            && self.score == other.score
    }
}

impl Eq for WorldState {}

impl Hash for WorldState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.agents.hash(state);
        self.food.hash(state);
        self.collectibles.hash(state);
        self.score.hash(state);
    }
}

/// Applies one agent's move to `state`, producing the successor snapshot.
///
/// The move is re-validated against [`actions::possible_directions`] for the
/// mover's current configuration. `state` is never modified; the successor
/// shares the food grid and collectibles with it until the move eats one.
pub fn apply_action(
    state: &WorldState,
    agent: AgentIndex,
    direction: Direction,
) -> Result<WorldState, TransitionError> {
    if state.won || state.lost {
        return Err(TransitionError::TerminalState);
    }

    let mover = state.agent(agent).ok_or(TransitionError::UnknownAgent {
        agent,
        agent_count: state.agent_count(),
    })?;
    let possible = actions::possible_directions(&mover.configuration(), state.walls());
    if !possible.contains(&direction) {
        return Err(TransitionError::IllegalAction {
            agent,
            direction,
            possible,
        });
    }

    let mut next = state.successor_base(agent);
    match mover.role() {
        Role::Controlled => next.move_controlled(agent.get(), direction)?,
        Role::Adversary => next.move_adversary(agent.get(), direction),
    }
    next.score += next.delta.score_change;
    Ok(next)
}

/// Read-only queries over snapshots.
pub mod query {
    use maze_chase_core::{actions, AgentIndex, Direction, Position, Role};

    use super::WorldState;

    /// Directions an agent is expected to choose from.
    ///
    /// The controlled agent may take any possible direction. Adversaries never
    /// stop and never reverse unless reversing is their only option.
    #[must_use]
    pub fn legal_actions(state: &WorldState, agent: AgentIndex) -> Vec<Direction> {
        if state.is_win() || state.is_lose() {
            return Vec::new();
        }
        let Some(agent_state) = state.agent(agent) else {
            return Vec::new();
        };

        let configuration = agent_state.configuration();
        let mut possible = actions::possible_directions(&configuration, state.walls());
        if agent_state.role() == Role::Controlled {
            return possible;
        }

        possible.retain(|direction| *direction != Direction::Stop);
        let reverse = agent_state.direction().reverse();
        if possible.len() > 1 {
            possible.retain(|direction| *direction != reverse);
        }
        possible
    }

    /// Position of the controlled agent.
    #[must_use]
    pub fn controlled_position(state: &WorldState) -> Option<Position> {
        state
            .agent_states()
            .iter()
            .find(|agent| agent.is_controlled())
            .map(|agent| agent.position())
    }

    /// Positions of every adversary in turn order.
    #[must_use]
    pub fn adversary_positions(state: &WorldState) -> Vec<Position> {
        state
            .agent_states()
            .iter()
            .filter(|agent| agent.role() == Role::Adversary)
            .map(|agent| agent.position())
            .collect()
    }

    /// Number of food items left.
    #[must_use]
    pub fn food_remaining(state: &WorldState) -> usize {
        state.food().count()
    }

    /// Reports whether the snapshot records a win or a loss.
    #[must_use]
    pub fn is_terminal(state: &WorldState) -> bool {
        state.is_win() || state.is_lose()
    }
}
