//! Contracts the scheduler drives: agents, the rules and the display.

use std::sync::Arc;

use maze_chase_core::{AgentIndex, Direction};
use maze_chase_world::WorldState;

use crate::{budget::TimeBudget, error::AgentFault, GameProgress};

/// Decision-making participant occupying one agent slot.
///
/// Every hook except [`Agent::get_action`] has a no-op default. Hooks receive
/// shared snapshots and cannot alter the world; their only effect on the game
/// is the returned value. Hooks may run on a worker thread that is abandoned
/// when they overrun their budget.
pub trait Agent: Send {
    /// Called once with the initial snapshot before any agent moves.
    fn register_initial_state(&mut self, _state: &WorldState) -> anyhow::Result<()> {
        Ok(())
    }

    /// Pre-processes the snapshot handed to [`Agent::get_action`].
    ///
    /// Agents that only see part of the world return a filtered snapshot.
    fn observe(&mut self, state: &Arc<WorldState>) -> anyhow::Result<Arc<WorldState>> {
        Ok(Arc::clone(state))
    }

    /// Chooses the next move. `None` means the agent has no answer and stops.
    fn get_action(&mut self, state: &WorldState) -> anyhow::Result<Option<Direction>>;

    /// Called once with the terminal snapshot when the game finishes normally.
    fn game_over(&mut self, _state: &WorldState) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Decision of the rules after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Keep playing.
    Continue,
    /// The game is over.
    Over,
}

/// Game rules consulted by the scheduler.
pub trait Rules {
    /// Builds the initial snapshot for `agent_count` agents.
    fn new_game(&mut self, agent_count: usize) -> anyhow::Result<WorldState>;

    /// Inspects the snapshot produced by the latest transition.
    fn process(&mut self, state: &WorldState, progress: &GameProgress) -> Verdict;

    /// Learns that an agent crashed or failed during finalization.
    fn agent_crash(&mut self, index: AgentIndex, fault: &AgentFault);

    /// Time limits for one agent.
    fn time_budget(&self, _index: AgentIndex) -> TimeBudget {
        TimeBudget::unlimited()
    }

    /// Estimate of how far the game has advanced, between 0 and 1.
    fn progress(&self, state: &WorldState, progress: &GameProgress) -> f32;
}

/// Presentation surface notified synchronously by the scheduler.
pub trait GameDisplay {
    /// Shows the initial snapshot.
    fn initialize(&mut self, state: &WorldState);

    /// Shows the snapshot produced by the latest transition.
    fn update(&mut self, state: &WorldState);

    /// The game ended, normally or by a crash.
    fn finish(&mut self);
}

/// Display that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDisplay;

impl GameDisplay for NullDisplay {
    fn initialize(&mut self, _state: &WorldState) {}

    fn update(&mut self, _state: &WorldState) {}

    fn finish(&mut self) {}
}
