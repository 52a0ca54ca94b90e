//! Agents that replay recorded move histories.

use std::collections::VecDeque;

use maze_chase_core::{AgentIndex, Direction, MoveRecord};
use maze_chase_world::WorldState;

use crate::collaborators::Agent;

/// Agent that plays a fixed sequence of moves and then has no answer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptedAgent {
    moves: VecDeque<Direction>,
}

impl ScriptedAgent {
    /// Creates an agent that plays `moves` in order.
    #[must_use]
    pub fn new(moves: impl IntoIterator<Item = Direction>) -> Self {
        Self {
            moves: moves.into_iter().collect(),
        }
    }

    /// Creates an agent that replays the moves `index` made in `history`.
    #[must_use]
    pub fn from_history(history: &[MoveRecord], index: AgentIndex) -> Self {
        Self::new(
            history
                .iter()
                .filter(|record| record.agent == index)
                .map(|record| record.direction),
        )
    }

    /// Moves not yet played.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.moves.len()
    }
}

impl Agent for ScriptedAgent {
    fn get_action(&mut self, _state: &WorldState) -> anyhow::Result<Option<Direction>> {
        Ok(self.moves.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use maze_chase_world::{Layout, ScoreTable};

    use super::*;

    #[test]
    fn replays_only_the_selected_agent() {
        let history = [
            MoveRecord::new(AgentIndex::new(0), Direction::East),
            MoveRecord::new(AgentIndex::new(1), Direction::West),
            MoveRecord::new(AgentIndex::new(0), Direction::Stop),
        ];
        let mut agent = ScriptedAgent::from_history(&history, AgentIndex::CONTROLLED);
        assert_eq!(agent.remaining(), 2);

        let layout = Layout::parse(&["P"]).expect("valid layout");
        let state = WorldState::initial(&layout, 0, ScoreTable::classic());
        assert_eq!(agent.get_action(&state).expect("scripted"), Some(Direction::East));
        assert_eq!(agent.get_action(&state).expect("scripted"), Some(Direction::Stop));
        assert_eq!(agent.get_action(&state).expect("scripted"), None);
    }
}
