//! Saved move histories.

use std::{fs, path::Path};

use anyhow::Context;
use maze_chase_core::{AgentIndex, MoveRecord};
use serde::{Deserialize, Serialize};

/// Moves of one game in transition order, plus the score they produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MoveHistory {
    /// Applied moves.
    pub(crate) moves: Vec<MoveRecord>,
    /// Score at the end of the recorded game, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) score: Option<i64>,
}

impl MoveHistory {
    /// Reads a history from a JSON file.
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read move history {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse move history {}", path.display()))
    }

    /// Writes the history as pretty-printed JSON.
    pub(crate) fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode move history")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write move history {}", path.display()))
    }

    /// Highest agent index that appears in the history.
    pub(crate) fn highest_agent(&self) -> Option<AgentIndex> {
        self.moves.iter().map(|record| record.agent).max()
    }

    /// Number of moves recorded for the busiest agent.
    pub(crate) fn longest_script(&self, agent_count: usize) -> usize {
        (0..agent_count)
            .map(|index| {
                self.moves
                    .iter()
                    .filter(|record| record.agent.get() == index)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use maze_chase_core::Direction;

    use super::*;

    #[test]
    fn parses_json_moves() {
        let json = concat!(
            r#"{"moves":[{"agent":0,"direction":"East"},"#,
            r#"{"agent":1,"direction":"West"},"#,
            r#"{"agent":0,"direction":"Stop"}]}"#,
        );
        let history: MoveHistory = serde_json::from_str(json).expect("valid history");

        assert_eq!(history.score, None);
        assert_eq!(
            history.moves[1],
            MoveRecord::new(AgentIndex::new(1), Direction::West)
        );
        assert_eq!(history.highest_agent(), Some(AgentIndex::new(1)));
        assert_eq!(history.longest_script(2), 2);
        assert_eq!(history.longest_script(1), 2);
    }

    #[test]
    fn saved_history_can_be_loaded_again() {
        let path = std::env::temp_dir()
            .join(format!("maze-chase-history-{}.json", std::process::id()));
        let history = MoveHistory {
            moves: vec![MoveRecord::new(AgentIndex::CONTROLLED, Direction::North)],
            score: Some(-1),
        };
        history.save(&path).expect("writable temp dir");
        let loaded = MoveHistory::load(&path).expect("readable history");
        fs::remove_file(&path).expect("temp file removed");
        assert_eq!(loaded, history);
    }
}
