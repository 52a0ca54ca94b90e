//! Text display that prints the board to standard output.

use std::io::{self, Write};

use maze_chase_system_scheduler::GameDisplay;
use maze_chase_world::WorldState;
use tracing::debug;

/// Prints the first and last boards of a game, and every board when asked to.
#[derive(Debug)]
pub(crate) struct TerminalDisplay<W> {
    out: W,
    every_move: bool,
    last_board: Option<String>,
}

impl<W: Write> TerminalDisplay<W> {
    pub(crate) fn new(out: W, every_move: bool) -> Self {
        Self {
            out,
            every_move,
            last_board: None,
        }
    }

    fn print(&mut self, board: &str) {
        if let Err(error) = writeln!(self.out, "{board}") {
            debug!(%error, "failed to print board");
        }
    }
}

impl TerminalDisplay<io::Stdout> {
    pub(crate) fn stdout(every_move: bool) -> Self {
        Self::new(io::stdout(), every_move)
    }
}

impl<W: Write> GameDisplay for TerminalDisplay<W> {
    fn initialize(&mut self, state: &WorldState) {
        self.print(&state.to_string());
    }

    fn update(&mut self, state: &WorldState) {
        let board = state.to_string();
        if self.every_move {
            self.print(&board);
        }
        self.last_board = Some(board);
    }

    fn finish(&mut self) {
        if self.every_move {
            return;
        }
        if let Some(board) = self.last_board.take() {
            self.print(&board);
        }
    }
}

#[cfg(test)]
mod tests {
    use maze_chase_core::{AgentIndex, Direction};
    use maze_chase_world::{apply_action, Layout, ScoreTable};

    use super::*;

    #[test]
    fn prints_first_and_final_boards() {
        let layout = Layout::parse(&["P.."]).expect("valid layout");
        let first = WorldState::initial(&layout, 0, ScoreTable::classic());
        let second = apply_action(&first, AgentIndex::CONTROLLED, Direction::East)
            .expect("legal");
        let third = apply_action(&second, AgentIndex::CONTROLLED, Direction::East)
            .expect("legal");

        let mut display = TerminalDisplay::new(Vec::new(), false);
        display.initialize(&first);
        display.update(&second);
        display.update(&third);
        display.finish();

        let printed = String::from_utf8(display.out).expect("utf-8 boards");
        assert_eq!(printed, "<..\nScore: 0\n\n  <\nScore: 518\n\n");
    }
}
