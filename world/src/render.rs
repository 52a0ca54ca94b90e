//! Plain-text board rendering.

use std::fmt;

use maze_chase_core::{Direction, Role};

use crate::WorldState;

const WALL: char = '%';
const FOOD: char = '.';
const COLLECTIBLE: char = 'o';
const ADVERSARY: char = 'G';
const FLOOR: char = ' ';

fn controlled_glyph(direction: Direction) -> char {
    match direction {
        Direction::North => 'v',
        Direction::South => '^',
        Direction::West => '>',
        _ => '<',
    }
}

impl WorldState {
    fn glyphs(&self) -> Vec<Vec<char>> {
        let width = self.walls().width() as usize;
        let height = self.walls().height() as usize;
        let mut rows = vec![vec![FLOOR; width]; height];

        for cell in self.walls().cells() {
            rows[cell.y() as usize][cell.x() as usize] = WALL;
        }
        for cell in self.food().cells() {
            rows[cell.y() as usize][cell.x() as usize] = FOOD;
        }
        for agent in self.agent_states() {
            let Some(cell) = agent.position().nearest_point().nearest_cell() else {
                continue;
            };
            if !self.walls().contains(cell) {
                continue;
            }
            rows[cell.y() as usize][cell.x() as usize] = match agent.role() {
                Role::Controlled => controlled_glyph(agent.direction()),
                Role::Adversary => ADVERSARY,
            };
        }
        for cell in self.collectibles().iter().filter(|cell| self.walls().contains(**cell)) {
            rows[cell.y() as usize][cell.x() as usize] = COLLECTIBLE;
        }
        rows
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.glyphs().iter().rev() {
            let line: String = row.iter().collect();
            writeln!(f, "{line}")?;
        }
        write!(f, "Score: {}", self.score())?;
        writeln!(f)
    }
}
