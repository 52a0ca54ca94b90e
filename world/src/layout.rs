//! Static level data used to build the first snapshot.

use std::str::FromStr;

use maze_chase_core::{CellCoord, Grid, GridError, Role};
use thiserror::Error;

/// Reasons an ASCII layout is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout contains no rows or no columns.
    #[error("layout is empty")]
    Empty,
    /// A row's width differs from the first row's.
    #[error("row {row} has {actual} columns, expected {expected}")]
    Ragged {
        /// Zero-based row index counted from the top of the text.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// No controlled agent start was found.
    #[error("layout has no controlled agent start")]
    MissingControlled,
    /// A cell could not be written into the level grids.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// More than one controlled agent start was found.
    #[error("layout has a second controlled agent start at {cell}")]
    DuplicateControlled {
        /// Location of the extra start.
        cell: CellCoord,
    },
}

/// Starting cell and role for one agent slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentStart {
    /// Role the agent plays.
    pub role: Role,
    /// Cell the agent starts on.
    pub cell: CellCoord,
}

/// Walls, food, collectibles and agent starts of a level.
///
/// Agent starts are ordered with the controlled agent first, followed by
/// adversaries: numbered adversaries by their digit, unnumbered ones in the
/// order they appear scanning from the bottom row upward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    walls: Grid,
    food: Grid,
    collectibles: Vec<CellCoord>,
    agent_starts: Vec<AgentStart>,
}

impl Layout {
    /// Parses a layout from its rows, top row first.
    ///
    /// `%` is a wall, `.` food, `o` a collectible, `P` the controlled agent
    /// and `G` or `1`-`4` an adversary. Any other character is open floor.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LayoutError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        if height == 0 || width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut walls = Grid::new(width as u32, height as u32);
        let mut food = Grid::new(width as u32, height as u32);
        let mut collectibles = Vec::new();
        let mut controlled = None;
        let mut adversaries: Vec<(u32, CellCoord)> = Vec::new();
        let mut next_order = 1;

        for (row_index, row) in rows.iter().enumerate() {
            let actual = row.as_ref().chars().count();
            if actual != width {
                return Err(LayoutError::Ragged {
                    row: row_index,
                    expected: width,
                    actual,
                });
            }
        }

        for y in 0..height {
            let row = rows[height - 1 - y].as_ref();
            for (x, symbol) in row.chars().enumerate() {
                let cell = CellCoord::new(x as u32, y as u32);
                match symbol {
                    '%' => walls.set(cell, true)?,
                    '.' => food.set(cell, true)?,
                    'o' => collectibles.push(cell),
                    'P' => {
                        if controlled.is_some() {
                            return Err(LayoutError::DuplicateControlled { cell });
                        }
                        controlled = Some(cell);
                    }
                    'G' => {
                        adversaries.push((next_order, cell));
                        next_order += 1;
                    }
                    '1'..='4' => {
                        let order = symbol.to_digit(10).unwrap_or(0);
                        adversaries.push((order, cell));
                        next_order = next_order.max(order + 1);
                    }
                    _ => {}
                }
            }
        }

        let controlled = controlled.ok_or(LayoutError::MissingControlled)?;
        adversaries.sort_by_key(|(order, _)| *order);

        let mut agent_starts = Vec::with_capacity(adversaries.len() + 1);
        agent_starts.push(AgentStart {
            role: Role::Controlled,
            cell: controlled,
        });
        agent_starts.extend(adversaries.into_iter().map(|(_, cell)| AgentStart {
            role: Role::Adversary,
            cell,
        }));

        Ok(Self {
            walls,
            food,
            collectibles,
            agent_starts,
        })
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.walls.width()
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.walls.height()
    }

    /// Wall cells.
    #[must_use]
    pub fn walls(&self) -> &Grid {
        &self.walls
    }

    /// Initial food cells.
    #[must_use]
    pub fn food(&self) -> &Grid {
        &self.food
    }

    /// Initial collectible cells.
    #[must_use]
    pub fn collectibles(&self) -> &[CellCoord] {
        &self.collectibles
    }

    /// Ordered agent starts, controlled agent first.
    #[must_use]
    pub fn agent_starts(&self) -> &[AgentStart] {
        &self.agent_starts
    }

    /// Number of adversary starts.
    #[must_use]
    pub fn adversary_count(&self) -> usize {
        self.agent_starts.len() - 1
    }

    /// Number of food items at the start of the level.
    #[must_use]
    pub fn total_food(&self) -> usize {
        self.food.count()
    }

    /// Reports whether `cell` is a wall. Cells outside the level are not walls.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.walls.is_set(cell)
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let rows: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect();
        Self::parse(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_flipped_so_origin_is_bottom_left() {
        let layout = Layout::parse(&["%%%%", "%P.%", "%o %", "%%%%"]).expect("valid layout");
        assert_eq!(layout.width(), 4);
        assert_eq!(layout.height(), 4);
        assert!(layout.food().get(2, 2));
        assert_eq!(layout.collectibles(), &[CellCoord::new(1, 1)]);
        assert_eq!(layout.agent_starts()[0].cell, CellCoord::new(1, 2));
        assert!(layout.is_wall(CellCoord::new(0, 0)));
        assert!(!layout.is_wall(CellCoord::new(9, 9)));
    }

    #[test]
    fn adversaries_follow_numbering_then_scan_order() {
        let layout = Layout::parse(&["G 2", " P ", "1 G"]).expect("valid layout");
        let order: Vec<_> = layout
            .agent_starts()
            .iter()
            .map(|start| (start.role, start.cell))
            .collect();
        assert_eq!(
            order,
            vec![
                (Role::Controlled, CellCoord::new(1, 1)),
                (Role::Adversary, CellCoord::new(0, 0)),
                (Role::Adversary, CellCoord::new(2, 0)),
                (Role::Adversary, CellCoord::new(2, 2)),
                (Role::Adversary, CellCoord::new(0, 2)),
            ]
        );
        assert_eq!(layout.adversary_count(), 4);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert_eq!(
            Layout::parse(&["%%%", "%P", "%%%"]),
            Err(LayoutError::Ragged {
                row: 1,
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn controlled_start_is_required_and_unique() {
        assert_eq!(
            Layout::parse(&["..."]),
            Err(LayoutError::MissingControlled)
        );
        assert_eq!(
            Layout::parse(&["P.P"]),
            Err(LayoutError::DuplicateControlled {
                cell: CellCoord::new(2, 0)
            })
        );
    }

    #[test]
    fn parses_from_multiline_text() {
        let layout: Layout = "%%%\n%P%\n%%%\n".parse().expect("valid layout");
        assert_eq!(layout.total_food(), 0);
        assert_eq!(layout.adversary_count(), 0);
    }
}
