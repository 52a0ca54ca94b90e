//! Pure movement rules shared by the world and by agents.
//!
//! Nothing in this module touches world state; every function is a mapping
//! over its inputs.

use crate::{CellCoord, Configuration, Direction, Grid, Position};

/// Largest Manhattan offset from a lattice point that still counts as centred.
pub const TOLERANCE: f64 = 0.001;

/// Maps a movement vector to the direction of its dominant component.
///
/// Ties between equally large components resolve to the vertical axis and a
/// zero vector maps to [`Direction::Stop`].
#[must_use]
pub fn vector_to_direction((dx, dy): (f64, f64)) -> Direction {
    if dy != 0.0 && dy.abs() >= dx.abs() {
        return if dy > 0.0 {
            Direction::North
        } else {
            Direction::South
        };
    }
    if dx > 0.0 {
        Direction::East
    } else if dx < 0.0 {
        Direction::West
    } else {
        Direction::Stop
    }
}

/// Movement vector for `direction`, scaled by `speed`.
#[must_use]
pub fn direction_to_vector(direction: Direction, speed: f64) -> (f64, f64) {
    let (dx, dy) = unit_vector(direction);
    (dx * speed, dy * speed)
}

/// Position reached by taking one unit step in `direction`.
#[must_use]
pub fn successor(position: Position, direction: Direction) -> Position {
    position.translated(direction_to_vector(direction, 1.0))
}

/// In-bounds, wall-free cells adjacent to the cell nearest `position`.
#[must_use]
pub fn legal_neighbors(position: Position, walls: &Grid) -> Vec<CellCoord> {
    let anchor = position.nearest_point();
    Direction::CARDINALS
        .iter()
        .filter_map(|direction| neighbor(anchor, *direction, walls))
        .filter(|cell| !walls.is_set(*cell))
        .collect()
}

/// Directions the agent described by `configuration` may take.
///
/// An agent that is not centred on a cell must keep its current heading.
/// Otherwise every direction whose target cell is inside the grid and free
/// of walls is possible, including [`Direction::Stop`].
#[must_use]
pub fn possible_directions(configuration: &Configuration, walls: &Grid) -> Vec<Direction> {
    let position = configuration.position();
    let anchor = position.nearest_point();
    if position.manhattan_distance(anchor) > TOLERANCE {
        return vec![configuration.direction()];
    }

    Direction::ALL
        .iter()
        .copied()
        .filter(|direction| {
            neighbor(anchor, *direction, walls).is_some_and(|cell| !walls.is_set(cell))
        })
        .collect()
}

fn unit_vector(direction: Direction) -> (f64, f64) {
    match direction {
        Direction::North => (0.0, 1.0),
        Direction::South => (0.0, -1.0),
        Direction::East => (1.0, 0.0),
        Direction::West => (-1.0, 0.0),
        Direction::Stop => (0.0, 0.0),
    }
}

fn neighbor(anchor: Position, direction: Direction, walls: &Grid) -> Option<CellCoord> {
    let cell = successor(anchor, direction).nearest_cell()?;
    walls.contains(cell).then_some(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walls_with(width: u32, height: u32, blocked: &[(u32, u32)]) -> Grid {
        let mut walls = Grid::new(width, height);
        for (x, y) in blocked {
            walls.set(CellCoord::new(*x, *y), true).expect("in bounds");
        }
        walls
    }

    #[test]
    fn vectors_map_to_dominant_direction() {
        assert_eq!(vector_to_direction((0.0, 0.0)), Direction::Stop);
        assert_eq!(vector_to_direction((0.0, 2.0)), Direction::North);
        assert_eq!(vector_to_direction((0.0, -0.5)), Direction::South);
        assert_eq!(vector_to_direction((3.0, 1.0)), Direction::East);
        assert_eq!(vector_to_direction((-3.0, 1.0)), Direction::West);
        assert_eq!(vector_to_direction((1.0, -1.0)), Direction::South);
    }

    #[test]
    fn direction_vectors_invert() {
        for direction in Direction::ALL {
            let vector = direction_to_vector(direction, 0.5);
            assert_eq!(vector_to_direction(vector), direction);
        }
        assert_eq!(direction_to_vector(Direction::West, 2.0), (-2.0, 0.0));
    }

    #[test]
    fn neighbors_respect_bounds_and_walls() {
        let walls = walls_with(3, 3, &[(1, 2)]);
        let neighbors = legal_neighbors(Position::new(1.0, 1.0), &walls);
        assert_eq!(
            neighbors,
            vec![
                CellCoord::new(1, 0),
                CellCoord::new(2, 1),
                CellCoord::new(0, 1)
            ]
        );

        let corner = legal_neighbors(Position::new(0.2, 0.1), &walls);
        assert_eq!(corner, vec![CellCoord::new(0, 1), CellCoord::new(1, 0)]);
    }

    #[test]
    fn centred_agent_may_take_any_open_direction() {
        let walls = walls_with(3, 3, &[(2, 1)]);
        let configuration = Configuration::new(Position::new(1.0, 1.0), Direction::Stop);
        assert_eq!(
            possible_directions(&configuration, &walls),
            vec![
                Direction::North,
                Direction::South,
                Direction::West,
                Direction::Stop
            ]
        );
    }

    #[test]
    fn mid_cell_agent_must_continue() {
        let walls = Grid::new(4, 1);
        let configuration = Configuration::new(Position::new(1.5, 0.0), Direction::East);
        assert_eq!(
            possible_directions(&configuration, &walls),
            vec![Direction::East]
        );
    }

    #[test]
    fn near_lattice_positions_count_as_centred() {
        let walls = Grid::new(3, 1);
        let configuration = Configuration::new(Position::new(1.0005, 0.0), Direction::East);
        assert!(possible_directions(&configuration, &walls).contains(&Direction::West));
    }
}
