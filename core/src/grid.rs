//! Fixed-size boolean matrix used for walls and food.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

const CELLS_PER_WORD: usize = 64;

/// Errors raised while editing or reconstituting a [`Grid`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// The addressed cell lies outside the grid.
    #[error("cell {cell} is outside a {width}x{height} grid")]
    OutOfBounds {
        /// Cell that was addressed.
        cell: CellCoord,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
    /// A packed grid carried the wrong number of words for its dimensions.
    #[error("packed grid expects {expected} words, found {actual}")]
    PackedLength {
        /// Words required by the declared dimensions.
        expected: usize,
        /// Words present in the payload.
        actual: usize,
    },
}

/// Two-dimensional boolean matrix addressed `[x][y]` with the origin in the
/// bottom-left corner.
///
/// Cells are stored as a column-major bit set. Dimensions are fixed at
/// construction and bits past the last cell are always zero, so two grids
/// with identical contents have identical storage and hash identically.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl Grid {
    /// Creates a grid with every cell cleared.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            words: vec![0; word_count(width, height)],
        }
    }

    /// Creates a grid with every cell set.
    #[must_use]
    pub fn filled(width: u32, height: u32) -> Self {
        let mut grid = Self::new(width, height);
        for index in 0..grid.cell_count() {
            grid.words[index / CELLS_PER_WORD] |= 1 << (index % CELLS_PER_WORD);
        }
        grid
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.x() < self.width && cell.y() < self.height
    }

    /// Value of the cell at `(x, y)`. Cells outside the grid read as `false`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.is_set(CellCoord::new(x, y))
    }

    /// Value of the provided cell. Cells outside the grid read as `false`.
    #[must_use]
    pub fn is_set(&self, cell: CellCoord) -> bool {
        self.index(cell).map_or(false, |index| {
            self.words[index / CELLS_PER_WORD] & (1 << (index % CELLS_PER_WORD)) != 0
        })
    }

    /// Writes a cell value.
    pub fn set(&mut self, cell: CellCoord, value: bool) -> Result<(), GridError> {
        let index = self.index(cell).ok_or(GridError::OutOfBounds {
            cell,
            width: self.width,
            height: self.height,
        })?;
        let mask = 1 << (index % CELLS_PER_WORD);
        if value {
            self.words[index / CELLS_PER_WORD] |= mask;
        } else {
            self.words[index / CELLS_PER_WORD] &= !mask;
        }
        Ok(())
    }

    /// Number of set cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Set cells in column-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (0..self.width)
            .flat_map(move |x| (0..self.height).map(move |y| CellCoord::new(x, y)))
            .filter(move |cell| self.is_set(*cell))
    }

    /// Canonical compact form: dimensions followed by the packed cell words.
    #[must_use]
    pub fn pack(&self) -> PackedGrid {
        PackedGrid {
            width: self.width,
            height: self.height,
            words: self.words.clone(),
        }
    }

    /// Reconstitutes a grid from its packed form.
    ///
    /// Bits beyond the last cell are discarded so that the result keeps the
    /// canonical storage invariant.
    pub fn from_packed(packed: &PackedGrid) -> Result<Self, GridError> {
        let expected = word_count(packed.width, packed.height);
        if packed.words.len() != expected {
            return Err(GridError::PackedLength {
                expected,
                actual: packed.words.len(),
            });
        }

        let mut grid = Self {
            width: packed.width,
            height: packed.height,
            words: packed.words.clone(),
        };
        let remainder = grid.cell_count() % CELLS_PER_WORD;
        if remainder != 0 {
            if let Some(last) = grid.words.last_mut() {
                *last &= (1 << remainder) - 1;
            }
        }
        Ok(grid)
    }

    fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(cell.x() as usize * self.height as usize + cell.y() as usize)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "T" } else { "F" })?;
            }
            if y != 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Bit-packed representation of a [`Grid`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedGrid {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Column-major cell bits, 64 cells per word, least significant bit first.
    pub words: Vec<u64>,
}

fn word_count(width: u32, height: u32) -> usize {
    (width as usize * height as usize).div_ceil(CELLS_PER_WORD)
}
