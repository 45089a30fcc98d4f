use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GridPatternError;

pub const GRID_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Occupied,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    pub fn is_occupied(self) -> bool {
        self == Cell::Occupied
    }
}

/// Fixed `GRID_SIZE`×`GRID_SIZE` occupancy matrix, addressed as `[row][col]`
/// with row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    cells: [[Cell; GRID_SIZE]; GRID_SIZE],
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

pub fn create_empty_grid() -> Grid {
    Grid::empty()
}

impl Grid {
    pub const fn empty() -> Self {
        Self {
            cells: [[Cell::Empty; GRID_SIZE]; GRID_SIZE],
        }
    }

    pub fn full() -> Self {
        Self {
            cells: [[Cell::Occupied; GRID_SIZE]; GRID_SIZE],
        }
    }

    /// Builds a grid from text rows: `#` (or `X`) is occupied, `.` is empty.
    /// Missing rows and columns are empty.
    pub fn from_pattern(rows: &[&str]) -> Result<Self, GridPatternError> {
        if rows.len() > GRID_SIZE {
            return Err(GridPatternError::TooManyRows(rows.len()));
        }
        let mut grid = Self::empty();
        for (r, line) in rows.iter().enumerate() {
            let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if chars.len() > GRID_SIZE {
                return Err(GridPatternError::RowTooLong {
                    row: r,
                    len: chars.len(),
                });
            }
            for (c, ch) in chars.into_iter().enumerate() {
                grid.cells[r][c] = match ch {
                    '#' | 'X' => Cell::Occupied,
                    '.' => Cell::Empty,
                    other => {
                        return Err(GridPatternError::UnknownCell {
                            row: r,
                            col: c,
                            ch: other,
                        });
                    }
                };
            }
        }
        Ok(grid)
    }

    /// Returns a copy with one cell replaced. Out-of-range coordinates are ignored.
    pub fn with_cell(mut self, row: usize, col: usize, cell: Cell) -> Self {
        if row < GRID_SIZE && col < GRID_SIZE {
            self.cells[row][col] = cell;
        }
        self
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Signed lookup; anything off the grid is `None`.
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.cell(row as usize, col as usize)
    }

    pub(crate) fn occupy(&mut self, row: usize, col: usize) {
        self.cells[row][col] = Cell::Occupied;
    }

    pub(crate) fn vacate(&mut self, row: usize, col: usize) {
        self.cells[row][col] = Cell::Empty;
    }

    pub fn rows(&self) -> &[[Cell; GRID_SIZE]; GRID_SIZE] {
        &self.cells
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells
            .get(row)
            .is_some_and(|r| r.iter().all(|c| c.is_occupied()))
    }

    pub fn is_col_full(&self, col: usize) -> bool {
        col < GRID_SIZE && self.cells.iter().all(|r| r[col].is_occupied())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|r| r.iter())
            .filter(|c| c.is_occupied())
            .count()
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..GRID_SIZE)
            .flat_map(|r| (0..GRID_SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[r][c].is_empty())
    }

    /// `0`/`1` rows for tooling that wants plain numbers.
    pub fn to_u8_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .iter()
            .map(|r| r.iter().map(|c| u8::from(c.is_occupied())).collect())
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  ")?;
        for c in 0..GRID_SIZE {
            write!(f, "{c}")?;
        }
        writeln!(f)?;
        for (r, row) in self.cells.iter().enumerate() {
            write!(f, "{r} ")?;
            for cell in row {
                f.write_str(if cell.is_occupied() { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
