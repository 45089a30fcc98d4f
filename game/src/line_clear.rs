use serde::{Deserialize, Serialize};

use crate::grid::{GRID_SIZE, Grid};

/// Result of one clear pass. `rows` and `cols` are the lines that were full
/// before the pass; `cells_cleared` counts intersections once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineClear {
    pub grid: Grid,
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub cells_cleared: u32,
}

impl LineClear {
    pub fn lines(&self) -> u32 {
        (self.rows.len() + self.cols.len()) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }
}

/// Finds every full row and column on `grid` and empties all of them at once.
pub fn detect_and_clear_lines(grid: &Grid) -> LineClear {
    let rows: Vec<usize> = (0..GRID_SIZE).filter(|&r| grid.is_row_full(r)).collect();
    let cols: Vec<usize> = (0..GRID_SIZE).filter(|&c| grid.is_col_full(c)).collect();

    let mut next = *grid;
    let mut cells_cleared = 0u32;
    for r in 0..GRID_SIZE {
        for c in 0..GRID_SIZE {
            if !(rows.contains(&r) || cols.contains(&c)) {
                continue;
            }
            if next.cell(r, c).is_some_and(|cell| cell.is_occupied()) {
                next.vacate(r, c);
                cells_cleared += 1;
            }
        }
    }

    LineClear {
        grid: next,
        rows,
        cols,
        cells_cleared,
    }
}
