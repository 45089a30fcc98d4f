use crate::error::PlacementError;
use crate::grid::{GRID_SIZE, Grid};
use crate::shapes::Shape;

/// Checks every filled cell of `shape`, offset by `(row, col)`, and reports the
/// first reason the move is illegal.
pub fn check_move(grid: &Grid, shape: Shape, row: i32, col: i32) -> Result<(), PlacementError> {
    let mut overlaps = false;
    for (r, c) in shape.filled_cells() {
        let target_row = row + r as i32;
        let target_col = col + c as i32;
        match grid.get(target_row, target_col) {
            None => return Err(PlacementError::OutOfBounds),
            Some(cell) if cell.is_occupied() => overlaps = true,
            Some(_) => {}
        }
    }
    if overlaps {
        return Err(PlacementError::Occupied);
    }
    Ok(())
}

/// The single legality check used by both placement and the game-over scan.
pub fn is_valid_move(grid: &Grid, shape: Shape, row: i32, col: i32) -> bool {
    check_move(grid, shape, row, col).is_ok()
}

/// Writes `shape` into a copy of `grid` and returns it with the number of
/// cells filled. The input grid is untouched when the move is illegal.
pub fn place_piece(
    grid: &Grid,
    shape: Shape,
    row: i32,
    col: i32,
) -> Result<(Grid, u32), PlacementError> {
    check_move(grid, shape, row, col)?;

    let mut next = *grid;
    let mut filled = 0u32;
    for (r, c) in shape.filled_cells() {
        let target_row = (row as usize) + r;
        let target_col = (col as usize) + c;
        debug_assert!(target_row < GRID_SIZE && target_col < GRID_SIZE);
        next.occupy(target_row, target_col);
        filled += 1;
    }
    Ok((next, filled))
}

/// Every top-left anchor at which `shape` fits.
pub fn valid_anchors(grid: &Grid, shape: Shape) -> impl Iterator<Item = (i32, i32)> + '_ {
    let n = GRID_SIZE as i32;
    (0..n)
        .flat_map(move |r| (0..n).map(move |c| (r, c)))
        .filter(move |&(r, c)| is_valid_move(grid, shape, r, c))
}

pub fn has_any_valid_move(grid: &Grid, shape: Shape) -> bool {
    valid_anchors(grid, shape).next().is_some()
}
