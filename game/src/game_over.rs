use crate::grid::Grid;
use crate::placement::has_any_valid_move;
use crate::shapes::Shape;

/// True only when none of `shapes` fits anywhere on `grid`. An empty list is
/// never game over: the set is about to be replenished.
pub fn is_game_over<I>(grid: &Grid, shapes: I) -> bool
where
    I: IntoIterator<Item = Shape>,
{
    let mut any_shape = false;
    for shape in shapes {
        any_shape = true;
        if has_any_valid_move(grid, shape) {
            return false;
        }
    }
    any_shape
}
