use crate::line_clear::detect_and_clear_lines;
use crate::placement::{place_piece, valid_anchors};
use crate::scoring::ScoreDelta;
use crate::session::{GameSession, PhaseKind, PlacementAttempt};

/// Greedy choice: the legal placement with the highest immediate score.
/// Ties go to the earliest slot, then row, then column. `None` when the
/// session is not accepting placements or nothing fits.
pub fn best_placement(session: &GameSession) -> Option<PlacementAttempt> {
    if session.phase_kind() != PhaseKind::Playing {
        return None;
    }
    let grid = session.grid();
    let mut best: Option<(u32, PlacementAttempt)> = None;
    for (slot, shape) in session
        .pieces()
        .slots()
        .iter()
        .enumerate()
        .filter_map(|(slot, shape)| shape.map(|shape| (slot, shape)))
    {
        for (row, col) in valid_anchors(grid, shape) {
            let Ok((placed, cells)) = place_piece(grid, shape, row, col) else {
                continue;
            };
            let lines = detect_and_clear_lines(&placed).lines();
            let total = ScoreDelta::for_placement(cells, lines).total();
            if best.is_none_or(|(score, _)| total > score) {
                best = Some((total, PlacementAttempt::new(slot, row, col)));
            }
        }
    }
    best.map(|(_, attempt)| attempt)
}
