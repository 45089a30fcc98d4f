use blockquiz::game_over::is_game_over;
use blockquiz::grid::{Cell, GRID_SIZE, Grid};
use blockquiz::line_clear::detect_and_clear_lines;
use blockquiz::placement::{is_valid_move, place_piece};
use blockquiz::question::Question;
use blockquiz::scoring::ScoreDelta;
use blockquiz::session::{GameSession, PhaseKind, SessionConfig, SessionEvent};
use blockquiz::Shape;

const CORNER: usize = 3;

fn corner_pattern(bits: u32) -> Grid {
    let mut grid = Grid::empty();
    for i in 0..CORNER * CORNER {
        if bits & (1 << i) != 0 {
            grid = grid.with_cell(i / CORNER, i % CORNER, Cell::Occupied);
        }
    }
    grid
}

fn expected_valid(grid: &Grid, shape: Shape, row: i32, col: i32) -> bool {
    let m = shape.matrix();
    for r in 0..m.rows() {
        for c in 0..m.cols() {
            if !m.is_filled(r, c) {
                continue;
            }
            let tr = row + r as i32;
            let tc = col + c as i32;
            if tr < 0 || tc < 0 || tr >= GRID_SIZE as i32 || tc >= GRID_SIZE as i32 {
                return false;
            }
            if grid.cell(tr as usize, tc as usize) != Some(Cell::Empty) {
                return false;
            }
        }
    }
    true
}

#[test]
fn validator_matches_definition_on_every_corner_pattern() {
    for bits in 0..(1u32 << (CORNER * CORNER)) {
        let grid = corner_pattern(bits);
        for shape in Shape::ALL {
            for row in -2..5 {
                for col in -2..5 {
                    assert_eq!(
                        is_valid_move(&grid, shape, row, col),
                        expected_valid(&grid, shape, row, col),
                        "pattern {bits:#011b} shape {shape:?} at ({row},{col})"
                    );
                }
            }
        }
    }
    for shape in Shape::ALL {
        assert!(!is_valid_move(&Grid::empty(), shape, 0, GRID_SIZE as i32));
        assert!(!is_valid_move(&Grid::empty(), shape, GRID_SIZE as i32, 0));
    }
}

#[test]
fn committer_only_fills_targeted_cells() {
    let base = Grid::from_pattern(&["#.#.#.#.#.", "", "...##....."]).unwrap();
    for shape in Shape::ALL {
        for row in 0..GRID_SIZE as i32 {
            for col in 0..GRID_SIZE as i32 {
                if !is_valid_move(&base, shape, row, col) {
                    assert!(place_piece(&base, shape, row, col).is_err());
                    continue;
                }
                let (next, filled) = place_piece(&base, shape, row, col).unwrap();
                assert_eq!(filled, shape.cell_count());
                assert_eq!(
                    next.occupied_count(),
                    base.occupied_count() + shape.cell_count() as usize
                );
                for r in 0..GRID_SIZE {
                    for c in 0..GRID_SIZE {
                        if base.cell(r, c) == Some(Cell::Occupied) {
                            assert_eq!(next.cell(r, c), Some(Cell::Occupied));
                        }
                    }
                }
                for (r, c) in shape.filled_cells() {
                    assert_eq!(
                        next.cell(row as usize + r, col as usize + c),
                        Some(Cell::Occupied)
                    );
                }
            }
        }
    }
}

#[test]
fn clear_detection_is_idempotent() {
    let grid = Grid::from_pattern(&[
        "##########",
        "#.........",
        "#.........",
        "#.........",
        "#.........",
        "#.........",
        "#.........",
        "#.........",
        "#.........",
        "#########.",
    ])
    .unwrap();
    let first = detect_and_clear_lines(&grid);
    assert_eq!(first.rows, vec![0]);
    assert_eq!(first.cols, vec![0]);
    let second = detect_and_clear_lines(&first.grid);
    assert!(second.is_empty());
    assert_eq!(second.cells_cleared, 0);
    assert_eq!(second.grid, first.grid);
}

#[test]
fn filling_the_last_row_one_cell_at_a_time_clears_it() {
    let row = 4;
    // A second empty row keeps every column short while row 4 fills.
    let mut grid = Grid::full();
    for col in 0..GRID_SIZE {
        grid = grid
            .with_cell(row, col, Cell::Empty)
            .with_cell(row + 1, col, Cell::Empty);
    }

    for col in 0..GRID_SIZE {
        let (placed, filled) = place_piece(&grid, Shape::Single, row as i32, col as i32).unwrap();
        assert_eq!(filled, 1);
        let clear = detect_and_clear_lines(&placed);
        if col + 1 < GRID_SIZE {
            assert!(clear.is_empty(), "cleared early at col {col}");
        } else {
            assert_eq!(clear.rows, vec![row]);
            assert!(clear.cols.is_empty());
        }
        grid = clear.grid;
    }
}

#[test]
fn score_is_the_running_sum_of_placement_deltas() {
    let wrong = Question {
        question: "pick b".to_string(),
        options: vec!["a".to_string(), "b".to_string()],
        answer: "b".to_string(),
    };
    let mut session = GameSession::new_game(SessionConfig {
        seed: 2024,
        ..SessionConfig::default()
    })
    .start()
    .session;
    let mut expected = 0u32;
    let mut previous = 0u32;

    for _ in 0..80 {
        if session.phase_kind() != PhaseKind::Playing {
            break;
        }
        let Some(attempt) = blockquiz::bot::best_placement(&session) else {
            break;
        };
        let transition = session.apply_placement(attempt).unwrap();
        for event in &transition.events {
            if let SessionEvent::PiecePlaced { delta, .. } = event {
                expected += delta.total();
            }
        }
        session = transition.session;
        if session.phase_kind() == PhaseKind::AwaitingQuestion {
            session = session.deliver_question(Ok(wrong.clone())).unwrap().session;
            session = session.apply_answer("a").unwrap().session;
        }
        assert!(session.score() >= previous);
        assert_eq!(session.score(), expected);
        previous = session.score();
    }
    assert!(session.stats().pieces_placed > 0);
}

#[test]
fn game_over_with_one_hole() {
    let grid = Grid::full().with_cell(5, 5, Cell::Empty);
    assert!(is_game_over(&grid, [Shape::DominoH, Shape::I4H, Shape::Square2]));
    assert!(!is_game_over(&grid, [Shape::DominoH, Shape::Single]));
}

#[test]
fn horizontal_i_on_empty_grid_scores_four() {
    let (grid, filled) = place_piece(&Grid::empty(), Shape::I4H, 0, 0).unwrap();
    assert_eq!(filled, 4);
    for col in 0..4 {
        assert_eq!(grid.cell(0, col), Some(Cell::Occupied));
    }
    let clear = detect_and_clear_lines(&grid);
    assert_eq!(clear.lines(), 0);
    assert_eq!(ScoreDelta::for_placement(filled, clear.lines()).total(), 4);
}

#[test]
fn completing_row_three_scores_eleven_and_empties_it() {
    let grid = Grid::from_pattern(&["", "", "", "#######.##"]).unwrap();
    let (placed, filled) = place_piece(&grid, Shape::Single, 3, 7).unwrap();
    let clear = detect_and_clear_lines(&placed);
    assert_eq!(clear.lines(), 1);
    let delta = ScoreDelta::for_placement(filled, clear.lines());
    assert_eq!(delta.combo_bonus, 0);
    assert_eq!(delta.total(), 11);
    assert!((0..GRID_SIZE).all(|c| clear.grid.cell(3, c) == Some(Cell::Empty)));
}

#[test]
fn row_and_column_through_one_cell_clear_nineteen() {
    let mut grid = Grid::empty();
    for i in 0..GRID_SIZE {
        if i != 6 {
            grid = grid.with_cell(2, i, Cell::Occupied);
        }
        if i != 2 {
            grid = grid.with_cell(i, 6, Cell::Occupied);
        }
    }
    assert_eq!(grid.cell(2, 6), Some(Cell::Empty));
    let (placed, filled) = place_piece(&grid, Shape::Single, 2, 6).unwrap();
    let clear = detect_and_clear_lines(&placed);
    assert_eq!(clear.lines(), 2);
    assert_eq!(clear.cells_cleared, 19);
    let delta = ScoreDelta::for_placement(filled, clear.lines());
    assert_eq!(delta.combo_bonus, 10);
    assert_eq!(delta.total(), 1 + 30 + 10);
    assert_eq!(clear.grid.occupied_count(), 0);
}
