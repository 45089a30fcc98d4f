use serde::{Deserialize, Serialize};

/// Largest catalog matrix side; matrices are stored in a fixed 5×5 buffer.
pub const MAX_SHAPE_SIDE: usize = 5;

/// The closed catalog of placeable pieces. Shapes never rotate; each
/// orientation is its own entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Shape {
    Single,
    DominoH,
    DominoV,
    I3H,
    I3V,
    I4H,
    I4V,
    I5H,
    I5V,
    Square2,
    Square3,
    CornerTL,
    CornerTR,
    CornerBL,
    CornerBR,
    LUp,
    LDown,
    JUp,
    JDown,
    TUp,
    TDown,
    S,
    Z,
}

impl Shape {
    pub const ALL: [Shape; 23] = [
        Shape::Single,
        Shape::DominoH,
        Shape::DominoV,
        Shape::I3H,
        Shape::I3V,
        Shape::I4H,
        Shape::I4V,
        Shape::I5H,
        Shape::I5V,
        Shape::Square2,
        Shape::Square3,
        Shape::CornerTL,
        Shape::CornerTR,
        Shape::CornerBL,
        Shape::CornerBR,
        Shape::LUp,
        Shape::LDown,
        Shape::JUp,
        Shape::JDown,
        Shape::TUp,
        Shape::TDown,
        Shape::S,
        Shape::Z,
    ];

    pub fn all() -> Vec<Shape> {
        Self::ALL.to_vec()
    }

    pub const fn matrix(self) -> ShapeMatrix {
        base_shape_matrix(self)
    }

    /// `(row, col)` offsets of every filled cell, relative to the top-left corner.
    pub fn filled_cells(self) -> impl Iterator<Item = (usize, usize)> {
        let m = self.matrix();
        (0..m.rows())
            .flat_map(move |r| (0..m.cols()).map(move |c| (r, c)))
            .filter(move |&(r, c)| m.is_filled(r, c))
    }

    pub fn cell_count(self) -> u32 {
        self.matrix().filled_count()
    }

    pub fn width(self) -> usize {
        self.matrix().cols()
    }

    pub fn height(self) -> usize {
        self.matrix().rows()
    }

    pub fn label(self) -> &'static str {
        match self {
            Shape::Single => "1x1",
            Shape::DominoH => "I2-H",
            Shape::DominoV => "I2-V",
            Shape::I3H => "I3-H",
            Shape::I3V => "I3-V",
            Shape::I4H => "I4-H",
            Shape::I4V => "I4-V",
            Shape::I5H => "I5-H",
            Shape::I5V => "I5-V",
            Shape::Square2 => "O2",
            Shape::Square3 => "O3",
            Shape::CornerTL => "corner-TL",
            Shape::CornerTR => "corner-TR",
            Shape::CornerBL => "corner-BL",
            Shape::CornerBR => "corner-BR",
            Shape::LUp => "L",
            Shape::LDown => "L-flipped",
            Shape::JUp => "J",
            Shape::JDown => "J-flipped",
            Shape::TUp => "T",
            Shape::TDown => "T-flipped",
            Shape::S => "S",
            Shape::Z => "Z",
        }
    }

    /// Text rows for terminal previews, `#` for filled cells.
    pub fn preview_lines(self) -> Vec<String> {
        let m = self.matrix();
        (0..m.rows())
            .map(|r| {
                (0..m.cols())
                    .map(|c| if m.is_filled(r, c) { '#' } else { ' ' })
                    .collect()
            })
            .collect()
    }

    /// Relative draw weight when replenishing the piece set.
    pub fn default_weight(self) -> u32 {
        match self {
            Shape::Single => 6,
            Shape::DominoH | Shape::DominoV => 8,
            Shape::I3H | Shape::I3V => 8,
            Shape::Square2 => 8,
            Shape::I4H | Shape::I4V => 6,
            Shape::CornerTL | Shape::CornerTR | Shape::CornerBL | Shape::CornerBR => 5,
            Shape::LUp | Shape::LDown | Shape::JUp | Shape::JDown => 4,
            Shape::TUp | Shape::TDown => 4,
            Shape::I5H | Shape::I5V | Shape::Square3 => 3,
            Shape::S | Shape::Z => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMatrix {
    rows: usize,
    cols: usize,
    cells: [u8; MAX_SHAPE_SIDE * MAX_SHAPE_SIDE],
}

impl ShapeMatrix {
    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.rows && col < self.cols);
        self.cells[row * self.cols + col] == 1
    }

    pub fn filled_count(&self) -> u32 {
        self.cells[..self.rows * self.cols]
            .iter()
            .filter(|&&v| v == 1)
            .count() as u32
    }
}

const fn matrix(rows: usize, cols: usize, pattern: &[u8]) -> ShapeMatrix {
    assert!(rows <= MAX_SHAPE_SIDE && cols <= MAX_SHAPE_SIDE);
    assert!(pattern.len() == rows * cols);
    let mut cells = [0u8; MAX_SHAPE_SIDE * MAX_SHAPE_SIDE];
    let mut i = 0;
    while i < pattern.len() {
        cells[i] = pattern[i];
        i += 1;
    }
    ShapeMatrix { rows, cols, cells }
}

const fn base_shape_matrix(shape: Shape) -> ShapeMatrix {
    match shape {
        Shape::Single => matrix(1, 1, &[1]),
        Shape::DominoH => matrix(1, 2, &[1, 1]),
        Shape::DominoV => matrix(2, 1, &[1, 1]),
        Shape::I3H => matrix(1, 3, &[1, 1, 1]),
        Shape::I3V => matrix(3, 1, &[1, 1, 1]),
        Shape::I4H => matrix(1, 4, &[1, 1, 1, 1]),
        Shape::I4V => matrix(4, 1, &[1, 1, 1, 1]),
        Shape::I5H => matrix(1, 5, &[1, 1, 1, 1, 1]),
        Shape::I5V => matrix(5, 1, &[1, 1, 1, 1, 1]),
        Shape::Square2 => matrix(
            2,
            2,
            &[
                1, 1, //
                1, 1, //
            ],
        ),
        Shape::Square3 => matrix(
            3,
            3,
            &[
                1, 1, 1, //
                1, 1, 1, //
                1, 1, 1, //
            ],
        ),
        Shape::CornerTL => matrix(
            2,
            2,
            &[
                1, 1, //
                1, 0, //
            ],
        ),
        Shape::CornerTR => matrix(
            2,
            2,
            &[
                1, 1, //
                0, 1, //
            ],
        ),
        Shape::CornerBL => matrix(
            2,
            2,
            &[
                1, 0, //
                1, 1, //
            ],
        ),
        Shape::CornerBR => matrix(
            2,
            2,
            &[
                0, 1, //
                1, 1, //
            ],
        ),
        Shape::LUp => matrix(
            3,
            2,
            &[
                1, 0, //
                1, 0, //
                1, 1, //
            ],
        ),
        Shape::LDown => matrix(
            3,
            2,
            &[
                1, 1, //
                0, 1, //
                0, 1, //
            ],
        ),
        Shape::JUp => matrix(
            3,
            2,
            &[
                0, 1, //
                0, 1, //
                1, 1, //
            ],
        ),
        Shape::JDown => matrix(
            3,
            2,
            &[
                1, 1, //
                1, 0, //
                1, 0, //
            ],
        ),
        Shape::TUp => matrix(
            2,
            3,
            &[
                0, 1, 0, //
                1, 1, 1, //
            ],
        ),
        Shape::TDown => matrix(
            2,
            3,
            &[
                1, 1, 1, //
                0, 1, 0, //
            ],
        ),
        Shape::S => matrix(
            2,
            3,
            &[
                0, 1, 1, //
                1, 1, 0, //
            ],
        ),
        Shape::Z => matrix(
            2,
            3,
            &[
                1, 1, 0, //
                0, 1, 1, //
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalog_contains_a_single_cell_shape() {
        let single = Shape::ALL
            .iter()
            .filter(|s| s.cell_count() == 1)
            .collect::<Vec<_>>();
        assert_eq!(single, vec![&Shape::Single]);
        assert_eq!(Shape::Single.width(), 1);
        assert_eq!(Shape::Single.height(), 1);
    }

    #[test]
    fn i4_horizontal_is_one_by_four() {
        let m = Shape::I4H.matrix();
        assert_eq!((m.rows(), m.cols()), (1, 4));
        assert_eq!(
            Shape::I4H.filled_cells().collect::<Vec<_>>(),
            vec![(0, 0), (0, 1), (0, 2), (0, 3)]
        );
    }

    #[test]
    fn every_shape_has_filled_top_row_and_left_column() {
        // Anchoring at the top-left means no fully blank leading row/column.
        for shape in Shape::ALL {
            let m = shape.matrix();
            assert!(
                (0..m.cols()).any(|c| m.is_filled(0, c)),
                "{shape:?} has blank first row"
            );
            assert!(
                (0..m.rows()).any(|r| m.is_filled(r, 0)),
                "{shape:?} has blank first column"
            );
        }
    }

    #[test]
    fn matrices_are_unique_and_weights_positive() {
        let mut seen = HashSet::new();
        for shape in Shape::ALL {
            let cells: Vec<_> = shape.filled_cells().collect();
            assert!(seen.insert(cells), "{shape:?} duplicates another shape");
            assert!(shape.default_weight() > 0);
        }
        assert_eq!(Shape::all().len(), Shape::ALL.len());
    }

    #[test]
    fn preview_matches_matrix() {
        assert_eq!(Shape::TUp.preview_lines(), vec![" # ", "###"]);
        assert_eq!(Shape::Square3.cell_count(), 9);
    }
}
