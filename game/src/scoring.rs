use serde::{Deserialize, Serialize};

/// Bonus by number of lines cleared in one placement; zero past the end.
pub const LINE_BONUS_TABLE: [u32; 11] = [0, 10, 30, 60, 100, 150, 200, 250, 300, 400, 500];
pub const COMBO_BONUS_PER_EXTRA_LINE: u32 = 10;
pub const CORRECT_ANSWER_BONUS_DEFAULT: u32 = 100;

pub fn line_bonus(lines: u32) -> u32 {
    LINE_BONUS_TABLE.get(lines as usize).copied().unwrap_or(0)
}

pub fn combo_bonus(lines: u32) -> u32 {
    if lines > 1 {
        (lines - 1).saturating_mul(COMBO_BONUS_PER_EXTRA_LINE)
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub cells: u32,
    pub lines: u32,
    pub line_bonus: u32,
    pub combo_bonus: u32,
}

impl ScoreDelta {
    pub fn for_placement(cells: u32, lines: u32) -> Self {
        Self {
            cells,
            lines,
            line_bonus: line_bonus(lines),
            combo_bonus: combo_bonus(lines),
        }
    }

    pub fn total(&self) -> u32 {
        self.cells
            .saturating_add(self.line_bonus)
            .saturating_add(self.combo_bonus)
    }
}
