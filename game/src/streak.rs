use serde::{Deserialize, Serialize};

use crate::difficulty::{Difficulty, DifficultyMode};

/// Consecutive-correct-answer tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub current: u32,
    pub best: u32,
}

impl Streak {
    fn hit(self) -> Self {
        let current = self.current.saturating_add(1);
        Self {
            current,
            best: self.best.max(current),
        }
    }

    fn miss(self) -> Self {
        Self {
            current: 0,
            best: self.best,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub bonus: u32,
    pub difficulty: Difficulty,
    pub streak: Streak,
}

/// Converts one correctness signal into a bonus, the next difficulty, and
/// the next streak. Fixed modes never change difficulty.
pub fn resolve_answer(
    correct: bool,
    mode: DifficultyMode,
    difficulty: Difficulty,
    streak: Streak,
    correct_bonus: u32,
) -> AnswerOutcome {
    if correct {
        AnswerOutcome {
            correct,
            bonus: correct_bonus,
            difficulty: if mode.is_adaptive() {
                difficulty.step_up()
            } else {
                difficulty
            },
            streak: streak.hit(),
        }
    } else {
        AnswerOutcome {
            correct,
            bonus: 0,
            difficulty: if mode.is_adaptive() {
                Difficulty::Easy
            } else {
                difficulty
            },
            streak: streak.miss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_ramp_climbs_and_resets() {
        let mut difficulty = Difficulty::Easy;
        let mut streak = Streak::default();
        for expected in [Difficulty::Medium, Difficulty::Hard, Difficulty::Hard] {
            let out = resolve_answer(true, DifficultyMode::Adaptive, difficulty, streak, 100);
            assert_eq!(out.bonus, 100);
            assert_eq!(out.difficulty, expected);
            difficulty = out.difficulty;
            streak = out.streak;
        }
        assert_eq!(streak, Streak { current: 3, best: 3 });

        let out = resolve_answer(false, DifficultyMode::Adaptive, difficulty, streak, 100);
        assert_eq!(out.bonus, 0);
        assert_eq!(out.difficulty, Difficulty::Easy);
        assert_eq!(out.streak, Streak { current: 0, best: 3 });
    }

    #[test]
    fn fixed_mode_keeps_difficulty() {
        let mode = DifficultyMode::Fixed(Difficulty::Medium);
        let up = resolve_answer(true, mode, Difficulty::Medium, Streak::default(), 50);
        assert_eq!(up.difficulty, Difficulty::Medium);
        assert_eq!(up.bonus, 50);
        let down = resolve_answer(false, mode, Difficulty::Medium, up.streak, 50);
        assert_eq!(down.difficulty, Difficulty::Medium);
        assert_eq!(down.streak.best, 1);
    }
}
