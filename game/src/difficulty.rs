use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// One step harder, saturating at `Hard`.
    pub fn step_up(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DifficultyMode {
    Fixed(Difficulty),
    #[default]
    Adaptive,
}

impl DifficultyMode {
    pub fn initial_difficulty(self) -> Difficulty {
        match self {
            DifficultyMode::Fixed(d) => d,
            DifficultyMode::Adaptive => Difficulty::Easy,
        }
    }

    pub fn is_adaptive(self) -> bool {
        matches!(self, DifficultyMode::Adaptive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_up_saturates_at_hard() {
        assert_eq!(Difficulty::Easy.step_up(), Difficulty::Medium);
        assert_eq!(Difficulty::Medium.step_up(), Difficulty::Hard);
        assert_eq!(Difficulty::Hard.step_up(), Difficulty::Hard);
        assert!(Difficulty::Easy < Difficulty::Hard);
    }

    #[test]
    fn mode_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&DifficultyMode::Adaptive).unwrap(),
            r#""adaptive""#
        );
        let fixed: DifficultyMode = serde_json::from_str(r#"{"fixed":"Hard"}"#).unwrap();
        assert_eq!(fixed, DifficultyMode::Fixed(Difficulty::Hard));
        assert_eq!(fixed.initial_difficulty(), Difficulty::Hard);
        assert!(!fixed.is_adaptive());
    }
}
