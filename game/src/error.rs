use std::path::PathBuf;

use thiserror::Error;

use crate::session::PhaseKind;

/// Why a placement was refused. Refusals never change grid or score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("piece slot {0} is empty")]
    EmptySlot(usize),

    #[error("piece slot {0} does not exist")]
    SlotOutOfRange(usize),

    #[error("piece would extend past the grid edge")]
    OutOfBounds,

    #[error("piece overlaps an occupied cell")]
    Occupied,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuestionServiceError {
    #[error("question service unreachable: {0}")]
    Transport(String),

    #[error("question service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("question service response was malformed: {0}")]
    Malformed(String),

    #[error("question service returned no questions")]
    Empty,

    #[error("question service did not answer within {millis} ms")]
    Timeout { millis: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("action not allowed while {0}")]
    NotPlaying(PhaseKind),

    #[error("no question is pending")]
    NoPendingQuestion,

    #[error("question has not arrived yet")]
    QuestionNotReady,

    #[error("option {index} is out of range for {len} options")]
    OptionOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum QuestionBankError {
    #[error("failed to read question bank {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse question bank {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("question bank has no {0} questions")]
    MissingDifficulty(crate::difficulty::Difficulty),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridPatternError {
    #[error("pattern has {0} rows, grid has at most 10")]
    TooManyRows(usize),

    #[error("pattern row {row} has {len} cells, grid has at most 10")]
    RowTooLong { row: usize, len: usize },

    #[error("unknown cell {ch:?} at row {row}, col {col}")]
    UnknownCell { row: usize, col: usize, ch: char },
}
