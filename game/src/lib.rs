//! Block-placement puzzle with an adaptive quiz side-channel.
//!
//! `session::GameSession` is the whole game as a value. `driver` runs it
//! against an async `question::QuestionService`; `logic` runs it inside the
//! engine's headless runner for replays and the editor API.

pub mod answer_timer;
pub mod bot;
pub mod difficulty;
pub mod driver;
pub mod editor_api;
pub mod error;
pub mod game_over;
pub mod grid;
pub mod line_clear;
pub mod logging;
pub mod logic;
pub mod piece_set;
pub mod placement;
pub mod question;
pub mod question_http;
pub mod scoring;
pub mod serde_duration;
pub mod session;
pub mod settings;
pub mod shapes;
pub mod streak;

pub use error::{PlacementError, QuestionServiceError, SessionError};
pub use grid::{Cell, GRID_SIZE, Grid, create_empty_grid};
pub use session::{GameSession, PlacementAttempt, SessionConfig, SessionEvent};
pub use shapes::Shape;
