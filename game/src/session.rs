//! The game session value and its transitions.
//!
//! Every transition borrows the current session and returns a new one plus
//! the events it produced; the caller decides what to do with the events.
//! The session never performs I/O: a line clear only asks for a question.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::answer_timer::AnswerTimer;
use crate::difficulty::{Difficulty, DifficultyMode};
use crate::error::{QuestionServiceError, SessionError};
use crate::game_over::is_game_over;
use crate::grid::Grid;
use crate::line_clear::{LineClear, detect_and_clear_lines};
use crate::piece_set::{Dealer, PieceSet};
use crate::placement::place_piece;
use crate::question::{Question, QuestionRequest};
use crate::scoring::{CORRECT_ANSWER_BONUS_DEFAULT, ScoreDelta};
use crate::shapes::Shape;
use crate::streak::{AnswerOutcome, Streak, resolve_answer};

pub const DEFAULT_TOPIC: &str = "general knowledge";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub topic: String,
    pub difficulty_mode: DifficultyMode,
    pub correct_answer_bonus: u32,
    pub seed: u64,
    #[serde(with = "crate::serde_duration::option", default)]
    pub answer_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            difficulty_mode: DifficultyMode::Adaptive,
            correct_answer_bonus: CORRECT_ANSWER_BONUS_DEFAULT,
            seed: 1,
            answer_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    Idle,
    Playing,
    AwaitingQuestion,
    AwaitingAnswer,
    GameOver,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PhaseKind::Idle => "idle",
            PhaseKind::Playing => "playing",
            PhaseKind::AwaitingQuestion => "awaiting a question",
            PhaseKind::AwaitingAnswer => "awaiting an answer",
            PhaseKind::GameOver => "game over",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    NoMovesLeft,
    QuestionServiceFailure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Playing,
    AwaitingQuestion {
        request: QuestionRequest,
    },
    AwaitingAnswer {
        question: Question,
        timer: Option<AnswerTimer>,
    },
    GameOver {
        reason: GameOverReason,
    },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Playing => PhaseKind::Playing,
            Phase::AwaitingQuestion { .. } => PhaseKind::AwaitingQuestion,
            Phase::AwaitingAnswer { .. } => PhaseKind::AwaitingAnswer,
            Phase::GameOver { .. } => PhaseKind::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementAttempt {
    pub slot: usize,
    pub row: i32,
    pub col: i32,
}

impl PlacementAttempt {
    pub fn new(slot: usize, row: i32, col: i32) -> Self {
        Self { slot, row, col }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub pieces_placed: u32,
    pub lines_cleared: u32,
    pub questions_asked: u32,
    pub questions_answered: u32,
    pub questions_correct: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started {
        pieces: PieceSet,
    },
    PiecePlaced {
        shape: Shape,
        row: i32,
        col: i32,
        delta: ScoreDelta,
    },
    LinesCleared {
        rows: Vec<usize>,
        cols: Vec<usize>,
        cells_cleared: u32,
    },
    PiecesReplenished {
        pieces: PieceSet,
    },
    QuestionRequested(QuestionRequest),
    QuestionPresented {
        question: Question,
    },
    AnswerResolved {
        outcome: AnswerOutcome,
        timed_out: bool,
    },
    GameOver(GameOverReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: GameSession,
    pub events: Vec<SessionEvent>,
}

impl Transition {
    fn unchanged(session: &GameSession) -> Self {
        Self {
            session: session.clone(),
            events: Vec::new(),
        }
    }

    pub fn question_request(&self) -> Option<&QuestionRequest> {
        self.events.iter().find_map(|event| match event {
            SessionEvent::QuestionRequested(request) => Some(request),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    config: SessionConfig,
    grid: Grid,
    pieces: PieceSet,
    dealer: Dealer,
    score: u32,
    difficulty: Difficulty,
    streak: Streak,
    phase: Phase,
    stats: SessionStats,
}

impl GameSession {
    /// A fresh, idle session. Call `start` to deal the first pieces.
    pub fn new_game(config: SessionConfig) -> Self {
        Self {
            grid: Grid::empty(),
            pieces: PieceSet::empty(),
            dealer: Dealer::new(config.seed),
            score: 0,
            difficulty: config.difficulty_mode.initial_difficulty(),
            streak: Streak::default(),
            phase: Phase::Idle,
            stats: SessionStats::default(),
            config,
        }
    }

    /// Replaces the board and offered pieces. Used to set up scenarios.
    pub fn with_board(mut self, grid: Grid, pieces: PieceSet) -> Self {
        self.grid = grid;
        self.pieces = pieces;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn pieces(&self) -> &PieceSet {
        &self.pieces
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn streak(&self) -> Streak {
        self.streak
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_game_over(&self) -> bool {
        self.phase_kind() == PhaseKind::GameOver
    }

    pub fn pending_request(&self) -> Option<&QuestionRequest> {
        match &self.phase {
            Phase::AwaitingQuestion { request } => Some(request),
            _ => None,
        }
    }

    pub fn pending_question(&self) -> Option<&Question> {
        match &self.phase {
            Phase::AwaitingAnswer { question, .. } => Some(question),
            _ => None,
        }
    }

    pub fn answer_timer(&self) -> Option<&AnswerTimer> {
        match &self.phase {
            Phase::AwaitingAnswer { timer, .. } => timer.as_ref(),
            _ => None,
        }
    }

    /// Idle to Playing. Keeps any board set up with `with_board`; deals a
    /// fresh set when no piece is on offer. A no-op outside `Idle`.
    pub fn start(&self) -> Transition {
        if self.phase != Phase::Idle {
            return Transition::unchanged(self);
        }
        let mut next = self.clone();
        if next.pieces.is_exhausted() {
            next.pieces = next.dealer.deal();
        }
        next.phase = Phase::Playing;
        let mut events = vec![SessionEvent::Started {
            pieces: next.pieces,
        }];
        next.check_game_over(&mut events);
        Transition {
            session: next,
            events,
        }
    }

    /// Abandons this game and starts another with the same config. The
    /// dealer carries on from where it was so the next game differs.
    pub fn restart(&self) -> Transition {
        let mut fresh = GameSession::new_game(self.config.clone());
        fresh.dealer = self.dealer.clone();
        fresh.start()
    }

    pub fn apply_placement(&self, attempt: PlacementAttempt) -> Result<Transition, SessionError> {
        self.ensure_phase(PhaseKind::Playing)?;
        let shape = self.pieces.get(attempt.slot)?;
        let (grid, cells) = place_piece(&self.grid, shape, attempt.row, attempt.col)?;

        let mut next = self.clone();
        next.grid = grid;
        next.pieces.take(attempt.slot)?;
        next.stats.pieces_placed = next.stats.pieces_placed.saturating_add(1);

        let (mut next, clear) = next.apply_clear();
        let delta = ScoreDelta::for_placement(cells, clear.lines());
        next.score = next.score.saturating_add(delta.total());

        let mut events = vec![SessionEvent::PiecePlaced {
            shape,
            row: attempt.row,
            col: attempt.col,
            delta,
        }];
        if !clear.is_empty() {
            events.push(SessionEvent::LinesCleared {
                rows: clear.rows.clone(),
                cols: clear.cols.clone(),
                cells_cleared: clear.cells_cleared,
            });
        }
        if next.pieces.is_exhausted() {
            next.pieces = next.dealer.deal();
            events.push(SessionEvent::PiecesReplenished {
                pieces: next.pieces,
            });
        }

        // No moves left wins over a pending question.
        if next.check_game_over(&mut events) {
            return Ok(Transition {
                session: next,
                events,
            });
        }

        if !clear.is_empty() {
            let request = QuestionRequest::single(next.config.topic.clone(), next.difficulty);
            next.stats.questions_asked = next.stats.questions_asked.saturating_add(1);
            next.phase = Phase::AwaitingQuestion {
                request: request.clone(),
            };
            events.push(SessionEvent::QuestionRequested(request));
        }

        Ok(Transition {
            session: next,
            events,
        })
    }

    /// Clears every full row and column of the current grid.
    pub fn apply_clear(&self) -> (GameSession, LineClear) {
        let clear = detect_and_clear_lines(&self.grid);
        let mut next = self.clone();
        next.grid = clear.grid;
        next.stats.lines_cleared = next.stats.lines_cleared.saturating_add(clear.lines());
        (next, clear)
    }

    /// Hands the outcome of a question request to the session. Any failure
    /// ends the game.
    pub fn deliver_question(
        &self,
        result: Result<Question, QuestionServiceError>,
    ) -> Result<Transition, SessionError> {
        if self.pending_request().is_none() {
            return Err(SessionError::NoPendingQuestion);
        }
        let result = result.and_then(|question| {
            if question.options.is_empty() {
                Err(QuestionServiceError::Malformed(
                    "question has no options".to_string(),
                ))
            } else {
                Ok(question)
            }
        });

        let mut next = self.clone();
        let event = match result {
            Ok(question) => {
                next.phase = Phase::AwaitingAnswer {
                    question: question.clone(),
                    timer: next.config.answer_timeout.map(AnswerTimer::new),
                };
                SessionEvent::QuestionPresented { question }
            }
            Err(err) => {
                let reason = GameOverReason::QuestionServiceFailure(err.to_string());
                next.phase = Phase::GameOver {
                    reason: reason.clone(),
                };
                SessionEvent::GameOver(reason)
            }
        };
        Ok(Transition {
            session: next,
            events: vec![event],
        })
    }

    pub fn apply_answer(&self, selected: &str) -> Result<Transition, SessionError> {
        let question = self.awaiting_question()?;
        let correct = question.is_correct(selected);
        Ok(self.resolve(correct, false))
    }

    pub fn apply_answer_index(&self, index: usize) -> Result<Transition, SessionError> {
        let question = self.awaiting_question()?;
        let selected = question
            .option(index)
            .ok_or(SessionError::OptionOutOfRange {
                index,
                len: question.options.len(),
            })?;
        self.apply_answer(selected)
    }

    /// Advances the answer timer. When it runs out the answer counts as
    /// incorrect and play resumes.
    pub fn tick(&self, dt: Duration) -> Transition {
        let Phase::AwaitingAnswer {
            question,
            timer: Some(timer),
        } = &self.phase
        else {
            return Transition::unchanged(self);
        };
        let timer = timer.tick(dt);
        if timer.is_up() {
            return self.resolve(false, true);
        }
        let mut next = self.clone();
        next.phase = Phase::AwaitingAnswer {
            question: question.clone(),
            timer: Some(timer),
        };
        Transition {
            session: next,
            events: Vec::new(),
        }
    }

    fn awaiting_question(&self) -> Result<&Question, SessionError> {
        match &self.phase {
            Phase::AwaitingAnswer { question, .. } => Ok(question),
            Phase::AwaitingQuestion { .. } => Err(SessionError::QuestionNotReady),
            _ => Err(SessionError::NoPendingQuestion),
        }
    }

    fn resolve(&self, correct: bool, timed_out: bool) -> Transition {
        let outcome = resolve_answer(
            correct,
            self.config.difficulty_mode,
            self.difficulty,
            self.streak,
            self.config.correct_answer_bonus,
        );
        let mut next = self.clone();
        next.score = next.score.saturating_add(outcome.bonus);
        next.difficulty = outcome.difficulty;
        next.streak = outcome.streak;
        next.stats.questions_answered = next.stats.questions_answered.saturating_add(1);
        if correct {
            next.stats.questions_correct = next.stats.questions_correct.saturating_add(1);
        }
        next.phase = Phase::Playing;

        let mut events = vec![SessionEvent::AnswerResolved { outcome, timed_out }];
        next.check_game_over(&mut events);
        Transition {
            session: next,
            events,
        }
    }

    fn ensure_phase(&self, expected: PhaseKind) -> Result<(), SessionError> {
        let kind = self.phase_kind();
        if kind == expected {
            Ok(())
        } else {
            Err(SessionError::NotPlaying(kind))
        }
    }

    fn check_game_over(&mut self, events: &mut Vec<SessionEvent>) -> bool {
        if !is_game_over(&self.grid, self.pieces.remaining()) {
            return false;
        }
        let reason = GameOverReason::NoMovesLeft;
        self.phase = Phase::GameOver {
            reason: reason.clone(),
        };
        events.push(SessionEvent::GameOver(reason));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlacementError;

    fn playing(grid: Grid, pieces: PieceSet) -> GameSession {
        GameSession::new_game(SessionConfig::default())
            .with_board(grid, pieces)
            .start()
            .session
    }

    fn question() -> Question {
        Question {
            question: "2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            answer: "4".to_string(),
        }
    }

    fn row_almost_full() -> Grid {
        Grid::from_pattern(&["#########."]).unwrap()
    }

    #[test]
    fn start_deals_three_pieces() {
        let t = GameSession::new_game(SessionConfig::default()).start();
        assert_eq!(t.session.phase_kind(), PhaseKind::Playing);
        assert_eq!(t.session.pieces().remaining_count(), 3);
        assert!(matches!(t.events[0], SessionEvent::Started { .. }));
    }

    #[test]
    fn placement_refused_outside_playing() {
        let idle = GameSession::new_game(SessionConfig::default());
        assert_eq!(
            idle.apply_placement(PlacementAttempt::new(0, 0, 0)),
            Err(SessionError::NotPlaying(PhaseKind::Idle))
        );
    }

    #[test]
    fn clearing_a_line_requests_a_question() {
        let session = playing(
            row_almost_full(),
            PieceSet::from_shapes([Shape::Single, Shape::Single, Shape::Single]),
        );
        let t = session.apply_placement(PlacementAttempt::new(0, 0, 9)).unwrap();
        assert_eq!(t.session.score(), 1 + 10);
        assert_eq!(t.session.grid().occupied_count(), 0);
        assert_eq!(t.session.phase_kind(), PhaseKind::AwaitingQuestion);
        let request = t.question_request().unwrap();
        assert_eq!(request.difficulty, Difficulty::Easy);
        assert_eq!(request.count, 1);

        let blocked = t.session.apply_placement(PlacementAttempt::new(1, 5, 5));
        assert_eq!(
            blocked,
            Err(SessionError::NotPlaying(PhaseKind::AwaitingQuestion))
        );
        assert_eq!(
            t.session.apply_answer("4"),
            Err(SessionError::QuestionNotReady)
        );
    }

    #[test]
    fn correct_answer_awards_bonus_and_steps_up() {
        let session = playing(
            row_almost_full(),
            PieceSet::from_shapes([Shape::Single, Shape::Single, Shape::Single]),
        );
        let asked = session
            .apply_placement(PlacementAttempt::new(0, 0, 9))
            .unwrap()
            .session;
        let presented = asked.deliver_question(Ok(question())).unwrap().session;
        assert_eq!(presented.pending_question(), Some(&question()));

        let answered = presented.apply_answer_index(1).unwrap().session;
        assert_eq!(answered.score(), 11 + CORRECT_ANSWER_BONUS_DEFAULT);
        assert_eq!(answered.difficulty(), Difficulty::Medium);
        assert_eq!(answered.streak().current, 1);
        assert_eq!(answered.phase_kind(), PhaseKind::Playing);
        assert_eq!(answered.stats().questions_correct, 1);
    }

    #[test]
    fn service_failure_ends_the_game() {
        let session = playing(
            row_almost_full(),
            PieceSet::from_shapes([Shape::Single, Shape::Single, Shape::Single]),
        );
        let asked = session
            .apply_placement(PlacementAttempt::new(0, 0, 9))
            .unwrap()
            .session;
        let over = asked
            .deliver_question(Err(QuestionServiceError::Empty))
            .unwrap()
            .session;
        assert!(matches!(
            over.phase(),
            Phase::GameOver {
                reason: GameOverReason::QuestionServiceFailure(_)
            }
        ));
        assert_eq!(
            over.deliver_question(Ok(question())),
            Err(SessionError::NoPendingQuestion)
        );
    }

    #[test]
    fn answer_index_out_of_range() {
        let session = playing(
            row_almost_full(),
            PieceSet::from_shapes([Shape::Single, Shape::Single, Shape::Single]),
        );
        let presented = session
            .apply_placement(PlacementAttempt::new(0, 0, 9))
            .unwrap()
            .session
            .deliver_question(Ok(question()))
            .unwrap()
            .session;
        assert_eq!(
            presented.apply_answer_index(5),
            Err(SessionError::OptionOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn timer_expiry_counts_as_wrong() {
        let config = SessionConfig {
            answer_timeout: Some(Duration::from_secs(10)),
            difficulty_mode: DifficultyMode::Adaptive,
            ..SessionConfig::default()
        };
        let session = GameSession::new_game(config)
            .with_board(
                row_almost_full(),
                PieceSet::from_shapes([Shape::Single, Shape::Single, Shape::Single]),
            )
            .start()
            .session;
        let presented = session
            .apply_placement(PlacementAttempt::new(0, 0, 9))
            .unwrap()
            .session
            .deliver_question(Ok(question()))
            .unwrap()
            .session;

        let waiting = presented.tick(Duration::from_secs(4));
        assert!(waiting.events.is_empty());
        assert_eq!(
            waiting.session.answer_timer().map(AnswerTimer::remaining),
            Some(Duration::from_secs(6))
        );

        let expired = waiting.session.tick(Duration::from_secs(6));
        assert_eq!(expired.session.phase_kind(), PhaseKind::Playing);
        assert_eq!(expired.session.score(), 11);
        assert!(matches!(
            expired.events[0],
            SessionEvent::AnswerResolved {
                timed_out: true,
                ..
            }
        ));
    }

    #[test]
    fn tick_without_timer_changes_nothing() {
        let session = GameSession::new_game(SessionConfig::default()).start().session;
        let t = session.tick(Duration::from_secs(60));
        assert_eq!(t.session, session);
        assert!(t.events.is_empty());
    }

    #[test]
    fn refused_placement_keeps_state() {
        let session = playing(
            Grid::empty(),
            PieceSet::from_slots([Some(Shape::I4H), None, Some(Shape::Single)]),
        );
        assert_eq!(
            session.apply_placement(PlacementAttempt::new(0, 0, 7)),
            Err(SessionError::Placement(PlacementError::OutOfBounds))
        );
        assert_eq!(
            session.apply_placement(PlacementAttempt::new(1, 0, 0)),
            Err(SessionError::Placement(PlacementError::EmptySlot(1)))
        );
    }

    #[test]
    fn emptying_the_set_replenishes_it() {
        let session = playing(
            Grid::empty(),
            PieceSet::from_slots([Some(Shape::Single), None, None]),
        );
        let t = session.apply_placement(PlacementAttempt::new(0, 4, 4)).unwrap();
        assert_eq!(t.session.pieces().remaining_count(), 3);
        assert!(
            t.events
                .iter()
                .any(|e| matches!(e, SessionEvent::PiecesReplenished { .. }))
        );
    }

    #[test]
    fn restart_continues_the_dealer() {
        let first = GameSession::new_game(SessionConfig::default()).start().session;
        let second = first.restart().session;
        assert_eq!(second.phase_kind(), PhaseKind::Playing);
        assert_eq!(second.score(), 0);
        assert_ne!(first.dealer, second.dealer);
    }
}
