use std::time::Duration;

use engine::GameLogic;
use serde::{Deserialize, Serialize};

use crate::question::QuestionBank;
use crate::session::{GameSession, PlacementAttempt, SessionConfig, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockQuizInput {
    Place(PlacementAttempt),
    /// Index into the pending question's options.
    Answer(usize),
    Tick(u32),
    NewGame,
    Noop,
}

/// Deterministic, synchronous game logic for the headless runner, the
/// editor API, and recorded replays. Questions come from a local bank.
#[derive(Debug, Clone)]
pub struct BlockQuizLogic {
    config: SessionConfig,
    bank: QuestionBank,
}

impl BlockQuizLogic {
    pub fn new(config: SessionConfig, bank: QuestionBank) -> Self {
        Self { config, bank }
    }

    pub fn standard(seed: u64) -> Self {
        Self::new(
            SessionConfig {
                seed,
                ..SessionConfig::default()
            },
            QuestionBank::builtin(),
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Answers a freshly requested question from the bank, keyed by how
    /// many questions this session has asked.
    fn fulfil(&self, transition: Transition) -> GameSession {
        let session = transition.session;
        let Some(request) = session.pending_request() else {
            return session;
        };
        let index = session.stats().questions_asked.saturating_sub(1) as usize;
        let result = self.bank.response_at(request, index).into_first();
        match session.deliver_question(result) {
            Ok(transition) => transition.session,
            Err(err) => {
                tracing::debug!(%err, "question delivery refused");
                session
            }
        }
    }
}

impl GameLogic for BlockQuizLogic {
    type State = GameSession;
    type Input = BlockQuizInput;

    fn initial_state(&self) -> Self::State {
        GameSession::new_game(self.config.clone()).start().session
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let result = match input {
            BlockQuizInput::Noop => return state.clone(),
            BlockQuizInput::NewGame => Ok(state.restart()),
            BlockQuizInput::Tick(ms) => Ok(state.tick(Duration::from_millis(u64::from(ms)))),
            BlockQuizInput::Place(attempt) => state.apply_placement(attempt),
            BlockQuizInput::Answer(index) => state.apply_answer_index(index),
        };
        match result {
            Ok(transition) => self.fulfil(transition),
            Err(err) => {
                tracing::debug!(?input, %err, "input ignored");
                state.clone()
            }
        }
    }
}
