//! Owns one session and bridges it to a question service.

use std::time::Duration;

use tokio::time;

use crate::error::{QuestionServiceError, SessionError};
use crate::question::{QuestionRequest, QuestionResponse, QuestionService};
use crate::session::{GameSession, PlacementAttempt, SessionEvent, Transition};

#[derive(Debug)]
pub struct SessionDriver<S> {
    session: GameSession,
    service: S,
    request_timeout: Option<Duration>,
}

impl<S: QuestionService> SessionDriver<S> {
    pub fn new(session: GameSession, service: S) -> Self {
        Self {
            session,
            service,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn into_session(self) -> GameSession {
        self.session
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn start(&mut self) -> Vec<SessionEvent> {
        let transition = self.session.start();
        self.commit(transition)
    }

    pub fn new_game(&mut self) -> Vec<SessionEvent> {
        let transition = self.session.restart();
        tracing::info!("new game");
        self.commit(transition)
    }

    /// Applies a placement and, when it clears lines, fetches and delivers
    /// the question before returning. Placements are refused while a
    /// question is outstanding.
    pub async fn place(
        &mut self,
        attempt: PlacementAttempt,
    ) -> Result<Vec<SessionEvent>, SessionError> {
        let transition = match self.session.apply_placement(attempt) {
            Ok(transition) => transition,
            Err(err) => {
                tracing::debug!(?attempt, %err, "placement refused");
                return Err(err);
            }
        };
        let request = transition.question_request().cloned();
        let mut events = self.commit(transition);
        if let Some(request) = request {
            events.extend(self.fulfil(request).await?);
        }
        Ok(events)
    }

    pub fn answer(&mut self, selected: &str) -> Result<Vec<SessionEvent>, SessionError> {
        let transition = self.session.apply_answer(selected)?;
        Ok(self.commit(transition))
    }

    pub fn answer_index(&mut self, index: usize) -> Result<Vec<SessionEvent>, SessionError> {
        let transition = self.session.apply_answer_index(index)?;
        Ok(self.commit(transition))
    }

    pub fn tick(&mut self, dt: Duration) -> Vec<SessionEvent> {
        let transition = self.session.tick(dt);
        self.commit(transition)
    }

    async fn fulfil(&mut self, request: QuestionRequest) -> Result<Vec<SessionEvent>, SessionError> {
        let result = self.fetch(&request).await.and_then(QuestionResponse::into_first);
        if let Err(err) = &result {
            tracing::warn!(topic = %request.topic, difficulty = %request.difficulty, %err, "question request failed");
        }
        let transition = self.session.deliver_question(result)?;
        Ok(self.commit(transition))
    }

    async fn fetch(&self, request: &QuestionRequest) -> Result<QuestionResponse, QuestionServiceError> {
        let Some(limit) = self.request_timeout else {
            return self.service.fetch(request).await;
        };
        match time::timeout(limit, self.service.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(QuestionServiceError::Timeout {
                millis: crate::serde_duration::to_millis(limit),
            }),
        }
    }

    fn commit(&mut self, transition: Transition) -> Vec<SessionEvent> {
        let Transition { session, events } = transition;
        let from = self.session.phase_kind();
        let to = session.phase_kind();
        if from != to {
            tracing::debug!(%from, %to, score = session.score(), "phase changed");
        }
        for event in &events {
            log_event(event);
        }
        self.session = session;
        events
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::LinesCleared {
            rows,
            cols,
            cells_cleared,
        } => {
            tracing::debug!(?rows, ?cols, cells_cleared, "lines cleared");
        }
        SessionEvent::AnswerResolved { outcome, timed_out } => {
            tracing::info!(
                correct = outcome.correct,
                bonus = outcome.bonus,
                difficulty = %outcome.difficulty,
                streak = outcome.streak.current,
                timed_out,
                "answer resolved"
            );
        }
        SessionEvent::GameOver(reason) => {
            tracing::info!(?reason, "game over");
        }
        other => tracing::trace!(event = ?other, "session event"),
    }
}
