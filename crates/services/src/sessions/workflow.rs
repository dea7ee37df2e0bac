use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;
use quiz_core::model::{QuizId, SessionSettings};
use storage::repository::{AttemptResultId, AttemptResultRepository, QuizRepository};
use tracing::info;

use super::session::QuizSession;
use super::store::SessionStore;
use crate::Clock;
use crate::error::SessionError;

/// Orchestrates attempt start from the quiz source and result persistence.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    results: Arc<dyn AttemptResultRepository>,
    settings: SessionSettings,
    shuffle_questions: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizRepository>,
        results: Arc<dyn AttemptResultRepository>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            results,
            settings: SessionSettings::default(),
            shuffle_questions: false,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Present questions in random order instead of the quiz's order.
    #[must_use]
    pub fn with_shuffle_questions(mut self, shuffle: bool) -> Self {
        self.shuffle_questions = shuffle;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Load a quiz and open a new attempt on it.
    ///
    /// Must be called within a Tokio runtime; the first question's countdown
    /// starts immediately.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the quiz has no questions, or
    /// `SessionError::Storage` if it cannot be loaded.
    pub async fn start_attempt(&self, quiz_id: QuizId) -> Result<QuizSession, SessionError> {
        let quiz = self.quizzes.get_quiz(quiz_id).await?;
        let mut questions = quiz.questions;
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        if self.shuffle_questions {
            questions.shuffle(&mut rng());
        }

        let mut store = SessionStore::new(self.settings.clone(), self.clock);
        store.load_questions(questions);
        info!(
            quiz = %quiz_id,
            attempt = %store.attempt_id(),
            title = %quiz.title,
            "attempt started"
        );
        Ok(QuizSession::new(quiz_id, store))
    }

    /// Persist the summary of a completed attempt. Safe to retry: once stored,
    /// the existing id is returned without writing again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` if the attempt is still running,
    /// or `SessionError::Storage` if persistence fails.
    pub async fn finalize(
        &self,
        session: &mut QuizSession,
    ) -> Result<AttemptResultId, SessionError> {
        if let Some(id) = session.result_id() {
            return Ok(id);
        }

        let summary = session.store().summary()?;
        let id = self.results.append_result(session.quiz_id(), &summary).await?;
        session.set_result_id(id);
        info!(
            quiz = %session.quiz_id(),
            attempt = %summary.attempt_id(),
            result = id,
            score = summary.score(),
            "attempt result stored"
        );
        Ok(id)
    }
}
