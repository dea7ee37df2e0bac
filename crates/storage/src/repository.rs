use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{AttemptSummary, Question, QuizId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier for a persisted attempt result.
pub type AttemptResultId = i64;

/// A quiz definition as handed out by the quiz source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDefinition {
    pub id: QuizId,
    pub title: String,
    pub category: Option<String>,
    pub questions: Vec<Question>,
}

/// Persisted shape of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResultRow {
    pub id: AttemptResultId,
    pub quiz_id: QuizId,
    pub summary: AttemptSummary,
}

/// Quiz definition source. Storage format is up to the implementation.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist or replace a quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the quiz cannot be stored.
    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError>;

    /// Fetch a quiz by ID, questions in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError>;
}

/// Results sink for completed attempts.
#[async_trait]
pub trait AttemptResultRepository: Send + Sync {
    /// Append a completed attempt summary.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the same attempt was already stored,
    /// or other storage errors.
    async fn append_result(
        &self,
        quiz_id: QuizId,
        summary: &AttemptSummary,
    ) -> Result<AttemptResultId, StorageError>;

    /// Fetch a stored result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_result(&self, id: AttemptResultId) -> Result<AttemptResultRow, StorageError>;

    /// List results for a quiz completed at or after `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn list_results(
        &self,
        quiz_id: QuizId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttemptResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quizzes: Arc<Mutex<HashMap<QuizId, QuizDefinition>>>,
    results: Arc<Mutex<Vec<AttemptResultRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_quiz(&self, quiz: &QuizDefinition) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl AttemptResultRepository for InMemoryRepository {
    async fn append_result(
        &self,
        quiz_id: QuizId,
        summary: &AttemptSummary,
    ) -> Result<AttemptResultId, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .iter()
            .any(|row| row.summary.attempt_id() == summary.attempt_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = i64::try_from(guard.len())
            .map_err(|e| StorageError::Serialization(e.to_string()))?
            + 1;
        guard.push(AttemptResultRow {
            id,
            quiz_id,
            summary: summary.clone(),
        });
        Ok(id)
    }

    async fn get_result(&self, id: AttemptResultId) -> Result<AttemptResultRow, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_results(
        &self,
        quiz_id: QuizId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AttemptResultRow>, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptResultRow> = guard
            .iter()
            .filter(|row| row.quiz_id == quiz_id)
            .filter(|row| since.is_none_or(|since| row.summary.completed_at() >= since))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.summary
                .completed_at()
                .cmp(&a.summary.completed_at())
                .then(b.id.cmp(&a.id))
        });
        Ok(rows)
    }
}

/// Aggregates the quiz source and results sink behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quizzes: Arc<dyn QuizRepository>,
    pub results: Arc<dyn AttemptResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quizzes: Arc<dyn QuizRepository> = Arc::new(repo.clone());
        let results: Arc<dyn AttemptResultRepository> = Arc::new(repo);
        Self { quizzes, results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{
        AttemptId, CommittedAnswer, Difficulty, EndReason, QuestionId, QuestionOption,
    };
    use quiz_core::time::fixed_now;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![QuestionOption::from("yes"), QuestionOption::from("no")],
            0,
            10,
            Difficulty::Easy,
            Some(20),
        )
        .unwrap()
    }

    fn build_summary(question: &Question) -> AttemptSummary {
        AttemptSummary::from_attempt(
            AttemptId::generate(),
            fixed_now(),
            fixed_now(),
            std::slice::from_ref(question),
            &[CommittedAnswer::Selected(0)],
            3,
            EndReason::Finished,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.get_quiz(QuizId::new(9)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn results_reject_duplicate_attempts() {
        let repo = InMemoryRepository::new();
        let question = build_question(1);
        let summary = build_summary(&question);

        let id = repo.append_result(QuizId::new(1), &summary).await.unwrap();
        assert_eq!(id, 1);
        let err = repo
            .append_result(QuizId::new(1), &summary)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let row = repo.get_result(id).await.unwrap();
        assert_eq!(row.summary.score(), 10);
    }
}
