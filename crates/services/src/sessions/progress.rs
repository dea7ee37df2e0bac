use chrono::{DateTime, Utc};
use quiz_core::model::{AttemptId, EndReason, QuestionId};
use serde::Serialize;

/// Lifecycle position of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Completed(EndReason),
}

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

/// Owned read-only copy of the attempt state for rendering.
///
/// Holds no references into the store, so the presentation layer can keep it
/// across further mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptSnapshot {
    pub attempt_id: AttemptId,
    pub status: AttemptStatus,
    pub current_index: usize,
    pub current_question_id: Option<QuestionId>,
    pub total_questions: usize,
    pub selected_answer: Option<usize>,
    pub score: u32,
    pub max_score: u32,
    pub lives: u8,
    pub time_remaining_secs: u32,
    /// Committed answers, `-1` for unanswered or skipped.
    pub answers: Vec<i32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
