use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AttemptId, CommittedAnswer, Question};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("{answers} answers recorded for {questions} questions")]
    TooManyAnswers { answers: usize, questions: usize },

    #[error("answer for question {question} selects missing option {option}")]
    InvalidAnswer { question: usize, option: usize },

    #[error("question count ({total}) does not match outcome counts ({sum})")]
    CountMismatch { total: u32, sum: u32 },
}

/// Why an attempt reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The last question was committed.
    Finished,
    /// Lives hit zero under `LivesPolicy::EndAttempt`.
    OutOfLives,
}

/// Per-outcome question tallies for a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub correct: u32,
    pub incorrect: u32,
    pub unanswered: u32,
    pub skipped: u32,
    /// Questions never shown because the attempt ended early.
    pub unreached: u32,
}

impl OutcomeCounts {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.correct
            .saturating_add(self.incorrect)
            .saturating_add(self.unanswered)
            .saturating_add(self.skipped)
            .saturating_add(self.unreached)
    }
}

/// Snapshot of a completed attempt, handed to the results collaborator.
///
/// Deserialization goes through [`AttemptSummary::from_persisted`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SummaryRecord")]
pub struct AttemptSummary {
    attempt_id: AttemptId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    score: u32,
    max_score: u32,
    lives_remaining: u8,
    total_questions: u32,
    answers: Vec<CommittedAnswer>,
    counts: OutcomeCounts,
    end_reason: EndReason,
}

impl AttemptSummary {
    /// Build a summary by grading the committed answers against the questions.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`,
    /// `TooManyAnswers` if there are more answers than questions, and `InvalidAnswer` if a
    /// selection points past a question's options.
    #[allow(clippy::too_many_arguments)]
    pub fn from_attempt(
        attempt_id: AttemptId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        questions: &[Question],
        answers: &[CommittedAnswer],
        lives_remaining: u8,
        end_reason: EndReason,
    ) -> Result<Self, AttemptSummaryError> {
        if completed_at < started_at {
            return Err(AttemptSummaryError::InvalidTimeRange);
        }
        if answers.len() > questions.len() {
            return Err(AttemptSummaryError::TooManyAnswers {
                answers: answers.len(),
                questions: questions.len(),
            });
        }

        let mut counts = OutcomeCounts::default();
        let mut score = 0_u32;
        for (index, (question, answer)) in questions.iter().zip(answers).enumerate() {
            match *answer {
                CommittedAnswer::Selected(option) if option >= question.option_count() => {
                    return Err(AttemptSummaryError::InvalidAnswer {
                        question: index,
                        option,
                    });
                }
                CommittedAnswer::Selected(option) if question.is_correct(option) => {
                    counts.correct = counts.correct.saturating_add(1);
                    score = score.saturating_add(question.points());
                }
                CommittedAnswer::Selected(_) => {
                    counts.incorrect = counts.incorrect.saturating_add(1);
                }
                CommittedAnswer::Unanswered => {
                    counts.unanswered = counts.unanswered.saturating_add(1);
                }
                CommittedAnswer::Skipped => counts.skipped = counts.skipped.saturating_add(1),
            }
        }
        counts.unreached = saturating_u32(questions.len() - answers.len());

        let max_score = questions
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.points()));

        Ok(Self {
            attempt_id,
            started_at,
            completed_at,
            score,
            max_score,
            lives_remaining,
            total_questions: saturating_u32(questions.len()),
            answers: answers.to_vec(),
            counts,
            end_reason,
        })
    }

    /// Rehydrate a summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptSummaryError::InvalidTimeRange` or `CountMismatch` if the persisted
    /// values are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        attempt_id: AttemptId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        score: u32,
        max_score: u32,
        lives_remaining: u8,
        total_questions: u32,
        answers: Vec<CommittedAnswer>,
        counts: OutcomeCounts,
        end_reason: EndReason,
    ) -> Result<Self, AttemptSummaryError> {
        if completed_at < started_at {
            return Err(AttemptSummaryError::InvalidTimeRange);
        }
        let sum = counts.total();
        if sum != total_questions {
            return Err(AttemptSummaryError::CountMismatch {
                total: total_questions,
                sum,
            });
        }

        Ok(Self {
            attempt_id,
            started_at,
            completed_at,
            score,
            max_score,
            lives_remaining,
            total_questions,
            answers,
            counts,
            end_reason,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn lives_remaining(&self) -> u8 {
        self.lives_remaining
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn answers(&self) -> &[CommittedAnswer] {
        &self.answers
    }

    /// Answers in the integer encoding used by results consumers (`-1` = none).
    #[must_use]
    pub fn answer_codes(&self) -> Vec<i32> {
        self.answers.iter().map(|a| a.code()).collect()
    }

    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    #[must_use]
    pub fn end_reason(&self) -> EndReason {
        self.end_reason
    }
}

/// Unvalidated stored shape of a summary.
#[derive(Deserialize)]
struct SummaryRecord {
    attempt_id: AttemptId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    score: u32,
    max_score: u32,
    lives_remaining: u8,
    total_questions: u32,
    answers: Vec<CommittedAnswer>,
    counts: OutcomeCounts,
    end_reason: EndReason,
}

impl TryFrom<SummaryRecord> for AttemptSummary {
    type Error = AttemptSummaryError;

    fn try_from(record: SummaryRecord) -> Result<Self, Self::Error> {
        AttemptSummary::from_persisted(
            record.attempt_id,
            record.started_at,
            record.completed_at,
            record.score,
            record.max_score,
            record.lives_remaining,
            record.total_questions,
            record.answers,
            record.counts,
            record.end_reason,
        )
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionId, QuestionOption};
    use crate::time::fixed_now;

    fn question(id: u64, correct: usize, points: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec![QuestionOption::from("a"), QuestionOption::from("b")],
            correct,
            points,
            Difficulty::Easy,
            None,
        )
        .unwrap()
    }

    #[test]
    fn grades_answers_and_counts_unreached() {
        let questions = vec![question(1, 1, 10), question(2, 0, 20), question(3, 0, 5)];
        let answers = [CommittedAnswer::Selected(1), CommittedAnswer::Selected(1)];
        let now = fixed_now();

        let summary = AttemptSummary::from_attempt(
            AttemptId::generate(),
            now,
            now,
            &questions,
            &answers,
            0,
            EndReason::OutOfLives,
        )
        .unwrap();

        assert_eq!(summary.score(), 10);
        assert_eq!(summary.max_score(), 35);
        assert_eq!(summary.counts().correct, 1);
        assert_eq!(summary.counts().incorrect, 1);
        assert_eq!(summary.counts().unreached, 1);
        assert_eq!(summary.counts().total(), 3);
        assert_eq!(summary.answer_codes(), vec![1, 1]);
    }

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let err = AttemptSummary::from_attempt(
            AttemptId::generate(),
            now,
            now - chrono::Duration::seconds(1),
            &[question(1, 0, 1)],
            &[],
            3,
            EndReason::Finished,
        )
        .unwrap_err();
        assert_eq!(err, AttemptSummaryError::InvalidTimeRange);
    }

    #[test]
    fn persisted_counts_must_add_up() {
        let now = fixed_now();
        let counts = OutcomeCounts {
            correct: 1,
            ..OutcomeCounts::default()
        };
        let err = AttemptSummary::from_persisted(
            AttemptId::generate(),
            now,
            now,
            10,
            10,
            3,
            2,
            vec![CommittedAnswer::Selected(0)],
            counts,
            EndReason::Finished,
        )
        .unwrap_err();
        assert_eq!(err, AttemptSummaryError::CountMismatch { total: 2, sum: 1 });
    }

    #[test]
    fn stored_rows_are_validated_on_load() {
        let now = fixed_now();
        let summary = AttemptSummary::from_attempt(
            AttemptId::generate(),
            now,
            now,
            &[question(1, 0, 4), question(2, 1, 6)],
            &[CommittedAnswer::Selected(0), CommittedAnswer::Skipped],
            3,
            EndReason::Finished,
        )
        .unwrap();

        let mut row = serde_json::to_value(&summary).unwrap();
        let loaded: AttemptSummary = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(loaded, summary);

        row["total_questions"] = 5.into();
        let err = serde_json::from_value::<AttemptSummary>(row).unwrap_err();
        assert!(err.to_string().contains("does not match outcome counts"));
    }
}
