use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("option {index} has empty text")]
    EmptyOption { index: usize },

    #[error("correct answer index {index} is out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },

    #[error("points must be > 0")]
    ZeroPoints,

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Display-only difficulty label. Has no effect on scoring.
///
/// Parsed case-insensitively, serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(QuestionError::UnknownDifficulty(other.to_owned())),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = QuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// Option record as stored by richer quiz sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
}

/// A selectable answer. Quiz sources hand out either bare strings or records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionOption {
    Plain(String),
    Record(OptionRecord),
}

impl QuestionOption {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            QuestionOption::Plain(text) => text,
            QuestionOption::Record(record) => &record.text,
        }
    }
}

impl From<&str> for QuestionOption {
    fn from(value: &str) -> Self {
        QuestionOption::Plain(value.to_owned())
    }
}

impl From<String> for QuestionOption {
    fn from(value: String) -> Self {
        QuestionOption::Plain(value)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single-choice question. Immutable for the lifetime of an attempt.
///
/// Deserialization runs the same validation as [`Question::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    prompt: String,
    options: Vec<QuestionOption>,
    correct_answer_index: usize,
    points: u32,
    difficulty: Difficulty,
    time_limit_secs: Option<u32>,
}

impl Question {
    /// Build a validated question.
    ///
    /// A time limit of `Some(0)` is treated as untimed.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any option is blank, there are
    /// no options, the correct index is out of range, or `points` is zero.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        options: Vec<QuestionOption>,
        correct_answer_index: usize,
        points: u32,
        difficulty: Difficulty,
        time_limit_secs: Option<u32>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if let Some(index) = options.iter().position(|o| o.text().trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        if correct_answer_index >= options.len() {
            return Err(QuestionError::CorrectAnswerOutOfRange {
                index: correct_answer_index,
                len: options.len(),
            });
        }
        if points == 0 {
            return Err(QuestionError::ZeroPoints);
        }

        Ok(Self {
            id,
            prompt,
            options,
            correct_answer_index,
            points,
            difficulty,
            time_limit_secs: time_limit_secs.filter(|secs| *secs > 0),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[QuestionOption] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct_answer_index(&self) -> usize {
        self.correct_answer_index
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Time budget in seconds, `None` when the question is untimed.
    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    #[must_use]
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_answer_index
    }
}

/// Unvalidated wire shape of a question.
#[derive(Deserialize)]
struct QuestionRecord {
    id: QuestionId,
    prompt: String,
    options: Vec<QuestionOption>,
    correct_answer_index: usize,
    points: u32,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default)]
    time_limit_secs: Option<u32>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Question::new(
            record.id,
            record.prompt,
            record.options,
            record.correct_answer_index,
            record.points,
            record.difficulty,
            record.time_limit_secs,
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
