mod answer;
mod ids;
mod question;
mod settings;
mod summary;

pub use answer::{CommittedAnswer, UNANSWERED_CODE};
pub use ids::{AttemptId, ParseIdError, QuestionId, QuizId};
pub use question::{Difficulty, OptionRecord, Question, QuestionError, QuestionOption};
pub use settings::{
    DEFAULT_LIVES, DEFAULT_TICK_INTERVAL, ExpiryPolicy, LivesPolicy, MAX_LIVES, SessionSettings,
    SettingsError,
};
pub use summary::{AttemptSummary, AttemptSummaryError, EndReason, OutcomeCounts};
