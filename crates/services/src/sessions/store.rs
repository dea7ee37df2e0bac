use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{
    AttemptId, AttemptSummary, CommittedAnswer, EndReason, ExpiryPolicy, LivesPolicy, Question,
    SessionSettings,
};
use tracing::{debug, info, trace, warn};

use super::progress::{AttemptProgress, AttemptSnapshot, AttemptStatus};
use crate::Clock;
use crate::error::SessionError;

/// Result of a commit (`advance`, `skip`, or an enforced expiry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing happened: no questions, already completed, or advisory expiry.
    Ignored,
    /// The cursor moved to the next question.
    Moved { from: usize, to: usize },
    /// The attempt reached its terminal state.
    Completed { reason: EndReason },
}

//
// ─── SESSION STORE ─────────────────────────────────────────────────────────────
//

/// Single-writer state of one quiz attempt.
///
/// All mutation goes through the methods below; none of them fail. Calls that
/// make no sense in the current state are ignored and logged.
///
/// On completion the cursor stays on the last committed question; check
/// [`SessionStore::is_complete`] rather than comparing the index to the
/// question count.
#[derive(Debug, Clone)]
pub struct SessionStore {
    settings: SessionSettings,
    clock: Clock,
    attempt_id: AttemptId,
    questions: Vec<Question>,
    current: usize,
    selected: Option<usize>,
    answers: Vec<CommittedAnswer>,
    score: u32,
    lives: u8,
    time_remaining_secs: u32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    end_reason: Option<EndReason>,
}

impl SessionStore {
    /// Create an empty store. Call [`SessionStore::load_questions`] to begin.
    #[must_use]
    pub fn new(settings: SessionSettings, clock: Clock) -> Self {
        let lives = settings.starting_lives();
        Self {
            settings,
            clock,
            attempt_id: AttemptId::generate(),
            questions: Vec::new(),
            current: 0,
            selected: None,
            answers: Vec::new(),
            score: 0,
            lives,
            time_remaining_secs: 0,
            started_at: None,
            completed_at: None,
            end_reason: None,
        }
    }

    /// Replace the question sequence and start a fresh attempt on it.
    ///
    /// Intended to be called before or between attempts, never mid-question.
    pub fn load_questions(&mut self, questions: Vec<Question>) {
        self.questions = questions;
        self.attempt_id = AttemptId::generate();
        self.rewind();
        self.started_at = (!self.questions.is_empty()).then(|| self.clock.now());
        debug!(
            attempt = %self.attempt_id,
            questions = self.questions.len(),
            "questions loaded"
        );
    }

    /// Return to the pre-start condition, keeping the loaded questions.
    ///
    /// The retake is a new attempt with its own id. `started_at` is cleared and
    /// stamped again by the next selection or commit.
    pub fn reset(&mut self) {
        self.attempt_id = AttemptId::generate();
        self.rewind();
        self.started_at = None;
        debug!(attempt = %self.attempt_id, "attempt reset");
    }

    fn rewind(&mut self) {
        self.current = 0;
        self.selected = None;
        self.answers.clear();
        self.score = 0;
        self.lives = self.settings.starting_lives();
        self.time_remaining_secs = self.time_budget(0);
        self.completed_at = None;
        self.end_reason = None;
    }

    fn time_budget(&self, index: usize) -> u32 {
        self.questions
            .get(index)
            .and_then(Question::time_limit_secs)
            .unwrap_or(0)
    }

    fn ensure_started(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
    }

    /// Record a tentative selection for the current question. Last write wins.
    ///
    /// Has no effect on score or lives. Out-of-range indices and calls after
    /// completion are ignored.
    pub fn select_answer(&mut self, option_index: usize) {
        if self.is_complete() {
            debug!(option_index, "selection ignored: attempt completed");
            return;
        }
        let Some(question) = self.current_question() else {
            debug!(option_index, "selection ignored: no questions loaded");
            return;
        };
        if option_index >= question.option_count() {
            warn!(
                option_index,
                options = question.option_count(),
                question = self.current,
                "selection ignored: option out of range"
            );
            return;
        }

        self.ensure_started();
        self.selected = Some(option_index);
        trace!(question = self.current, option_index, "answer selected");
    }

    /// Commit the pending selection (or its absence) and move on.
    ///
    /// A correct selection adds the question's points; an incorrect explicit
    /// selection costs one life; no selection costs nothing.
    pub fn advance(&mut self) -> Transition {
        let answer = CommittedAnswer::from_selection(self.selected);
        self.commit(answer)
    }

    /// Leave the current question without scoring it. Never changes lives.
    pub fn skip(&mut self) -> Transition {
        self.commit(CommittedAnswer::Skipped)
    }

    fn commit(&mut self, answer: CommittedAnswer) -> Transition {
        if self.is_complete() || self.questions.is_empty() {
            return Transition::Ignored;
        }
        self.ensure_started();

        let index = self.current;
        let question = &self.questions[index];
        let correct = answer.option_index().map(|option| question.is_correct(option));
        let points = question.points();

        let mut lost_life = false;
        match correct {
            Some(true) => self.score = self.score.saturating_add(points),
            Some(false) => {
                self.lives = self.lives.saturating_sub(1);
                lost_life = true;
            }
            None => {}
        }
        self.answers.push(answer);
        debug!(
            question = index,
            answer = answer.code(),
            score = self.score,
            lives = self.lives,
            "answer committed"
        );

        if lost_life && self.lives == 0 && self.settings.lives_policy() == LivesPolicy::EndAttempt
        {
            return self.finish(EndReason::OutOfLives);
        }

        if index + 1 < self.questions.len() {
            self.current = index + 1;
            self.selected = None;
            self.time_remaining_secs = self.time_budget(self.current);
            Transition::Moved {
                from: index,
                to: self.current,
            }
        } else {
            self.finish(EndReason::Finished)
        }
    }

    fn finish(&mut self, reason: EndReason) -> Transition {
        self.selected = None;
        self.time_remaining_secs = 0;
        self.end_reason = Some(reason);
        self.completed_at = Some(self.clock.now());
        info!(
            attempt = %self.attempt_id,
            ?reason,
            score = self.score,
            lives = self.lives,
            answered = self.answers.len(),
            "attempt completed"
        );
        Transition::Completed { reason }
    }

    /// Mirror the countdown's remaining seconds for display.
    ///
    /// Never triggers a transition, even at zero; see [`SessionStore::expire`].
    pub fn tick(&mut self, remaining_secs: u32) {
        if self.is_complete() || self.questions.is_empty() {
            return;
        }
        self.time_remaining_secs = remaining_secs;
        trace!(question = self.current, remaining_secs, "tick");
    }

    /// Apply the configured [`ExpiryPolicy`] to the current question.
    ///
    /// Only takes effect once the mirrored time has reached zero. Untimed
    /// questions never expire.
    pub fn expire(&mut self) -> Transition {
        if self.is_complete() || self.current_time_limit().is_none() {
            return Transition::Ignored;
        }
        if self.time_remaining_secs > 0 {
            debug!(
                question = self.current,
                remaining = self.time_remaining_secs,
                "expiry ignored: time remains"
            );
            return Transition::Ignored;
        }
        let policy = self.settings.expiry_policy();
        debug!(question = self.current, ?policy, "question time expired");
        match policy {
            ExpiryPolicy::Advisory => Transition::Ignored,
            ExpiryPolicy::Advance => self.advance(),
            ExpiryPolicy::Skip => self.skip(),
        }
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        match (self.end_reason, self.started_at) {
            (Some(reason), _) => AttemptStatus::Completed(reason),
            (None, Some(_)) => AttemptStatus::InProgress,
            (None, None) => AttemptStatus::NotStarted,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.end_reason.is_some()
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Time budget of the question on screen, `None` when untimed or finished.
    #[must_use]
    pub fn current_time_limit(&self) -> Option<u32> {
        if self.is_complete() {
            return None;
        }
        self.current_question().and_then(Question::time_limit_secs)
    }

    #[must_use]
    pub fn selected_answer(&self) -> Option<usize> {
        self.selected
    }

    /// Committed answers, one per question already left, in order.
    #[must_use]
    pub fn answers(&self) -> &[CommittedAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn answer_codes(&self) -> Vec<i32> {
        self.answers.iter().map(|a| a.code()).collect()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.points()))
    }

    #[must_use]
    pub fn lives(&self) -> u8 {
        self.lives
    }

    #[must_use]
    pub fn is_out_of_lives(&self) -> bool {
        self.lives == 0
    }

    #[must_use]
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Informational time since the attempt started, frozen at completion.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        Some(match self.completed_at {
            Some(done) => (done - started).max(Duration::zero()),
            None => self.clock.elapsed_since(started),
        })
    }

    #[must_use]
    pub fn progress(&self) -> AttemptProgress {
        let total = self.questions.len();
        let answered = self.answers.len();
        AttemptProgress {
            total,
            answered,
            remaining: if self.is_complete() {
                0
            } else {
                total.saturating_sub(answered)
            },
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> AttemptSnapshot {
        AttemptSnapshot {
            attempt_id: self.attempt_id,
            status: self.status(),
            current_index: self.current,
            current_question_id: self.current_question().map(Question::id),
            total_questions: self.questions.len(),
            selected_answer: self.selected,
            score: self.score,
            max_score: self.max_score(),
            lives: self.lives,
            time_remaining_secs: self.time_remaining_secs,
            answers: self.answer_codes(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    /// Build the summary handed to the results collaborator.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` before the attempt is completed, or
    /// `SessionError::Summary` if the recorded state cannot be summarized.
    pub fn summary(&self) -> Result<AttemptSummary, SessionError> {
        let (Some(reason), Some(completed_at)) = (self.end_reason, self.completed_at) else {
            return Err(SessionError::NotComplete);
        };
        let started_at = self.started_at.unwrap_or(completed_at);
        Ok(AttemptSummary::from_attempt(
            self.attempt_id,
            started_at,
            completed_at,
            &self.questions,
            &self.answers,
            self.lives,
            reason,
        )?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
