use quiz_core::model::{Question, QuizId};
use storage::repository::AttemptResultId;
use tracing::debug;

use super::countdown::Countdown;
use super::progress::AttemptSnapshot;
use super::store::{SessionStore, Transition};

/// What a countdown tick did to the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Remaining time was mirrored into the store.
    Counted { remaining: u32 },
    /// Time ran out; `transition` is what the expiry policy did.
    Expired { transition: Transition },
}

/// A live attempt: the session store plus the countdown for the question on
/// screen.
///
/// Every call that moves the cursor stops the previous countdown before the
/// next one starts, so ticks for an old question never reach the store.
pub struct QuizSession {
    quiz_id: QuizId,
    store: SessionStore,
    countdown: Option<Countdown>,
    result_id: Option<AttemptResultId>,
}

impl QuizSession {
    /// Wrap a loaded store and start the countdown for its current question.
    ///
    /// # Panics
    ///
    /// Panics if the current question is timed and this is called outside a
    /// Tokio runtime.
    #[must_use]
    pub fn new(quiz_id: QuizId, store: SessionStore) -> Self {
        let mut session = Self {
            quiz_id,
            store,
            countdown: None,
            result_id: None,
        };
        session.restart_countdown();
        session
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn snapshot(&self) -> AttemptSnapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.store.is_complete()
    }

    /// True while a countdown is running for the current question.
    #[must_use]
    pub fn has_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    #[must_use]
    pub fn result_id(&self) -> Option<AttemptResultId> {
        self.result_id
    }

    pub(crate) fn set_result_id(&mut self, id: AttemptResultId) {
        self.result_id = Some(id);
    }

    pub fn select_answer(&mut self, option_index: usize) {
        self.store.select_answer(option_index);
    }

    pub fn advance(&mut self) -> Transition {
        let transition = self.store.advance();
        self.follow(transition);
        transition
    }

    pub fn skip(&mut self) -> Transition {
        let transition = self.store.skip();
        self.follow(transition);
        transition
    }

    /// Replace the questions and start over. Discards any persisted result id.
    pub fn load_questions(&mut self, questions: Vec<Question>) {
        self.stop_countdown();
        self.store.load_questions(questions);
        self.result_id = None;
        self.restart_countdown();
    }

    pub fn reset(&mut self) {
        self.stop_countdown();
        self.store.reset();
        self.result_id = None;
        self.restart_countdown();
    }

    /// Wait for the current countdown's next tick and apply it.
    ///
    /// Returns `None` immediately when no countdown is running (untimed
    /// question, time already spent, or attempt completed). Cancel safe, so it
    /// can sit in a `tokio::select!` next to user input.
    pub async fn next_tick(&mut self) -> Option<TickOutcome> {
        let countdown = self.countdown.as_mut()?;
        let Some(tick) = countdown.next_tick().await else {
            self.countdown = None;
            return None;
        };

        self.store.tick(tick.remaining);
        if !tick.is_expired() {
            return Some(TickOutcome::Counted {
                remaining: tick.remaining,
            });
        }

        self.countdown = None;
        let transition = self.store.expire();
        self.follow(transition);
        Some(TickOutcome::Expired { transition })
    }

    /// Stop the running countdown, if any. Further ticks are never delivered.
    pub fn stop_countdown(&mut self) {
        if let Some(mut countdown) = self.countdown.take() {
            countdown.stop();
        }
    }

    fn follow(&mut self, transition: Transition) {
        match transition {
            Transition::Moved { .. } => self.restart_countdown(),
            Transition::Completed { .. } => self.stop_countdown(),
            Transition::Ignored => {}
        }
    }

    fn restart_countdown(&mut self) {
        self.stop_countdown();
        let Some(seconds) = self.store.current_time_limit() else {
            return;
        };
        let index = self.store.current_index();
        self.countdown = Countdown::start(index, seconds, self.store.settings().tick_interval());
        debug!(quiz = %self.quiz_id, question = index, seconds, "question countdown armed");
    }
}
