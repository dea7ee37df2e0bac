mod countdown;
mod progress;
mod session;
mod store;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::{Countdown, CountdownTick};
pub use progress::{AttemptProgress, AttemptSnapshot, AttemptStatus};
pub use session::{QuizSession, TickOutcome};
pub use store::{SessionStore, Transition};
pub use workflow::QuizLoopService;
