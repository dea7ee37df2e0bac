#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::SessionError;
pub use sessions::{
    AttemptProgress, AttemptSnapshot, AttemptStatus, Countdown, CountdownTick, QuizLoopService,
    QuizSession, SessionStore, TickOutcome, Transition,
};
