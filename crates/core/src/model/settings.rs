use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Lives a student starts an attempt with unless configured otherwise.
pub const DEFAULT_LIVES: u8 = 3;
/// Upper bound accepted for `starting_lives`.
pub const MAX_LIVES: u8 = 9;
/// Default countdown period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("starting lives must be between 1 and 9")]
    InvalidStartingLives,

    #[error("tick interval must be > 0")]
    InvalidTickInterval,
}

//
// ─── POLICIES ──────────────────────────────────────────────────────────────────
//

/// What happens when lives reach zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivesPolicy {
    /// Lives are tracked and displayed; the attempt continues at zero.
    #[default]
    Track,
    /// A commit that drops lives to zero ends the attempt.
    EndAttempt,
}

/// What happens when a question's countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Expiry is display-only.
    #[default]
    Advisory,
    /// Expiry commits the pending selection, as `advance` would.
    Advance,
    /// Expiry leaves the question as `skip` would.
    Skip,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Per-attempt engine configuration.
///
/// The defaults reproduce the base engine: three lives, zero lives tracked
/// but not enforced, advisory countdown ticking once per second.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    starting_lives: u8,
    lives_policy: LivesPolicy,
    expiry_policy: ExpiryPolicy,
    tick_interval: Duration,
}

impl SessionSettings {
    /// Creates custom session settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if `starting_lives` is outside `1..=MAX_LIVES`
    /// or `tick_interval` is zero.
    pub fn new(
        starting_lives: u8,
        lives_policy: LivesPolicy,
        expiry_policy: ExpiryPolicy,
        tick_interval: Duration,
    ) -> Result<Self, SettingsError> {
        if !(1..=MAX_LIVES).contains(&starting_lives) {
            return Err(SettingsError::InvalidStartingLives);
        }
        if tick_interval.is_zero() {
            return Err(SettingsError::InvalidTickInterval);
        }

        Ok(Self {
            starting_lives,
            lives_policy,
            expiry_policy,
            tick_interval,
        })
    }

    #[must_use]
    pub fn with_lives_policy(mut self, policy: LivesPolicy) -> Self {
        self.lives_policy = policy;
        self
    }

    #[must_use]
    pub fn with_expiry_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.expiry_policy = policy;
        self
    }

    #[must_use]
    pub fn starting_lives(&self) -> u8 {
        self.starting_lives
    }

    #[must_use]
    pub fn lives_policy(&self) -> LivesPolicy {
        self.lives_policy
    }

    #[must_use]
    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry_policy
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            starting_lives: DEFAULT_LIVES,
            lives_policy: LivesPolicy::default(),
            expiry_policy: ExpiryPolicy::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}
