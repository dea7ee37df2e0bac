//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::AttemptSummaryError;
use storage::repository::StorageError;

/// Errors emitted by the attempt workflow.
///
/// The session store itself never fails; these come from loading quizzes,
/// summarizing finished attempts and persisting results.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz has no questions")]
    Empty,
    #[error("attempt is not complete yet")]
    NotComplete,
    #[error(transparent)]
    Summary(#[from] AttemptSummaryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
