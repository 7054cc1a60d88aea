use thiserror::Error;

use crate::backend::BackendError;
use crate::store::StoreError;

/// Errors surfaced by the judging core.
///
/// A legitimate compile/runtime failure is a verdict, not an error: it flows
/// back through the normalizer as a [`common::judge_result::JudgeOutcome`]
/// and never appears here.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Malformed request, rejected before anything was dispatched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The submission already has a judging attempt in flight, or is not in
    /// a dispatchable state.
    #[error("Submission {0} already has an active judging attempt")]
    AlreadyActive(uuid::Uuid),

    /// Transient backend failure that survived the retry ceiling.
    #[error("Execution backend failed after {attempts} attempts: {source}")]
    BackendExhausted {
        attempts: u8,
        #[source]
        source: BackendError,
        /// Per-attempt failure records, surfaced in the failure summary.
        history: Vec<common::retry::RetryAttempt>,
    },

    /// Non-retryable backend failure.
    #[error("Execution backend error: {0}")]
    Backend(#[from] BackendError),

    /// Persistence gateway failure (including rejected state transitions).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Dispatcher-internal fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, JudgeError>;
