//! Execution backend abstraction.
//!
//! The judging core talks to the sandboxed execution service exclusively
//! through [`ExecutionBackend`]. Callback-style or synchronous backends are
//! adapted to the same submit/poll contract; the dispatcher only ever sees a
//! handle it can poll.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use common::judge_request::JudgeRequest;
use common::judge_result::RawRunResult;

/// Opaque reference to a run accepted by the execution backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-side progress of a submitted run.
#[derive(Clone, Debug)]
pub enum PollStatus {
    /// Accepted, not yet started.
    Queued,
    /// Compile phase in progress.
    Compiling,
    /// Executing.
    Running,
    /// Finished; the raw result is ready for normalization.
    Finished(RawRunResult),
}

/// Failure talking to the execution backend.
///
/// Transience decides retry behavior: transient failures are absorbed by the
/// dispatcher's retry loop, permanent ones surface as `InternalError`.
/// Backend-reported compile/runtime errors are not failures at all; they
/// arrive as a [`PollStatus::Finished`] verdict.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, reset, or timed out before a response.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Non-success HTTP status.
    #[error("Backend returned HTTP {0}")]
    Http(u16),

    /// Response body did not match the expected wire shape.
    #[error("Malformed backend response: {0}")]
    Malformed(String),

    /// The backend rejected the request as invalid.
    #[error("Backend rejected request: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Whether retrying can plausibly help.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Http(code) => *code >= 500,
            Self::Malformed(_) | Self::Rejected(_) => false,
        }
    }
}

/// Sandboxed code-execution service.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Ship a (source, language, stdin) tuple for execution.
    async fn submit(&self, request: &JudgeRequest) -> Result<JobHandle, BackendError>;

    /// Check progress of a previously submitted run.
    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus, BackendError>;

    /// Service liveness probe.
    async fn health(&self) -> Result<(), BackendError>;
}
