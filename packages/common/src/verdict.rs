use serde::{Deserialize, Serialize};
use std::fmt;

use crate::submission::SubmissionStatus;

/// Canonical judging outcome for a submission.
///
/// The normalizer maps backend-specific verdict codes onto the first seven
/// variants; `Timeout` and `Cancelled` are issued by the dispatcher when a
/// submission is forced to a terminal state without a backend verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Verdict {
    /// Output matched the expected output within limits.
    Accepted,
    /// Program ran cleanly but output did not match.
    WrongAnswer,
    /// Failed to compile.
    CompileError,
    /// Program crashed or exited with a non-zero code.
    RuntimeError,
    /// Exceeded the per-run CPU time limit.
    TimeLimitExceeded,
    /// Exceeded the per-run memory limit.
    MemoryLimitExceeded,
    /// Judge-side fault (backend malfunction, malformed response).
    InternalError,
    /// The whole-submission wall-clock deadline elapsed.
    Timeout,
    /// Cancelled by the submission owner.
    Cancelled,
}

impl Verdict {
    /// All verdict values.
    pub const ALL: &'static [Verdict] = &[
        Self::Accepted,
        Self::WrongAnswer,
        Self::CompileError,
        Self::RuntimeError,
        Self::TimeLimitExceeded,
        Self::MemoryLimitExceeded,
        Self::InternalError,
        Self::Timeout,
        Self::Cancelled,
    ];

    /// Returns true if this is a successful verdict.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    /// The terminal submission status this verdict finalizes into.
    ///
    /// A verdict reached within limits (`Accepted` or `WrongAnswer`) completes
    /// the submission; everything else fails it.
    pub fn final_status(&self) -> SubmissionStatus {
        match self {
            Self::Accepted | Self::WrongAnswer => SubmissionStatus::Completed,
            _ => SubmissionStatus::Failed,
        }
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "WrongAnswer",
            Self::CompileError => "CompileError",
            Self::RuntimeError => "RuntimeError",
            Self::TimeLimitExceeded => "TimeLimitExceeded",
            Self::MemoryLimitExceeded => "MemoryLimitExceeded",
            Self::InternalError => "InternalError",
            Self::Timeout => "Timeout",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_roundtrip() {
        for verdict in Verdict::ALL {
            let json = serde_json::to_string(verdict).unwrap();
            let parsed: Verdict = serde_json::from_str(&json).unwrap();
            assert_eq!(*verdict, parsed);
        }
    }

    #[test]
    fn test_final_status_mapping() {
        assert_eq!(Verdict::Accepted.final_status(), SubmissionStatus::Completed);
        assert_eq!(
            Verdict::WrongAnswer.final_status(),
            SubmissionStatus::Completed
        );
        for verdict in [
            Verdict::CompileError,
            Verdict::RuntimeError,
            Verdict::TimeLimitExceeded,
            Verdict::MemoryLimitExceeded,
            Verdict::InternalError,
            Verdict::Timeout,
            Verdict::Cancelled,
        ] {
            assert_eq!(verdict.final_status(), SubmissionStatus::Failed);
        }
    }
}
