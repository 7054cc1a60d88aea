use serde::{Deserialize, Serialize};

use crate::verdict::Verdict;

/// Verdict class as reported by the execution backend, before normalization.
///
/// `Ok` means the program ran to completion within limits; whether that is
/// `Accepted` or `WrongAnswer` is decided by the normalizer, not the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendVerdict {
    Ok,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    InternalError,
}

/// Raw result of one run as reported by the execution backend.
///
/// Transient: owned by the dispatcher until normalized into a [`JudgeOutcome`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawRunResult {
    /// Backend-reported verdict class.
    pub verdict: BackendVerdict,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Compiler output, if the backend ran a compile phase.
    pub compile_output: Option<String>,
    /// Process exit code, if the program ran.
    pub exit_code: Option<i32>,
    /// Wall time of the run in milliseconds.
    pub wall_time_ms: Option<u64>,
    /// Peak memory in kilobytes.
    pub memory_kb: Option<u64>,
}

/// Normalized judging outcome written back to the submission record.
#[derive(Clone, Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct JudgeOutcome {
    /// Canonical verdict.
    pub verdict: Verdict,
    /// Human-readable result summary.
    pub summary: String,
    /// Wall time of the run in milliseconds.
    pub execution_time_ms: Option<u64>,
    /// Peak memory in kilobytes.
    pub memory_kb: Option<u64>,
    /// Program stdout (absent when nothing ran).
    pub stdout: Option<String>,
    /// Program stderr.
    pub stderr: Option<String>,
    /// Compiler output (only for compile errors).
    pub compile_output: Option<String>,
}

impl JudgeOutcome {
    /// Outcome carrying only a verdict and its default summary.
    pub fn verdict_only(verdict: Verdict) -> Self {
        Self {
            verdict,
            summary: verdict.as_str().to_string(),
            execution_time_ms: None,
            memory_kb: None,
            stdout: None,
            stderr: None,
            compile_output: None,
        }
    }

    /// Outcome for a judge-side fault.
    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::InternalError,
            summary: detail.into(),
            execution_time_ms: None,
            memory_kb: None,
            stdout: None,
            stderr: None,
            compile_output: None,
        }
    }

    /// Outcome for a submission whose wall-clock deadline elapsed.
    pub fn timeout() -> Self {
        Self {
            verdict: Verdict::Timeout,
            summary: "Submission deadline elapsed before judging finished".into(),
            execution_time_ms: None,
            memory_kb: None,
            stdout: None,
            stderr: None,
            compile_output: None,
        }
    }

    /// Outcome for an owner-cancelled submission.
    pub fn cancelled() -> Self {
        Self {
            verdict: Verdict::Cancelled,
            summary: "Cancelled by the submission owner".into(),
            execution_time_ms: None,
            memory_kb: None,
            stdout: None,
            stderr: None,
            compile_output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(JudgeOutcome::timeout().verdict, Verdict::Timeout);
        assert_eq!(JudgeOutcome::cancelled().verdict, Verdict::Cancelled);

        let err = JudgeOutcome::internal_error("backend returned garbage");
        assert_eq!(err.verdict, Verdict::InternalError);
        assert_eq!(err.summary, "backend returned garbage");
    }

    #[test]
    fn test_raw_result_serde() {
        let raw = RawRunResult {
            verdict: BackendVerdict::Ok,
            stdout: "42\n".into(),
            stderr: String::new(),
            compile_output: None,
            exit_code: Some(0),
            wall_time_ms: Some(13),
            memory_kb: Some(1024),
        };
        let json = serde_json::to_string(&raw).unwrap();
        let parsed: RawRunResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.verdict, BackendVerdict::Ok);
        assert_eq!(parsed.stdout, "42\n");
    }
}
