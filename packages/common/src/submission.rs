use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::judge_result::JudgeOutcome;
use crate::language::Language;

/// Status of a submission during the judging lifecycle.
///
/// Transitions are monotonic: once a submission reaches a terminal state it
/// never moves again. The full table lives in [`SubmissionStatus::can_transition_to`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum SubmissionStatus {
    /// Waiting to be accepted by the dispatcher.
    Pending,
    /// Accepted for processing; compile phase in progress.
    Compiling,
    /// Compile succeeded (or language has no compile step); executing.
    Running,
    /// Backend returned a verdict within limits (pass or fail against expected output).
    Completed,
    /// Compile/runtime error, limit violation, timeout, cancellation, or backend failure.
    Failed,
}

impl SubmissionStatus {
    /// All possible status values.
    pub const ALL: &'static [SubmissionStatus] = &[
        Self::Pending,
        Self::Compiling,
        Self::Running,
        Self::Completed,
        Self::Failed,
    ];

    /// Returns true if no further transition is possible from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// Any non-terminal state may move to `Failed` (deadline expiry, backend
    /// exhaustion, cancellation). Terminal states accept nothing.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Compiling) => true,
            (Self::Compiling, Self::Running) => true,
            (Self::Running, Self::Completed) => true,
            (from, Self::Failed) if !from.is_terminal() => true,
            _ => false,
        }
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Compiling => "Compiling",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            SubmissionStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for SubmissionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Compiling" => Ok(Self::Compiling),
            "Running" => Ok(Self::Running),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// Attempted state-machine violation.
///
/// Surfaced as a local error; a terminal result is never silently overwritten.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status transition from {from} to {to}")]
pub struct TransitionError {
    pub from: SubmissionStatus,
    pub to: SubmissionStatus,
}

/// One attempt to run user code against a problem.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    /// Submission identifier.
    pub id: Uuid,
    /// Problem being attempted.
    pub problem_id: Uuid,
    /// Submitting user.
    pub user_id: Uuid,
    /// Source code as submitted.
    pub source_code: String,
    /// Language the source is written in.
    pub language: Language,
    /// Current lifecycle status.
    pub status: SubmissionStatus,
    /// Normalized judging outcome, set on the terminal transition.
    pub result: Option<JudgeOutcome>,
    /// Wall time of the judged run in milliseconds, set once terminal.
    pub execution_time_ms: Option<u64>,
    /// When the submission was created.
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Create a new submission in `Pending`.
    pub fn new(problem_id: Uuid, user_id: Uuid, source_code: String, language: Language) -> Self {
        Self {
            id: Uuid::new_v4(),
            problem_id,
            user_id,
            source_code,
            language,
            status: SubmissionStatus::Pending,
            result: None,
            execution_time_ms: None,
            created_at: Utc::now(),
        }
    }

    /// Move to `next`, enforcing the state machine.
    pub fn transition(&mut self, next: SubmissionStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Transition to the outcome's terminal status and record the result.
    ///
    /// Execution time is only ever set here, on the terminal transition.
    pub fn finalize(&mut self, outcome: JudgeOutcome) -> Result<(), TransitionError> {
        let next = outcome.verdict.final_status();
        self.transition(next)?;
        self.execution_time_ms = outcome.execution_time_ms;
        self.result = Some(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Verdict;

    fn submission() -> Submission {
        Submission::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "print(42)".into(),
            Language::Python,
        )
    }

    #[test]
    fn test_transition_table() {
        use SubmissionStatus::*;

        let allowed = [
            (Pending, Compiling),
            (Pending, Failed),
            (Compiling, Running),
            (Compiling, Failed),
            (Running, Completed),
            (Running, Failed),
        ];

        for from in SubmissionStatus::ALL {
            for to in SubmissionStatus::ALL {
                let expected = allowed.contains(&(*from, *to));
                assert_eq!(
                    from.can_transition_to(*to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_accept_nothing() {
        for from in [SubmissionStatus::Completed, SubmissionStatus::Failed] {
            for to in SubmissionStatus::ALL {
                assert!(!from.can_transition_to(*to));
            }
        }
    }

    #[test]
    fn test_happy_path() {
        let mut sub = submission();
        sub.transition(SubmissionStatus::Compiling).unwrap();
        sub.transition(SubmissionStatus::Running).unwrap();
        sub.finalize(JudgeOutcome::verdict_only(Verdict::Accepted))
            .unwrap();
        assert_eq!(sub.status, SubmissionStatus::Completed);
        assert!(sub.result.is_some());
    }

    #[test]
    fn test_finalize_rejected_when_terminal() {
        let mut sub = submission();
        sub.transition(SubmissionStatus::Failed).unwrap();
        let first = sub.result.clone();

        let err = sub
            .finalize(JudgeOutcome::verdict_only(Verdict::Accepted))
            .unwrap_err();
        assert_eq!(err.from, SubmissionStatus::Failed);
        assert_eq!(err.to, SubmissionStatus::Completed);
        // Stored result untouched
        assert_eq!(sub.result.is_some(), first.is_some());
    }

    #[test]
    fn test_wrong_answer_completes() {
        let mut sub = submission();
        sub.transition(SubmissionStatus::Compiling).unwrap();
        sub.transition(SubmissionStatus::Running).unwrap();
        sub.finalize(JudgeOutcome::verdict_only(Verdict::WrongAnswer))
            .unwrap();
        assert_eq!(sub.status, SubmissionStatus::Completed);
    }

    #[test]
    fn test_execution_time_only_set_on_finalize() {
        let mut sub = submission();
        sub.transition(SubmissionStatus::Compiling).unwrap();
        assert_eq!(sub.execution_time_ms, None);

        sub.transition(SubmissionStatus::Running).unwrap();
        assert_eq!(sub.execution_time_ms, None);

        let mut outcome = JudgeOutcome::verdict_only(Verdict::Accepted);
        outcome.execution_time_ms = Some(42);
        sub.finalize(outcome).unwrap();
        assert_eq!(sub.execution_time_ms, Some(42));
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "Running".parse::<SubmissionStatus>().unwrap(),
            SubmissionStatus::Running
        );
        assert!("Judged".parse::<SubmissionStatus>().is_err());
    }
}
