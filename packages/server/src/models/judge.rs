use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::judge_result::JudgeOutcome;
use common::language::Language;
use common::submission::{Submission, SubmissionStatus};

use crate::error::AppError;

/// Maximum source size in bytes.
pub const DEFAULT_MAX_SOURCE_SIZE: usize = 1_048_576; // 1 MB

/// Request body for an ephemeral run (nothing is persisted).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RunRequest {
    /// Source code to run.
    #[schema(example = "print(input())")]
    pub source_code: String,
    /// Programming language (e.g., "python", "cpp").
    #[schema(example = "python")]
    pub language: String,
    /// Custom stdin. When omitted the problem's sample input is used and the
    /// output is judged against the problem's expected output.
    pub stdin: Option<String>,
}

/// Request body for a persisted submission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SubmitRequest {
    /// Source code to judge.
    #[schema(example = "print(input())")]
    pub source_code: String,
    /// Programming language (e.g., "python", "cpp").
    #[schema(example = "python")]
    pub language: String,
    /// Submitting user, as resolved by the authenticating gateway.
    pub user_id: Uuid,
}

/// Response for an accepted submission.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    /// Submission id to poll via `GET /submissions/{id}`.
    pub id: Uuid,
    pub status: SubmissionStatus,
}

/// Full submission details.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub problem_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "python")]
    pub language: Language,
    pub status: SubmissionStatus,
    /// Judge outcome if judging is complete, null otherwise.
    pub result: Option<JudgeOutcome>,
    /// Wall time of the judged run in milliseconds, null until terminal.
    #[schema(example = 17)]
    pub execution_time_ms: Option<u64>,
    #[schema(example = "2026-08-07T14:30:00Z")]
    pub created_at: DateTime<Utc>,
}

impl From<Submission> for SubmissionResponse {
    fn from(sub: Submission) -> Self {
        Self {
            id: sub.id,
            problem_id: sub.problem_id,
            user_id: sub.user_id,
            language: sub.language,
            status: sub.status,
            result: sub.result,
            execution_time_ms: sub.execution_time_ms,
            created_at: sub.created_at,
        }
    }
}

/// Service liveness report.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Execution backend reachability.
    #[schema(example = "reachable")]
    pub backend: &'static str,
}

/// Validate source and language shared by run and submit requests.
pub fn validate_source(source_code: &str, language: &str) -> Result<Language, AppError> {
    if source_code.trim().is_empty() {
        return Err(AppError::Validation("Source code must not be empty".into()));
    }
    if source_code.len() > DEFAULT_MAX_SOURCE_SIZE {
        return Err(AppError::Validation(format!(
            "Source size ({} bytes) exceeds maximum ({} bytes)",
            source_code.len(),
            DEFAULT_MAX_SOURCE_SIZE
        )));
    }
    language
        .parse::<Language>()
        .map_err(|e| AppError::Validation(e.to_string()))
}
