use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use common::judge_request::JudgeRequest;
use common::judge_result::JudgeOutcome;
use judge::store::NewSubmission;

use crate::error::{AppError, ErrorBody};
use crate::models::judge::*;
use crate::state::AppState;

/// Run code against a problem without persisting anything.
#[utoipa::path(
    post,
    path = "/problems/{id}/run",
    tag = "Judge",
    params(("id" = Uuid, Path, description = "Problem id")),
    request_body = RunRequest,
    responses(
        (status = 200, description = "Run outcome", body = JudgeOutcome),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Problem not found", body = ErrorBody),
    )
)]
#[instrument(skip(state, req), fields(problem_id = %problem_id))]
pub async fn run_code(
    State(state): State<AppState>,
    Path(problem_id): Path<Uuid>,
    Json(req): Json<RunRequest>,
) -> Result<Json<JudgeOutcome>, AppError> {
    let language = validate_source(&req.source_code, &req.language)?;
    let problem = state.problems.fetch(problem_id).await?;

    // With custom stdin there is no oracle: the caller just wants the output.
    let (stdin, expected) = match req.stdin {
        Some(custom) => (custom, None),
        None => (
            problem.input.clone(),
            Some(problem.expected_output.as_str()),
        ),
    };

    let request = JudgeRequest::new(req.source_code, language, stdin, problem.limits);
    let outcome = state.dispatcher.run_ephemeral(&request, expected).await?;

    info!(verdict = %outcome.verdict, "Ephemeral run finished");
    Ok(Json(outcome))
}

/// Submit code for persisted judging.
#[utoipa::path(
    post,
    path = "/problems/{id}/submit",
    tag = "Judge",
    params(("id" = Uuid, Path, description = "Problem id")),
    request_body = SubmitRequest,
    responses(
        (status = 202, description = "Submission accepted for judging", body = SubmitResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Problem not found", body = ErrorBody),
    )
)]
#[instrument(skip(state, req), fields(problem_id = %problem_id))]
pub async fn submit_code(
    State(state): State<AppState>,
    Path(problem_id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let language = validate_source(&req.source_code, &req.language)?;
    // Reject unknown problems before creating a record.
    state.problems.fetch(problem_id).await?;

    let submission = state
        .store
        .create_submission(NewSubmission {
            problem_id,
            user_id: req.user_id,
            source_code: req.source_code,
            language,
        })
        .await?;

    let dispatcher = state.dispatcher.clone();
    let id = submission.id;
    tokio::spawn(async move {
        if let Err(err) = dispatcher.dispatch(id).await {
            error!(submission_id = %id, error = %err, "Background judging failed");
        }
    });

    info!(submission_id = %id, "Submission accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            id: submission.id,
            status: submission.status,
        }),
    ))
}

/// Fetch a submission record.
#[utoipa::path(
    get,
    path = "/submissions/{id}",
    tag = "Judge",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission details", body = SubmissionResponse),
        (status = 404, description = "Submission not found", body = ErrorBody),
    )
)]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = state.store.get_submission(id).await?;
    Ok(Json(submission.into()))
}

/// Cancel a submission.
#[utoipa::path(
    post,
    path = "/submissions/{id}/cancel",
    tag = "Judge",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission cancelled", body = SubmissionResponse),
        (status = 404, description = "Submission not found", body = ErrorBody),
        (status = 409, description = "Submission already terminal", body = ErrorBody),
    )
)]
#[instrument(skip(state))]
pub async fn cancel_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = state.dispatcher.cancel(id).await?;
    Ok(Json(submission.into()))
}

/// Service and execution backend liveness.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse),
        (status = 503, description = "Execution backend unreachable", body = ErrorBody),
    )
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    if let Err(err) = state.dispatcher.backend_health().await {
        warn!(error = %err, "Execution backend health check failed");
        return Err(AppError::BackendUnavailable(format!(
            "Execution backend unreachable: {err}"
        )));
    }
    Ok(Json(HealthResponse {
        status: "ok",
        backend: "reachable",
    }))
}
