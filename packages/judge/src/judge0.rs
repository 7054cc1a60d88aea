//! Judge0-compatible HTTP execution backend.
//!
//! Speaks the Judge0 submission API with `reqwest`. Both deployment modes are
//! normalized to the poll contract of [`ExecutionBackend`]: in asynchronous
//! mode (`wait=false`) polls hit `GET /submissions/{token}`; in synchronous
//! mode the completed result comes back from the submit call and is cached so
//! the first poll resolves immediately.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use async_trait::async_trait;
use common::config::BackendAppConfig;
use common::judge_request::JudgeRequest;
use common::judge_result::{BackendVerdict, RawRunResult};

use crate::backend::{BackendError, ExecutionBackend, JobHandle, PollStatus};

/// Judge0 status ids, per the public API.
mod status_id {
    pub const IN_QUEUE: u32 = 1;
    pub const PROCESSING: u32 = 2;
    pub const ACCEPTED: u32 = 3;
    pub const WRONG_ANSWER: u32 = 4;
    pub const TIME_LIMIT_EXCEEDED: u32 = 5;
    pub const COMPILATION_ERROR: u32 = 6;
    pub const RUNTIME_ERROR_FIRST: u32 = 7;
    pub const RUNTIME_ERROR_LAST: u32 = 12;
    pub const INTERNAL_ERROR: u32 = 13;
    pub const EXEC_FORMAT_ERROR: u32 = 14;
}

#[derive(Serialize)]
struct CreateSubmissionBody<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
    /// Seconds.
    cpu_time_limit: f64,
    /// Kilobytes.
    memory_limit: u64,
}

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

#[derive(Deserialize)]
struct StatusBody {
    id: u32,
    #[allow(dead_code)]
    description: Option<String>,
}

/// Judge0 reports `time` as a decimal-seconds string; some compatible
/// deployments send a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Num(f64),
    Text(String),
}

impl Seconds {
    fn to_ms(&self) -> Option<u64> {
        let secs = match self {
            Self::Num(n) => Some(*n),
            Self::Text(s) => s.parse::<f64>().ok(),
        }?;
        Some((secs * 1000.0).round() as u64)
    }
}

#[derive(Deserialize)]
struct SubmissionBody {
    status: StatusBody,
    token: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    message: Option<String>,
    exit_code: Option<i32>,
    time: Option<Seconds>,
    memory: Option<f64>,
}

/// Per-token state the client tracks between submit and the final poll.
struct JobMeta {
    /// Whether the language runs a compile phase (drives `Processing` mapping).
    compile_step: bool,
    /// Completed result from a synchronous submit, served on the next poll.
    cached: Option<RawRunResult>,
}

/// Client for a Judge0-compatible execution service.
pub struct Judge0Backend {
    http: reqwest::Client,
    base_url: String,
    synchronous: bool,
    // TODO: evict entries for handles abandoned after cancellation; they are
    // only removed today when the final poll consumes them.
    jobs: DashMap<String, JobMeta>,
}

impl Judge0Backend {
    pub fn new(config: &BackendAppConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| BackendError::Malformed(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            synchronous: config.synchronous,
            jobs: DashMap::new(),
        })
    }

    fn classify_transport(err: reqwest::Error) -> BackendError {
        if err.is_connect() || err.is_timeout() || err.is_request() {
            BackendError::Unreachable(err.to_string())
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Unreachable(err.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.is_server_error() {
            return Err(BackendError::Http(status.as_u16()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Rejected(format!("HTTP {status}: {body}")))
    }
}

#[async_trait]
impl ExecutionBackend for Judge0Backend {
    async fn submit(&self, request: &JudgeRequest) -> Result<JobHandle, BackendError> {
        let url = format!(
            "{}/submissions?base64_encoded=false&wait={}",
            self.base_url, self.synchronous
        );
        let body = CreateSubmissionBody {
            source_code: &request.source_code,
            language_id: request.language.backend_id(),
            stdin: &request.stdin,
            cpu_time_limit: request.limits.cpu_time_ms as f64 / 1000.0,
            memory_limit: request.limits.memory_kb,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::classify_transport)?;
        let response = Self::check_status(response).await?;

        let compile_step = request.language.has_compile_step();

        if self.synchronous {
            let parsed: SubmissionBody = response
                .json()
                .await
                .map_err(|e| BackendError::Malformed(e.to_string()))?;
            // Synchronous deployments may omit the token; mint a local one.
            let token = parsed
                .token
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let raw = finished_result(&parsed)?.ok_or_else(|| {
                BackendError::Malformed(format!(
                    "synchronous submit returned non-terminal status {}",
                    parsed.status.id
                ))
            })?;
            self.jobs.insert(
                token.clone(),
                JobMeta {
                    compile_step,
                    cached: Some(raw),
                },
            );
            debug!(token = %token, "Synchronous submission completed");
            return Ok(JobHandle(token));
        }

        let parsed: TokenBody = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        self.jobs.insert(
            parsed.token.clone(),
            JobMeta {
                compile_step,
                cached: None,
            },
        );
        debug!(token = %parsed.token, "Submission accepted by backend");
        Ok(JobHandle(parsed.token))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus, BackendError> {
        // Cached synchronous result: serve and forget.
        if let Some((_, meta)) = self
            .jobs
            .remove_if(&handle.0, |_, meta| meta.cached.is_some())
        {
            // remove_if guarantees cached is Some here
            if let Some(raw) = meta.cached {
                return Ok(PollStatus::Finished(raw));
            }
        }

        let url = format!("{}/submissions/{}?base64_encoded=false", self.base_url, handle);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(Self::classify_transport)?;
        let response = Self::check_status(response).await?;
        let parsed: SubmissionBody = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;

        match parsed.status.id {
            status_id::IN_QUEUE => Ok(PollStatus::Queued),
            status_id::PROCESSING => {
                let compile_step = self
                    .jobs
                    .get(&handle.0)
                    .map(|meta| meta.compile_step)
                    .unwrap_or(false);
                if compile_step {
                    Ok(PollStatus::Compiling)
                } else {
                    Ok(PollStatus::Running)
                }
            }
            _ => {
                let raw = finished_result(&parsed)?.ok_or_else(|| {
                    BackendError::Malformed(format!("unknown status id {}", parsed.status.id))
                })?;
                self.jobs.remove(&handle.0);
                Ok(PollStatus::Finished(raw))
            }
        }
    }

    async fn health(&self) -> Result<(), BackendError> {
        let url = format!("{}/about", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(Self::classify_transport)?;
        Self::check_status(response).await?;
        Ok(())
    }
}

/// Map a terminal Judge0 status body onto the raw result shape.
///
/// Returns `Ok(None)` for the non-terminal ids (queued/processing), which the
/// caller treats per context.
fn finished_result(body: &SubmissionBody) -> Result<Option<RawRunResult>, BackendError> {
    let verdict = match body.status.id {
        status_id::IN_QUEUE | status_id::PROCESSING => return Ok(None),
        // The backend-side accepted/wrong-answer split is ignored: output
        // comparison happens in the normalizer against our own oracle.
        status_id::ACCEPTED | status_id::WRONG_ANSWER => BackendVerdict::Ok,
        status_id::TIME_LIMIT_EXCEEDED => BackendVerdict::TimeLimitExceeded,
        status_id::COMPILATION_ERROR => BackendVerdict::CompileError,
        status_id::RUNTIME_ERROR_FIRST..=status_id::RUNTIME_ERROR_LAST => {
            BackendVerdict::RuntimeError
        }
        // Exec format errors are an execution-environment fault, not user code.
        status_id::INTERNAL_ERROR | status_id::EXEC_FORMAT_ERROR => BackendVerdict::InternalError,
        other => {
            return Err(BackendError::Malformed(format!(
                "unknown status id {other}"
            )));
        }
    };

    let mut stderr = body.stderr.clone().unwrap_or_default();
    if stderr.is_empty()
        && verdict == BackendVerdict::InternalError
        && let Some(message) = &body.message
    {
        stderr = message.clone();
    }

    Ok(Some(RawRunResult {
        verdict,
        stdout: body.stdout.clone().unwrap_or_default(),
        stderr,
        compile_output: body.compile_output.clone(),
        exit_code: body.exit_code,
        wall_time_ms: body.time.as_ref().and_then(Seconds::to_ms),
        memory_kb: body.memory.map(|m| m as u64),
    }))
}
