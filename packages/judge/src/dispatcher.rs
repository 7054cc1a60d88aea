//! Submission dispatcher.
//!
//! One logical dispatcher coordinates every outstanding judging attempt. A
//! fixed-size slot pool bounds concurrent backend calls (waiters are served
//! in FIFO order), transient backend failures are absorbed by a bounded
//! exponential backoff loop, and every submission carries a wall-clock
//! deadline that forces a terminal state no matter what the backend does.
//!
//! The dispatcher is the only mutator of submission records: transitions go
//! through the store, which enforces the status state machine, so a late
//! backend result for a cancelled or timed-out submission is rejected there
//! and discarded here.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use common::config::{BackendAppConfig, DispatchAppConfig};
use common::judge_request::JudgeRequest;
use common::judge_result::{BackendVerdict, JudgeOutcome};
use common::retry::{RetryAttempt, RetryPolicy};
use common::submission::{Submission, SubmissionStatus};

use crate::backend::{BackendError, ExecutionBackend, PollStatus};
use crate::error::{JudgeError, Result};
use crate::normalize::normalize;
use crate::problems::{ProblemProvider, ProblemSpec};
use crate::store::{StoreError, SubmissionStore};

/// Dispatcher tuning knobs.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Slot pool size: maximum submissions judged concurrently.
    pub max_concurrent: usize,
    /// Wall-clock deadline for one whole submission, slot wait included.
    pub deadline: Duration,
    /// Interval between backend polls.
    pub poll_interval: Duration,
    /// Backoff policy for transient backend failures.
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            deadline: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            retry: RetryPolicy::default(),
        }
    }
}

impl DispatchConfig {
    /// Build from the app-level config sections.
    pub fn from_app(dispatch: &DispatchAppConfig, backend: &BackendAppConfig) -> Self {
        Self {
            max_concurrent: dispatch.max_concurrent,
            deadline: Duration::from_millis(dispatch.deadline_ms),
            poll_interval: Duration::from_millis(backend.poll_interval_ms),
            retry: dispatch.retry_policy(),
        }
    }
}

/// Removes the in-flight entry when a judging attempt ends, however it ends.
struct InflightGuard<'a> {
    inflight: &'a DashMap<Uuid, CancellationToken>,
    id: Uuid,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.inflight.remove(&self.id);
    }
}

/// Coordinates judging attempts against the execution backend.
pub struct Dispatcher {
    backend: Arc<dyn ExecutionBackend>,
    store: Arc<dyn SubmissionStore>,
    problems: Arc<dyn ProblemProvider>,
    slots: Arc<Semaphore>,
    inflight: DashMap<Uuid, CancellationToken>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        store: Arc<dyn SubmissionStore>,
        problems: Arc<dyn ProblemProvider>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            backend,
            store,
            problems,
            slots: Arc::new(Semaphore::new(config.max_concurrent)),
            inflight: DashMap::new(),
            config,
        }
    }

    /// Judge one submission end to end.
    ///
    /// Returns once the submission is terminal (or the deadline forced it
    /// there). Dispatching a terminal submission is a no-op that returns the
    /// stored record unchanged; dispatching a submission that is mid-judging
    /// is rejected, so at most one attempt is ever active per id.
    pub async fn dispatch(&self, id: Uuid) -> Result<Submission> {
        let submission = self.store.get_submission(id).await?;
        if submission.status.is_terminal() {
            debug!(
                submission_id = %id,
                status = %submission.status,
                "Submission already terminal, dispatch is a no-op"
            );
            return Ok(submission);
        }
        if submission.status != SubmissionStatus::Pending {
            return Err(JudgeError::AlreadyActive(id));
        }

        let cancel = CancellationToken::new();
        match self.inflight.entry(id) {
            Entry::Occupied(_) => return Err(JudgeError::AlreadyActive(id)),
            Entry::Vacant(slot) => {
                slot.insert(cancel.clone());
            }
        }
        let _guard = InflightGuard {
            inflight: &self.inflight,
            id,
        };

        self.judge_submission(&submission, &cancel).await
    }

    /// Cancel a submission.
    ///
    /// Valid while `Pending` or `Compiling`; best-effort while `Running` (the
    /// backend call is not guaranteed to stop, but the record is marked
    /// `Failed`/`Cancelled` immediately and any late result is discarded).
    pub async fn cancel(&self, id: Uuid) -> Result<Submission> {
        let updated = self
            .store
            .update_submission(
                id,
                SubmissionStatus::Failed,
                Some(JudgeOutcome::cancelled()),
                None,
            )
            .await?;

        if let Some(entry) = self.inflight.get(&id) {
            entry.value().cancel();
        }
        info!(submission_id = %id, "Submission cancelled by owner");
        Ok(updated)
    }

    /// Judge a request without persisting anything.
    ///
    /// Shares the slot pool, retry policy, and deadline with persisted
    /// dispatch; backs the run-without-submitting flow.
    pub async fn run_ephemeral(
        &self,
        request: &JudgeRequest,
        expected_output: Option<&str>,
    ) -> Result<JudgeOutcome> {
        if request.source_code.trim().is_empty() {
            return Err(JudgeError::Validation(
                "Source code must not be empty".into(),
            ));
        }

        let deadline = tokio::time::sleep(self.config.deadline);
        tokio::pin!(deadline);

        let attempt = async {
            let permit = self.acquire_slot().await?;
            let outcome = self.execute(None, request, expected_output).await?;
            Ok::<_, JudgeError>((permit, outcome))
        };

        tokio::select! {
            _ = &mut deadline => {
                warn!(request_id = %request.id, "Ephemeral run deadline elapsed");
                Ok(JudgeOutcome::timeout())
            }
            res = attempt => match res {
                Ok((_permit, outcome)) => Ok(outcome),
                Err(err) => outcome_from_backend_failure(err),
            },
        }
    }

    /// Liveness of the execution backend, for health endpoints.
    pub async fn backend_health(&self) -> std::result::Result<(), BackendError> {
        self.backend.health().await
    }

    async fn judge_submission(
        &self,
        submission: &Submission,
        cancel: &CancellationToken,
    ) -> Result<Submission> {
        let id = submission.id;
        let deadline = tokio::time::sleep(self.config.deadline);
        tokio::pin!(deadline);

        let attempt = async {
            let permit = self.acquire_slot().await?;

            let ProblemSpec {
                input,
                expected_output,
                limits,
                ..
            } = match self.problems.fetch(submission.problem_id).await {
                Ok(spec) => spec,
                Err(err) => {
                    error!(submission_id = %id, error = %err, "Problem lookup failed");
                    let outcome =
                        JudgeOutcome::internal_error(format!("Problem lookup failed: {err}"));
                    return Ok((permit, outcome));
                }
            };

            let request =
                JudgeRequest::new(submission.source_code.clone(), submission.language, input, limits);

            self.store
                .update_submission(id, SubmissionStatus::Compiling, None, None)
                .await?;
            info!(
                submission_id = %id,
                language = %submission.language,
                "Submission accepted for judging"
            );

            let outcome = match self.execute(Some(id), &request, Some(&expected_output)).await {
                Ok(outcome) => outcome,
                Err(err) => outcome_from_backend_failure(err)?,
            };
            Ok::<_, JudgeError>((permit, outcome))
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(submission_id = %id, "In-flight attempt dropped after cancellation");
                self.store.get_submission(id).await.map_err(Into::into)
            }
            _ = &mut deadline => {
                warn!(
                    submission_id = %id,
                    deadline_ms = self.config.deadline.as_millis() as u64,
                    "Submission deadline elapsed, forcing failure"
                );
                self.finalize(id, JudgeOutcome::timeout()).await
            }
            res = attempt => match res {
                Ok((_permit, outcome)) => self.finalize(id, outcome).await,
                // The owner cancelled while we were mid-transition; the record
                // is already terminal, so the attempt's write was rejected.
                Err(JudgeError::Store(StoreError::Transition(_))) if cancel.is_cancelled() => {
                    self.store.get_submission(id).await.map_err(Into::into)
                }
                Err(err) => Err(err),
            },
        }
    }

    /// Submit and poll one request, driving the `Running` transition for
    /// persisted submissions.
    async fn execute(
        &self,
        persisted: Option<Uuid>,
        request: &JudgeRequest,
        expected_output: Option<&str>,
    ) -> Result<JudgeOutcome> {
        let handle = self
            .with_retry("submit", || self.backend.submit(request))
            .await?;
        debug!(request_id = %request.id, handle = %handle, "Submitted to execution backend");

        let mut running = false;
        loop {
            let status = self
                .with_retry("poll", || self.backend.poll(&handle))
                .await?;

            match status {
                PollStatus::Queued | PollStatus::Compiling => {}
                PollStatus::Running => {
                    if !running {
                        running = true;
                        if let Some(id) = persisted {
                            self.store
                                .update_submission(id, SubmissionStatus::Running, None, None)
                                .await?;
                        }
                    }
                }
                PollStatus::Finished(raw) => {
                    // A compile failure terminates from Compiling; everything
                    // else passed the compile phase and finalizes via Running.
                    if !running && raw.verdict != BackendVerdict::CompileError {
                        if let Some(id) = persisted {
                            self.store
                                .update_submission(id, SubmissionStatus::Running, None, None)
                                .await?;
                        }
                    }
                    return Ok(normalize(raw, expected_output, request.limits));
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Retry a backend call on transient failures, up to the retry ceiling.
    async fn with_retry<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, BackendError>>,
    {
        let mut attempt: u8 = 0;
        let mut history: Vec<RetryAttempt> = Vec::new();
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    attempt += 1;
                    history.push(RetryAttempt::new(attempt, err.to_string()));
                    if !self.config.retry.allows(attempt) {
                        return Err(JudgeError::BackendExhausted {
                            attempts: attempt,
                            source: err,
                            history,
                        });
                    }
                    let delay = self.config.retry.backoff(attempt);
                    warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient backend failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(JudgeError::Backend(err)),
            }
        }
    }

    /// Apply the outcome's terminal transition and record the result.
    async fn finalize(&self, id: Uuid, outcome: JudgeOutcome) -> Result<Submission> {
        let status = outcome.verdict.final_status();
        let execution_time_ms = outcome.execution_time_ms;
        let verdict = outcome.verdict;

        let updated = self
            .store
            .update_submission(id, status, Some(outcome), execution_time_ms)
            .await?;
        info!(
            submission_id = %id,
            status = %status,
            verdict = %verdict,
            execution_time_ms,
            "Submission judged"
        );
        Ok(updated)
    }

    async fn acquire_slot(&self) -> Result<tokio::sync::OwnedSemaphorePermit> {
        self.slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| JudgeError::Internal("dispatcher slot pool closed".into()))
    }
}

/// Degrade a backend failure into the `InternalError` outcome recorded on the
/// submission; non-backend errors propagate unchanged.
fn outcome_from_backend_failure(err: JudgeError) -> Result<JudgeOutcome> {
    match err {
        JudgeError::BackendExhausted {
            attempts,
            source,
            history,
        } => {
            error!(attempts, retry_count = history.len(), error = %source, "Backend retries exhausted");
            let attempt_log = history
                .iter()
                .map(|a| format!("#{}: {}", a.attempt, a.error))
                .collect::<Vec<_>>()
                .join("; ");
            Ok(JudgeOutcome::internal_error(format!(
                "Execution backend failed after {attempts} attempts ({attempt_log})"
            )))
        }
        JudgeError::Backend(source) => {
            error!(error = %source, "Permanent backend failure");
            Ok(JudgeOutcome::internal_error(format!(
                "Execution backend error: {source}"
            )))
        }
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_app_sections() {
        let dispatch = DispatchAppConfig::default();
        let backend = BackendAppConfig::default();
        let config = DispatchConfig::from_app(&dispatch, &backend);

        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.deadline, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_backend_failure_degrades_to_internal_error() {
        let outcome = outcome_from_backend_failure(JudgeError::Backend(BackendError::Http(404)))
            .unwrap();
        assert_eq!(outcome.verdict, common::Verdict::InternalError);

        let history = (1..=4)
            .map(|n| RetryAttempt::new(n, "connection refused"))
            .collect();
        let outcome = outcome_from_backend_failure(JudgeError::BackendExhausted {
            attempts: 4,
            source: BackendError::Unreachable("connection refused".into()),
            history,
        })
        .unwrap();
        assert!(outcome.summary.contains("4 attempts"));
        assert!(outcome.summary.contains("#4: "));
    }

    #[test]
    fn test_non_backend_errors_propagate() {
        let id = Uuid::new_v4();
        let err = outcome_from_backend_failure(JudgeError::AlreadyActive(id)).unwrap_err();
        assert!(matches!(err, JudgeError::AlreadyActive(_)));
    }
}
