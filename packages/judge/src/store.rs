//! Persistence gateway.
//!
//! The judging core records every state transition through
//! [`SubmissionStore`] and never touches storage directly. Updates are
//! transition-validated against the stored record, so a late or duplicate
//! write can never overwrite a terminal result.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use common::judge_result::JudgeOutcome;
use common::language::Language;
use common::submission::{Submission, SubmissionStatus, TransitionError};

/// Errors from the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No submission with the given id.
    #[error("Submission {0} not found")]
    NotFound(Uuid),

    /// The update would violate the status state machine.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Underlying storage failure.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Fields required to create a submission record.
#[derive(Clone, Debug)]
pub struct NewSubmission {
    pub problem_id: Uuid,
    pub user_id: Uuid,
    pub source_code: String,
    pub language: Language,
}

/// Durable store for submission records.
///
/// Implementations are the only writers of durable state; the dispatcher
/// calls `update_submission` on every state transition.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Create a record in `Pending`.
    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, StoreError>;

    /// Fetch a record by id.
    async fn get_submission(&self, id: Uuid) -> Result<Submission, StoreError>;

    /// Apply a status transition, optionally recording the outcome and
    /// execution time on a terminal update.
    async fn update_submission(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        result: Option<JudgeOutcome>,
        execution_time_ms: Option<u64>,
    ) -> Result<Submission, StoreError>;
}

/// In-memory submission store.
///
/// Used by tests and the bundled server binary; a database-backed gateway
/// implements the same trait.
#[derive(Default)]
pub struct MemoryStore {
    submissions: DashMap<Uuid, Submission>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create_submission(&self, new: NewSubmission) -> Result<Submission, StoreError> {
        let submission = Submission::new(
            new.problem_id,
            new.user_id,
            new.source_code,
            new.language,
        );
        self.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Submission, StoreError> {
        self.submissions
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn update_submission(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        result: Option<JudgeOutcome>,
        execution_time_ms: Option<u64>,
    ) -> Result<Submission, StoreError> {
        let mut entry = self.submissions.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        entry.transition(status)?;
        if let Some(outcome) = result {
            entry.result = Some(outcome);
        }
        if let Some(ms) = execution_time_ms {
            entry.execution_time_ms = Some(ms);
        }
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::verdict::Verdict;

    fn new_submission() -> NewSubmission {
        NewSubmission {
            problem_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            source_code: "print(42)".into(),
            language: Language::Python,
        }
    }

    #[tokio::test]
    async fn test_create_starts_pending() {
        let store = MemoryStore::new();
        let sub = store.create_submission(new_submission()).await.unwrap();
        assert_eq!(sub.status, SubmissionStatus::Pending);

        let fetched = store.get_submission(sub.id).await.unwrap();
        assert_eq!(fetched.id, sub.id);
    }

    #[tokio::test]
    async fn test_update_walks_state_machine() {
        let store = MemoryStore::new();
        let sub = store.create_submission(new_submission()).await.unwrap();

        store
            .update_submission(sub.id, SubmissionStatus::Compiling, None, None)
            .await
            .unwrap();
        store
            .update_submission(sub.id, SubmissionStatus::Running, None, None)
            .await
            .unwrap();
        let updated = store
            .update_submission(
                sub.id,
                SubmissionStatus::Completed,
                Some(JudgeOutcome::verdict_only(Verdict::Accepted)),
                Some(17),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, SubmissionStatus::Completed);
        assert_eq!(updated.execution_time_ms, Some(17));
    }

    #[tokio::test]
    async fn test_terminal_record_is_immutable() {
        let store = MemoryStore::new();
        let sub = store.create_submission(new_submission()).await.unwrap();

        store
            .update_submission(
                sub.id,
                SubmissionStatus::Failed,
                Some(JudgeOutcome::cancelled()),
                None,
            )
            .await
            .unwrap();

        // Late result for the same submission must be rejected...
        let err = store
            .update_submission(
                sub.id,
                SubmissionStatus::Completed,
                Some(JudgeOutcome::verdict_only(Verdict::Accepted)),
                Some(10),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transition(_)));

        // ...and the stored record left untouched.
        let stored = store.get_submission(sub.id).await.unwrap();
        assert_eq!(stored.status, SubmissionStatus::Failed);
        assert_eq!(
            stored.result.as_ref().map(|r| r.verdict),
            Some(Verdict::Cancelled)
        );
        assert_eq!(stored.execution_time_ms, None);
    }

    #[tokio::test]
    async fn test_missing_submission() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.get_submission(id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_skipping_states_rejected() {
        let store = MemoryStore::new();
        let sub = store.create_submission(new_submission()).await.unwrap();

        // Pending -> Completed skips the machine
        let err = store
            .update_submission(sub.id, SubmissionStatus::Completed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transition(_)));
    }
}
