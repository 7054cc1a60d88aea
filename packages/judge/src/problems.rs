//! Problem content provider.
//!
//! Problems are owned by content management; the judging core reads them as
//! the expected-output oracle and the source of per-run resource limits.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::judge_request::ResourceLimits;

use crate::store::StoreError;

/// Problem difficulty tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// The slice of a problem the judging core needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProblemSpec {
    pub id: Uuid,
    pub title: String,
    pub difficulty: Difficulty,
    /// Data fed to the program on stdin.
    pub input: String,
    /// Oracle the normalizer compares stdout against.
    pub expected_output: String,
    /// Per-run resource limits.
    pub limits: ResourceLimits,
}

/// Read-only problem lookup.
#[async_trait]
pub trait ProblemProvider: Send + Sync {
    /// Fetch the judging view of a problem.
    async fn fetch(&self, problem_id: Uuid) -> Result<ProblemSpec, StoreError>;
}

/// In-memory problem set.
#[derive(Default)]
pub struct StaticProblems {
    problems: DashMap<Uuid, ProblemSpec>,
}

impl StaticProblems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a problem, replacing any previous spec with the same id.
    pub fn insert(&self, spec: ProblemSpec) {
        self.problems.insert(spec.id, spec);
    }
}

#[async_trait]
impl ProblemProvider for StaticProblems {
    async fn fetch(&self, problem_id: Uuid) -> Result<ProblemSpec, StoreError> {
        self.problems
            .get(&problem_id)
            .map(|entry| entry.clone())
            .ok_or(StoreError::NotFound(problem_id))
    }
}
