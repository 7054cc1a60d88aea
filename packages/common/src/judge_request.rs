use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;

/// Resource limits applied to one judged run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// CPU time limit in milliseconds.
    pub cpu_time_ms: u64,
    /// Memory limit in kilobytes.
    pub memory_kb: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpu_time_ms: 2_000,
            memory_kb: 262_144,
        }
    }
}

/// One (source, language, stdin) tuple shipped to the execution backend.
///
/// Lives only for the duration of a single dispatch cycle; the dispatcher
/// owns it until the raw result has been normalized.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JudgeRequest {
    /// Request identifier, used for log correlation.
    pub id: Uuid,
    /// Source code to compile and run.
    pub source_code: String,
    /// Language the source is written in.
    pub language: Language,
    /// Data fed to the program on stdin.
    pub stdin: String,
    /// Time and memory limits for the run.
    pub limits: ResourceLimits,
}

impl JudgeRequest {
    pub fn new(
        source_code: impl Into<String>,
        language: Language,
        stdin: impl Into<String>,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_code: source_code.into(),
            language,
            stdin: stdin.into(),
            limits,
        }
    }
}
