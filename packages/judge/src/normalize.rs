//! Result normalization.
//!
//! Maps heterogeneous backend verdicts into the canonical taxonomy and
//! decides pass/fail against the problem's expected output. Pure functions:
//! no backend, store, or clock access.

use common::judge_request::ResourceLimits;
use common::judge_result::{BackendVerdict, JudgeOutcome, RawRunResult};
use common::verdict::Verdict;

/// Compare program output against the expected output.
///
/// Line-wise: trailing whitespace per line is trimmed and trailing empty
/// lines dropped; internal spacing is preserved.
pub fn compare_output(actual: &str, expected: &str) -> bool {
    let normalize = |s: &str| -> Vec<String> {
        let mut lines: Vec<String> = s.lines().map(|l| l.trim_end().to_string()).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    };
    normalize(actual) == normalize(expected)
}

/// Normalize a raw backend result into the persisted outcome.
///
/// `expected_output` is the problem's oracle; `None` means an ephemeral run
/// with no oracle, where any clean run is reported `Accepted` and the caller
/// reads stdout from the outcome.
pub fn normalize(
    raw: RawRunResult,
    expected_output: Option<&str>,
    limits: ResourceLimits,
) -> JudgeOutcome {
    let verdict = match raw.verdict {
        BackendVerdict::CompileError => Verdict::CompileError,
        BackendVerdict::RuntimeError => Verdict::RuntimeError,
        BackendVerdict::TimeLimitExceeded => Verdict::TimeLimitExceeded,
        BackendVerdict::InternalError => Verdict::InternalError,
        BackendVerdict::Ok => {
            // Backends that only report memory usage get the limit applied here.
            if raw.memory_kb.is_some_and(|kb| kb > limits.memory_kb) {
                Verdict::MemoryLimitExceeded
            } else {
                match expected_output {
                    Some(expected) if !compare_output(&raw.stdout, expected) => Verdict::WrongAnswer,
                    _ => Verdict::Accepted,
                }
            }
        }
    };

    let summary = match verdict {
        Verdict::Accepted => "Accepted".to_string(),
        Verdict::WrongAnswer => "Output did not match expected output".to_string(),
        Verdict::CompileError => {
            let detail = raw.compile_output.as_deref().unwrap_or("").trim();
            if detail.is_empty() {
                "Compilation failed".to_string()
            } else {
                format!("Compilation failed: {detail}")
            }
        }
        Verdict::RuntimeError => match raw.exit_code {
            Some(code) => format!("Program exited with code {code}"),
            None => "Program crashed".to_string(),
        },
        Verdict::TimeLimitExceeded => {
            format!("Exceeded time limit of {} ms", limits.cpu_time_ms)
        }
        Verdict::MemoryLimitExceeded => {
            format!("Exceeded memory limit of {} KB", limits.memory_kb)
        }
        Verdict::InternalError => {
            let detail = raw.stderr.trim();
            if detail.is_empty() {
                "Judge internal error".to_string()
            } else {
                format!("Judge internal error: {detail}")
            }
        }
        // Issued by the dispatcher, never by normalization.
        Verdict::Timeout | Verdict::Cancelled => verdict.as_str().to_string(),
    };

    JudgeOutcome {
        verdict,
        summary,
        execution_time_ms: raw.wall_time_ms,
        memory_kb: raw.memory_kb,
        stdout: Some(raw.stdout),
        stderr: Some(raw.stderr),
        compile_output: raw.compile_output,
    }
}
