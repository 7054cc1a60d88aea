use tracing::info;
use uuid::uuid;

use common::judge_request::ResourceLimits;
use judge::problems::{Difficulty, ProblemSpec, StaticProblems};

/// Register the built-in sample problems.
///
/// The bundled binary has no content-management collaborator, so a couple of
/// fixed-id problems are seeded at startup for manual testing.
pub fn register_sample_problems(problems: &StaticProblems) {
    let samples = [
        ProblemSpec {
            id: uuid!("8f14e45f-ceea-467f-a0f7-b9c2f1d3a001"),
            title: "Echo".into(),
            difficulty: Difficulty::Easy,
            input: "hello\n".into(),
            expected_output: "hello\n".into(),
            limits: ResourceLimits::default(),
        },
        ProblemSpec {
            id: uuid!("8f14e45f-ceea-467f-a0f7-b9c2f1d3a002"),
            title: "Sum of Two".into(),
            difficulty: Difficulty::Easy,
            input: "1 2\n".into(),
            expected_output: "3\n".into(),
            limits: ResourceLimits {
                cpu_time_ms: 1_000,
                memory_kb: 131_072,
            },
        },
    ];

    for spec in samples {
        info!(problem_id = %spec.id, title = %spec.title, "Seeded sample problem");
        problems.insert(spec);
    }
}
