//! Data model for parsed test outcomes and the aggregated build report.

use serde::{Deserialize, Serialize};

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// The test case completed without a failure element.
    Passed,
    /// The test case carried a nested failure element.
    Failed,
}

/// A single test case read from a JUnit report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Test name, taken from the testcase element's name attribute.
    pub name: String,
    /// Pass/fail outcome.
    pub outcome: TestOutcome,
    /// Failure messages, in report order. Always empty for a passed case;
    /// may also be empty for a failed case whose failure element carried no
    /// message attribute.
    pub messages: Vec<String>,
}

impl TestCase {
    /// Creates a passed test case.
    #[must_use]
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: TestOutcome::Passed,
            messages: Vec::new(),
        }
    }

    /// Creates a failed test case with its failure messages.
    #[must_use]
    pub fn failed(name: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            outcome: TestOutcome::Failed,
            messages,
        }
    }

    /// Returns whether this case failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, TestOutcome::Failed)
    }
}

/// Aggregated result of one build job.
///
/// Assembled once, after every report file has been parsed; immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildReport {
    /// True iff no test case failed.
    pub successful: bool,
    /// Commit hash the assignment repository's target branch points to,
    /// when the ref file could be read.
    pub assignment_commit: Option<String>,
    /// Commit hash the test repository's target branch points to, when the
    /// ref file could be read.
    pub test_commit: Option<String>,
    /// Failed test cases, in report order.
    pub failed: Vec<TestCase>,
    /// Passed test cases, in report order.
    pub passed: Vec<TestCase>,
    /// ISO-8601 timestamp of when the job started.
    pub started_at: String,
    /// Wall-clock job duration in seconds.
    pub duration_secs: u64,
    /// One timestamp attribute per parsed report file, verbatim; `None`
    /// where a report carried no timestamp attribute.
    pub report_timestamps: Vec<Option<String>>,
    /// Exit status of the grading script. Advisory only; never folded
    /// into `successful`.
    pub script_exit_code: Option<i32>,
}

impl BuildReport {
    /// Assembles the final report. `successful` is derived from `failed`
    /// rather than taken from the caller.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        assignment_commit: Option<String>,
        test_commit: Option<String>,
        failed: Vec<TestCase>,
        passed: Vec<TestCase>,
        started_at: String,
        duration_secs: u64,
        report_timestamps: Vec<Option<String>>,
        script_exit_code: Option<i32>,
    ) -> Self {
        Self {
            successful: failed.is_empty(),
            assignment_commit,
            test_commit,
            failed,
            passed,
            started_at,
            duration_secs,
            report_timestamps,
            script_exit_code,
        }
    }

    /// Total number of test cases recorded in the report.
    #[must_use]
    pub fn total_cases(&self) -> usize {
        self.failed.len() + self.passed.len()
    }
}
