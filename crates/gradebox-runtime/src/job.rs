//! End-to-end build-job orchestration.
//!
//! A [`BuildJob`] drives one container through its whole lifecycle:
//! configure → run → extract → parse → aggregate → teardown, and hands
//! back one immutable [`BuildReport`].

use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use gradebox_common::config::JobConfig;
use gradebox_common::constants;
use gradebox_common::types::BuildTool;
use gradebox_report::archive::ResultArchive;
use gradebox_report::model::{BuildReport, TestCase};
use gradebox_report::{junit, refs};

use crate::backend::ContainerEngine;
use crate::container::JobContainer;
use crate::error::JobResult;

/// Immutable inputs of one build job.
#[derive(Debug, Clone)]
pub struct BuildJobSpec {
    /// Host path of the student's assignment repository checkout.
    pub assignment_repository: PathBuf,
    /// Host path of the instructor's test repository checkout.
    pub test_repository: PathBuf,
    /// Host path of the grading script.
    pub script: PathBuf,
    /// Build tool the test repository uses.
    pub build_tool: BuildTool,
    /// Branch whose commit hashes are recorded in the report.
    pub branch: String,
}

/// One containerized build-and-test job.
pub struct BuildJob {
    spec: BuildJobSpec,
    config: JobConfig,
}

/// Outcomes accumulated while walking the report archive.
struct ScannedOutcomes {
    failed: Vec<TestCase>,
    passed: Vec<TestCase>,
    timestamps: Vec<Option<String>>,
}

impl BuildJob {
    /// Creates a job from its immutable inputs and configuration.
    #[must_use]
    pub const fn new(spec: BuildJobSpec, config: JobConfig) -> Self {
        Self { spec, config }
    }

    /// The job's immutable inputs.
    #[must_use]
    pub const fn spec(&self) -> &BuildJobSpec {
        &self.spec
    }

    /// Runs the job to completion against the given engine.
    ///
    /// The container is torn down on every exit path, including errors and
    /// cancellation. A non-zero script exit status does not abort the job;
    /// missing result paths, timeouts, and unparseable reports do, because
    /// a partial result must never be reported as a trustworthy outcome.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::JobError`] describing the first
    /// infrastructure or extraction failure; no report is produced then.
    pub fn run<E: ContainerEngine>(&self, engine: &E) -> JobResult<BuildReport> {
        let started_at = chrono::Utc::now();
        let clock = Instant::now();
        tracing::info!(
            build_tool = %self.spec.build_tool,
            branch = %self.spec.branch,
            "build job starting"
        );

        let mut container = JobContainer::create(engine, &self.spec, &self.config)?;
        container.start()?;

        let script = container.run_script(Duration::from_secs(self.config.script_timeout_secs))?;

        let report_dir = self.spec.build_tool.report_directory();
        let stream = match container.copy_archive(report_dir) {
            Ok(stream) => stream,
            Err(e) => {
                container.fail();
                return Err(e);
            }
        };
        let outcomes = match collect_outcomes(stream) {
            Ok(outcomes) => outcomes,
            Err(e) => {
                container.fail();
                return Err(e.into());
            }
        };

        let assignment_commit =
            self.read_branch_ref(&container, constants::ASSIGNMENT_REPOSITORY_MOUNT);
        let test_commit = self.read_branch_ref(&container, constants::TEST_REPOSITORY_MOUNT);

        container.signal_results_extracted();
        container.teardown();

        let report = BuildReport::new(
            assignment_commit,
            test_commit,
            outcomes.failed,
            outcomes.passed,
            started_at.to_rfc3339(),
            clock.elapsed().as_secs(),
            outcomes.timestamps,
            Some(script.exit_code),
        );
        tracing::info!(
            successful = report.successful,
            failed = report.failed.len(),
            passed = report.passed.len(),
            duration_secs = report.duration_secs,
            "build job finished"
        );
        Ok(report)
    }

    /// Reads the commit hash a repository's target branch points to.
    ///
    /// Tolerates failure: test outcomes are already in hand by the time
    /// refs are read, so an unreadable ref only costs the hash field.
    fn read_branch_ref<E: ContainerEngine>(
        &self,
        container: &JobContainer<'_, E>,
        repository_mount: &str,
    ) -> Option<String> {
        let path = constants::branch_ref_path(repository_mount, &self.spec.branch);
        let stream = match container.copy_archive(&path) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(%path, error = %e, "commit ref not readable");
                return None;
            }
        };
        match refs::read_commit_ref(stream) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(%path, error = %e, "commit ref malformed");
                None
            }
        }
    }
}

/// Walks the report archive, parsing every report file into outcomes.
///
/// Entries that are directories or do not follow the report naming
/// convention are skipped without being read.
fn collect_outcomes(
    stream: Box<dyn Read + Send>,
) -> gradebox_report::error::Result<ScannedOutcomes> {
    let mut outcomes = ScannedOutcomes {
        failed: Vec::new(),
        passed: Vec::new(),
        timestamps: Vec::new(),
    };

    let mut archive = ResultArchive::new(stream);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.is_dir() {
            continue;
        }
        let path = entry.path()?;
        if !junit::is_report_file(&path) {
            continue;
        }

        tracing::debug!(%path, "parsing report entry");
        let report = junit::parse_report(BufReader::new(&mut entry))?;
        outcomes.timestamps.push(report.timestamp);
        for case in report.cases {
            if case.is_failed() {
                outcomes.failed.push(case);
            } else {
                outcomes.passed.push(case);
            }
        }
    }

    Ok(outcomes)
}
