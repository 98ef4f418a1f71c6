//! End-to-end build-job tests against an in-memory fake engine.
//!
//! The fake serves canned tar archives for in-container paths and records
//! every lifecycle call, so the full pipeline (create, start, script exec,
//! streaming extraction, JUnit parsing, ref reading, aggregation, and
//! teardown) runs without a container engine on the host.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use gradebox_common::config::JobConfig;
use gradebox_common::constants;
use gradebox_common::types::{BuildTool, ContainerId};
use gradebox_runtime::backend::{
    ContainerEngine, CreateSpec, EngineError, EngineResult, ExecOutput,
};
use gradebox_runtime::error::JobError;
use gradebox_runtime::job::{BuildJob, BuildJobSpec};

// ── Fake engine ──────────────────────────────────────────────────────

#[derive(Default)]
struct FakeEngine {
    /// In-container path → tar bytes served by `copy_archive_from`.
    archives: HashMap<String, Vec<u8>>,
    script_exit_code: i32,
    script_hangs: bool,
    created: Mutex<Vec<CreateSpec>>,
    removed: AtomicUsize,
    detached_execs: Mutex<Vec<Vec<String>>>,
}

impl FakeEngine {
    fn with_archive(mut self, path: &str, bytes: Vec<u8>) -> Self {
        let _ = self.archives.insert(path.to_string(), bytes);
        self
    }

    fn removals(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }
}

impl ContainerEngine for FakeEngine {
    fn create(&self, spec: &CreateSpec) -> EngineResult<ContainerId> {
        self.created.lock().expect("lock").push(spec.clone());
        Ok(ContainerId::generate())
    }

    fn start(&self, _id: &ContainerId) -> EngineResult<()> {
        Ok(())
    }

    fn exec(
        &self,
        _id: &ContainerId,
        _command: &[String],
        timeout: Duration,
    ) -> EngineResult<ExecOutput> {
        if self.script_hangs {
            return Err(EngineError::ExecTimeout {
                limit_secs: timeout.as_secs(),
            });
        }
        Ok(ExecOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: self.script_exit_code,
        })
    }

    fn exec_detached(&self, _id: &ContainerId, command: &[String]) -> EngineResult<()> {
        self.detached_execs
            .lock()
            .expect("lock")
            .push(command.to_vec());
        Ok(())
    }

    fn copy_archive_from(
        &self,
        _id: &ContainerId,
        path: &str,
    ) -> EngineResult<Box<dyn Read + Send>> {
        self.archives.get(path).map_or_else(
            || {
                Err(EngineError::PathNotFound {
                    path: path.to_string(),
                })
            },
            |bytes| Ok(Box::new(Cursor::new(bytes.clone())) as Box<dyn Read + Send>),
        )
    }

    fn remove(&self, _id: &ContainerId) -> EngineResult<()> {
        let _ = self.removed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

const ASSIGNMENT_HASH: &str = "1111111111111111111111111111111111111111";
const TEST_HASH: &str = "2222222222222222222222222222222222222222";

fn tar_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("append entry");
    }
    builder.into_inner().expect("finish tar")
}

fn ref_tar(hash: &str) -> Vec<u8> {
    tar_of(&[("main", format!("{hash}\n").as_bytes())])
}

fn passing_report(test_name: &str) -> String {
    format!(
        r#"<testsuite name="Suite" timestamp="2026-02-11T10:54:31">
  <testcase name="{test_name}" classname="Suite" time="0.01"/>
</testsuite>"#
    )
}

fn failing_report(test_name: &str, message: &str) -> String {
    format!(
        r#"<testsuite name="Suite" timestamp="2026-02-11T10:55:02">
  <testcase name="{test_name}">
    <failure message="{message}" type="AssertionError">trace</failure>
  </testcase>
</testsuite>"#
    )
}

fn gradle_spec() -> BuildJobSpec {
    BuildJobSpec {
        assignment_repository: "/work/assignment".into(),
        test_repository: "/work/tests".into(),
        script: "/work/script.sh".into(),
        build_tool: BuildTool::Gradle,
        branch: "main".into(),
    }
}

fn engine_with_reports(report_entries: &[(&str, &[u8])]) -> FakeEngine {
    FakeEngine::default()
        .with_archive(BuildTool::Gradle.report_directory(), tar_of(report_entries))
        .with_archive(
            &constants::branch_ref_path(constants::ASSIGNMENT_REPOSITORY_MOUNT, "main"),
            ref_tar(ASSIGNMENT_HASH),
        )
        .with_archive(
            &constants::branch_ref_path(constants::TEST_REPOSITORY_MOUNT, "main"),
            ref_tar(TEST_HASH),
        )
}

// ── End-to-end scenarios ─────────────────────────────────────────────

#[test]
fn mixed_results_yield_failed_and_passed_sequences() {
    let foo = passing_report("testX");
    let bar = failing_report("testY", "boom");
    let engine = engine_with_reports(&[
        ("test/TEST-Foo.xml", foo.as_bytes()),
        ("test/TEST-Bar.xml", bar.as_bytes()),
    ]);

    let report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs");

    assert!(!report.successful);
    assert_eq!(report.passed.len(), 1);
    assert_eq!(report.passed[0].name, "testX");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "testY");
    assert_eq!(report.failed[0].messages, vec!["boom"]);
    assert_eq!(report.assignment_commit.as_deref(), Some(ASSIGNMENT_HASH));
    assert_eq!(report.test_commit.as_deref(), Some(TEST_HASH));
    assert_eq!(report.report_timestamps.len(), 2);
    assert_eq!(engine.removals(), 1);
}

#[test]
fn all_passing_job_is_successful() {
    let foo = passing_report("testX");
    let engine = engine_with_reports(&[("test/TEST-Foo.xml", foo.as_bytes())]);

    let report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs");

    assert!(report.successful);
    assert!(report.failed.is_empty());
    assert_eq!(report.total_cases(), 1);
    assert_eq!(report.script_exit_code, Some(0));
}

#[test]
fn every_case_lands_in_exactly_one_sequence() {
    let foo = passing_report("testX");
    let bar = failing_report("testY", "boom");
    let engine = engine_with_reports(&[
        ("test/TEST-Foo.xml", foo.as_bytes()),
        ("test/TEST-Bar.xml", bar.as_bytes()),
    ]);

    let report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs");

    let failed_names: Vec<&str> = report.failed.iter().map(|c| c.name.as_str()).collect();
    let passed_names: Vec<&str> = report.passed.iter().map(|c| c.name.as_str()).collect();
    for name in ["testX", "testY"] {
        let in_failed = failed_names.contains(&name);
        let in_passed = passed_names.contains(&name);
        assert!(in_failed ^ in_passed, "{name} must be in exactly one sequence");
    }
    assert_eq!(report.successful, report.failed.is_empty());
}

#[test]
fn missing_results_path_aborts_without_a_report() {
    let engine = FakeEngine::default();

    let err = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect_err("missing results directory must abort");

    match err {
        JobError::ResultPathNotFound { path } => {
            assert_eq!(path, BuildTool::Gradle.report_directory());
        }
        other => panic!("expected ResultPathNotFound, got {other}"),
    }
    assert_eq!(engine.removals(), 1, "teardown still runs");
}

#[test]
fn script_timeout_aborts_and_tears_down_once() {
    let engine = FakeEngine {
        script_hangs: true,
        ..FakeEngine::default()
    };

    let err = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect_err("hung script must abort");

    assert!(matches!(err, JobError::ScriptTimeout { .. }));
    assert_eq!(engine.removals(), 1, "teardown runs exactly once");
}

#[test]
fn malformed_report_aborts_the_whole_job() {
    let engine = engine_with_reports(&[("test/TEST-Broken.xml", b"<testsuite><testcase" as &[u8])]);

    let err = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect_err("malformed report must abort");

    assert!(matches!(err, JobError::Report(_)));
    assert_eq!(engine.removals(), 1);
}

#[test]
fn non_zero_script_exit_is_advisory_not_fatal() {
    let foo = passing_report("testX");
    let mut engine = engine_with_reports(&[("test/TEST-Foo.xml", foo.as_bytes())]);
    engine.script_exit_code = 1;

    let report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job still runs");

    assert!(report.successful, "success is decided by test outcomes");
    assert_eq!(report.script_exit_code, Some(1));
}

#[test]
fn unreadable_refs_leave_commit_fields_empty() {
    let foo = passing_report("testX");
    let engine = FakeEngine::default()
        .with_archive(BuildTool::Gradle.report_directory(), tar_of(&[(
            "test/TEST-Foo.xml",
            foo.as_bytes(),
        )]));

    let report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs without refs");

    assert!(report.successful);
    assert_eq!(report.assignment_commit, None);
    assert_eq!(report.test_commit, None);
}

#[test]
fn non_report_entries_are_skipped() {
    let foo = passing_report("testX");
    let engine = engine_with_reports(&[
        ("test/README.txt", b"not a report" as &[u8]),
        ("test/TEST-Foo.xml", foo.as_bytes()),
        ("test/TEST-Other.log", b"also not a report" as &[u8]),
    ]);

    let report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs");

    assert_eq!(report.total_cases(), 1);
    assert_eq!(report.report_timestamps.len(), 1);
}

// ── Container configuration ──────────────────────────────────────────

#[test]
fn create_spec_mounts_env_and_keep_alive() {
    let foo = passing_report("testX");
    let engine = engine_with_reports(&[("test/TEST-Foo.xml", foo.as_bytes())]);

    let _report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs");

    let created = engine.created.lock().expect("lock");
    assert_eq!(created.len(), 1);
    let spec = &created[0];

    let mounts: Vec<&str> = spec.binds.iter().map(|b| b.container_path.as_str()).collect();
    assert_eq!(
        mounts,
        vec![
            constants::ASSIGNMENT_REPOSITORY_MOUNT,
            constants::TEST_REPOSITORY_MOUNT,
            constants::SCRIPT_MOUNT,
        ]
    );

    assert!(spec.env.contains(&(
        constants::ENV_BUILD_TOOL.to_string(),
        "gradle".to_string()
    )));
    assert!(spec.env.contains(&(
        constants::ENV_TARGET_BRANCH.to_string(),
        "main".to_string()
    )));

    let keep_alive = spec.command.join(" ");
    assert!(keep_alive.contains(constants::RESULTS_EXTRACTED_SENTINEL));
}

#[test]
fn sentinel_touch_is_issued_after_extraction() {
    let foo = passing_report("testX");
    let engine = engine_with_reports(&[("test/TEST-Foo.xml", foo.as_bytes())]);

    let _report = BuildJob::new(gradle_spec(), JobConfig::default())
        .run(&engine)
        .expect("job runs");

    let detached = engine.detached_execs.lock().expect("lock");
    assert_eq!(detached.len(), 1);
    assert_eq!(
        detached[0],
        vec![
            "touch".to_string(),
            constants::RESULTS_EXTRACTED_SENTINEL.to_string()
        ]
    );
}

#[test]
fn maven_jobs_read_the_surefire_directory() {
    let foo = passing_report("testX");
    let engine = FakeEngine::default().with_archive(
        BuildTool::Maven.report_directory(),
        tar_of(&[("surefire-reports/TEST-Foo.xml", foo.as_bytes())]),
    );

    let spec = BuildJobSpec {
        build_tool: BuildTool::Maven,
        ..gradle_spec()
    };
    let report = BuildJob::new(spec, JobConfig::default())
        .run(&engine)
        .expect("job runs");

    assert!(report.successful);
    assert_eq!(report.total_cases(), 1);
}
