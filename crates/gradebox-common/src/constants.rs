//! Fixed in-container paths, environment variable names, and defaults.
//!
//! The grading script and the container's foreground process both rely on
//! these exact paths; changing them breaks the cross-process protocol.

/// In-container mount point of the student's assignment repository.
pub const ASSIGNMENT_REPOSITORY_MOUNT: &str = "/repositories/assignment-repository";

/// In-container mount point of the instructor's test repository.
pub const TEST_REPOSITORY_MOUNT: &str = "/repositories/test-repository";

/// In-container path the grading script is mounted at.
pub const SCRIPT_MOUNT: &str = "/script.sh";

/// Directory Gradle writes JUnit XML reports to.
pub const GRADLE_REPORT_DIR: &str = "/repositories/test-repository/build/test-results/test";

/// Directory Maven's Surefire plugin writes JUnit XML reports to.
pub const MAVEN_REPORT_DIR: &str = "/repositories/test-repository/target/surefire-reports";

/// Filename prefix of a JUnit XML report.
pub const REPORT_FILE_PREFIX: &str = "TEST-";

/// Filename extension of a JUnit XML report.
pub const REPORT_FILE_SUFFIX: &str = ".xml";

/// Marker file whose appearance tells the container's foreground process
/// that all results have been extracted and it may exit.
pub const RESULTS_EXTRACTED_SENTINEL: &str = "/results_extracted";

/// Environment variable carrying the build tool name into the container.
pub const ENV_BUILD_TOOL: &str = "GRADEBOX_BUILD_TOOL";

/// Environment variable carrying the target branch name into the container.
pub const ENV_TARGET_BRANCH: &str = "GRADEBOX_TARGET_BRANCH";

/// Default container image used to run build jobs.
pub const DEFAULT_IMAGE: &str = "gradebox/build-template:java17";

/// Default upper bound on grading-script wall-clock time.
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 600;

/// Length of a full Git commit hash in hex characters.
pub const COMMIT_HASH_LENGTH: usize = 40;

/// Application name used in CLI output.
pub const APP_NAME: &str = "gradebox";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "gbx";

/// Returns the in-container path of a repository's branch-ref file.
#[must_use]
pub fn branch_ref_path(repository_mount: &str, branch: &str) -> String {
    format!("{repository_mount}/.git/refs/heads/{branch}")
}
