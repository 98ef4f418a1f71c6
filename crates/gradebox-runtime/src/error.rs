//! Error types for build-job execution.

use thiserror::Error;

use crate::backend::EngineError;
use gradebox_report::error::ReportError;

/// Errors that abort a build job.
///
/// Teardown failures are deliberately absent: cleanup is best-effort and
/// only ever logged, never allowed to override the job's outcome.
#[derive(Debug, Error)]
pub enum JobError {
    /// The job container could not be created.
    #[error("container creation failed: {source}")]
    Creation {
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },

    /// The job container could not be started.
    #[error("container start failed: {source}")]
    Start {
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },

    /// The grading script did not finish within the configured deadline.
    #[error("grading script did not finish within {limit_secs}s")]
    ScriptTimeout {
        /// The deadline that elapsed, in seconds.
        limit_secs: u64,
    },

    /// The expected results directory does not exist in the container.
    #[error("result path not found in container: {path}")]
    ResultPathNotFound {
        /// The in-container path that was requested.
        path: String,
    },

    /// Any other engine-communication failure.
    #[error("container engine error: {0}")]
    Engine(#[from] EngineError),

    /// Result extraction or report parsing failed; the job's outcome
    /// cannot be trusted and no report is produced.
    #[error("result extraction failed: {0}")]
    Report(#[from] ReportError),
}

/// Result type for build-job operations.
pub type JobResult<T> = std::result::Result<T, JobError>;
