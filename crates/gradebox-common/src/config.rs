//! Per-job configuration model.

use serde::{Deserialize, Serialize};

/// Tunable settings for a single build job.
///
/// The immutable job inputs (repository paths, build tool, branch) live in
/// the runtime crate's `BuildJobSpec`; this struct carries the knobs that
/// an operator may override per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Container image reference to run the job in.
    pub image: String,
    /// Upper bound on grading-script wall-clock time, in seconds.
    pub script_timeout_secs: u64,
    /// Whether to ask the engine to auto-remove the container on exit.
    ///
    /// Teardown is issued regardless; this only lets the engine clean up
    /// containers the process never got to tear down.
    pub auto_remove: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            image: crate::constants::DEFAULT_IMAGE.to_string(),
            script_timeout_secs: crate::constants::DEFAULT_SCRIPT_TIMEOUT_SECS,
            auto_remove: true,
        }
    }
}
