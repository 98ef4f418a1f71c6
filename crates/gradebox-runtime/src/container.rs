//! Per-job container lifecycle control.
//!
//! One [`JobContainer`] owns one ephemeral container from creation to
//! teardown. The container's foreground process only keeps it alive: it
//! polls for a sentinel file and exits once results have been extracted,
//! while the grading script runs as a second, independent exec. Completion
//! of the script is observed through the blocking exec wait, never through
//! the foreground process's exit code.

use std::io::Read;
use std::time::Duration;

use gradebox_common::config::JobConfig;
use gradebox_common::constants;
use gradebox_common::types::{ContainerId, JobStage};

use crate::backend::{BindMount, ContainerEngine, CreateSpec, EngineError, ExecOutput};
use crate::error::{JobError, JobResult};
use crate::job::BuildJobSpec;

/// Handle on one build job's container, with its lifecycle stage.
///
/// Teardown runs exactly once per job: explicitly on the success path, or
/// via `Drop` on any early exit, so cancellation and errors can never leak
/// a running container.
pub struct JobContainer<'e, E: ContainerEngine> {
    engine: &'e E,
    id: ContainerId,
    stage: JobStage,
    teardown_done: bool,
}

impl<'e, E: ContainerEngine> JobContainer<'e, E> {
    /// Creates the job container: repositories and script bind-mounted at
    /// their fixed paths, build tool and branch passed via environment,
    /// and the sentinel-polling keep-alive as the foreground command.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Creation`] if the engine rejects the request;
    /// no container state exists afterwards.
    pub fn create(engine: &'e E, spec: &BuildJobSpec, config: &JobConfig) -> JobResult<Self> {
        let create = CreateSpec {
            image: config.image.clone(),
            binds: vec![
                BindMount {
                    host_path: spec.assignment_repository.clone(),
                    container_path: constants::ASSIGNMENT_REPOSITORY_MOUNT.to_string(),
                },
                BindMount {
                    host_path: spec.test_repository.clone(),
                    container_path: constants::TEST_REPOSITORY_MOUNT.to_string(),
                },
                BindMount {
                    host_path: spec.script.clone(),
                    container_path: constants::SCRIPT_MOUNT.to_string(),
                },
            ],
            env: vec![
                (
                    constants::ENV_BUILD_TOOL.to_string(),
                    spec.build_tool.to_string(),
                ),
                (
                    constants::ENV_TARGET_BRANCH.to_string(),
                    spec.branch.clone(),
                ),
            ],
            command: keep_alive_command(),
            auto_remove: config.auto_remove,
        };

        let id = engine
            .create(&create)
            .map_err(|source| JobError::Creation { source })?;
        tracing::info!(%id, stage = %JobStage::Created, "job container created");

        Ok(Self {
            engine,
            id,
            stage: JobStage::Created,
            teardown_done: false,
        })
    }

    /// Starts the container's foreground keep-alive process.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Start`] if the engine cannot start the
    /// container.
    pub fn start(&mut self) -> JobResult<()> {
        match self.engine.start(&self.id) {
            Ok(()) => {
                self.transition(JobStage::Started);
                Ok(())
            }
            Err(source) => {
                self.stage = JobStage::Failed;
                Err(JobError::Start { source })
            }
        }
    }

    /// Runs the grading script as a second exec inside the container and
    /// blocks until it finishes or `timeout` elapses.
    ///
    /// A non-zero exit status is not an error here: the exit code is
    /// handed back for the report's advisory field and test outcomes
    /// decide success.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::ScriptTimeout`] when the deadline elapses and
    /// [`JobError::Engine`] when the exec cannot be issued.
    pub fn run_script(&mut self, timeout: Duration) -> JobResult<ExecOutput> {
        self.transition(JobStage::ScriptRunning);
        let command = vec!["sh".to_string(), constants::SCRIPT_MOUNT.to_string()];

        match self.engine.exec(&self.id, &command, timeout) {
            Ok(output) => {
                if output.exit_code != 0 {
                    tracing::info!(
                        id = %self.id,
                        exit_code = output.exit_code,
                        "grading script exited non-zero"
                    );
                }
                self.transition(JobStage::ScriptDone);
                Ok(output)
            }
            Err(EngineError::ExecTimeout { limit_secs }) => {
                self.stage = JobStage::Failed;
                Err(JobError::ScriptTimeout { limit_secs })
            }
            Err(source) => {
                self.stage = JobStage::Failed;
                Err(JobError::Engine(source))
            }
        }
    }

    /// Requests a tar stream of an in-container path, unconsumed.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::ResultPathNotFound`] if the path does not exist
    /// in the container.
    pub fn copy_archive(&self, path: &str) -> JobResult<Box<dyn Read + Send>> {
        match self.engine.copy_archive_from(&self.id, path) {
            Ok(stream) => Ok(stream),
            Err(EngineError::PathNotFound { path }) => {
                Err(JobError::ResultPathNotFound { path })
            }
            Err(source) => Err(JobError::Engine(source)),
        }
    }

    /// Signals the foreground process that all results are extracted, so
    /// it can exit on its own. Best-effort: teardown follows regardless.
    pub fn signal_results_extracted(&mut self) {
        let command = vec![
            "touch".to_string(),
            constants::RESULTS_EXTRACTED_SENTINEL.to_string(),
        ];
        if let Err(e) = self.engine.exec_detached(&self.id, &command) {
            tracing::warn!(id = %self.id, error = %e, "could not write results sentinel");
        }
        self.transition(JobStage::ResultsCopied);
    }

    /// Marks the job as fatally failed without tearing it down yet.
    pub fn fail(&mut self) {
        self.stage = JobStage::Failed;
    }

    /// Stops and removes the container. Idempotent; failures are logged
    /// and never propagated, since the job's outcome is already determined.
    pub fn teardown(&mut self) {
        if self.teardown_done {
            return;
        }
        self.teardown_done = true;

        match self.engine.remove(&self.id) {
            Ok(()) => tracing::info!(id = %self.id, "container torn down"),
            Err(e) => tracing::warn!(id = %self.id, error = %e, "container teardown failed"),
        }
        self.stage = JobStage::TornDown;
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn stage(&self) -> JobStage {
        self.stage
    }

    /// Engine-assigned container identifier.
    #[must_use]
    pub const fn id(&self) -> &ContainerId {
        &self.id
    }

    fn transition(&mut self, stage: JobStage) {
        tracing::info!(id = %self.id, from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }
}

impl<E: ContainerEngine> Drop for JobContainer<'_, E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Foreground command that keeps the container alive until the sentinel
/// file appears.
fn keep_alive_command() -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        format!(
            "while [ ! -f {} ]; do sleep 0.5; done",
            constants::RESULTS_EXTRACTED_SENTINEL
        ),
    ]
}
