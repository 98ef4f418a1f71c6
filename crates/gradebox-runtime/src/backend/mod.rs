//! Container engine abstraction.
//!
//! The engine (Docker or compatible) is an external collaborator; this
//! module is the narrow client interface the pipeline consumes. One
//! production backend ships in [`docker`]; tests substitute their own.

pub mod docker;

use std::io::Read;
use std::time::Duration;

use gradebox_common::types::ContainerId;
use thiserror::Error;

/// A host directory or file bind-mounted into the container.
#[derive(Debug, Clone)]
pub struct BindMount {
    /// Absolute path on the host.
    pub host_path: std::path::PathBuf,
    /// Absolute path inside the container.
    pub container_path: String,
}

/// Configuration for creating a build-job container.
#[derive(Debug, Clone)]
pub struct CreateSpec {
    /// Image reference to create the container from.
    pub image: String,
    /// Bind mounts, in declaration order.
    pub binds: Vec<BindMount>,
    /// Environment variables.
    pub env: Vec<(String, String)>,
    /// Foreground command keeping the container alive.
    pub command: Vec<String>,
    /// Whether to ask the engine to remove the container when it exits.
    pub auto_remove: bool,
}

/// Output captured from a finished in-container exec.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code returned by the command.
    pub exit_code: i32,
}

/// Errors surfaced by a container engine backend.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine is not reachable on this host.
    #[error("container engine unavailable: {message}")]
    Unavailable {
        /// Description of what is missing.
        message: String,
    },

    /// Container creation was rejected.
    #[error("container creation failed: {message}")]
    Creation {
        /// Engine-reported reason.
        message: String,
    },

    /// The created container could not be started.
    #[error("container start failed: {message}")]
    Start {
        /// Engine-reported reason.
        message: String,
    },

    /// An in-container exec could not be issued.
    #[error("exec failed: {message}")]
    Exec {
        /// Engine-reported reason.
        message: String,
    },

    /// An in-container exec did not finish within its deadline.
    #[error("exec did not finish within {limit_secs}s")]
    ExecTimeout {
        /// The deadline that elapsed, in seconds.
        limit_secs: u64,
    },

    /// The requested in-container path does not exist.
    #[error("container path not found: {path}")]
    PathNotFound {
        /// The in-container path that was requested.
        path: String,
    },

    /// The container could not be removed.
    #[error("container removal failed: {message}")]
    Remove {
        /// Engine-reported reason.
        message: String,
    },

    /// An I/O error occurred while talking to the engine.
    #[error("engine I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Narrow client interface to a container engine.
///
/// Implementations must be safe for concurrent use: independent build jobs
/// share one engine instance.
pub trait ContainerEngine: Send + Sync {
    /// Creates a container from the given configuration without starting it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Creation`] if the engine rejects the request.
    fn create(&self, spec: &CreateSpec) -> EngineResult<ContainerId>;

    /// Starts a previously created container.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Start`] if the container cannot be started.
    fn start(&self, id: &ContainerId) -> EngineResult<()>;

    /// Runs a command inside the running container, attaching stdout and
    /// stderr, and blocks until it finishes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ExecTimeout`] when the deadline elapses and
    /// [`EngineError::Exec`] when the command cannot be issued.
    fn exec(
        &self,
        id: &ContainerId,
        command: &[String],
        timeout: Duration,
    ) -> EngineResult<ExecOutput>;

    /// Issues a command inside the running container without waiting for
    /// it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Exec`] if the command cannot be issued.
    fn exec_detached(&self, id: &ContainerId, command: &[String]) -> EngineResult<()>;

    /// Returns a tar byte stream of an in-container path's contents,
    /// unconsumed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PathNotFound`] if the path does not exist in
    /// the container.
    fn copy_archive_from(
        &self,
        id: &ContainerId,
        path: &str,
    ) -> EngineResult<Box<dyn Read + Send>>;

    /// Stops (if needed) and removes the container. Must succeed as a
    /// no-op when the engine has already removed it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Remove`] if the container exists but cannot
    /// be removed.
    fn remove(&self, id: &ContainerId) -> EngineResult<()>;

    /// Returns whether this backend is operational on the current host.
    fn is_available(&self) -> bool;
}
