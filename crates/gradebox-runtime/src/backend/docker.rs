//! Docker CLI backend.
//!
//! Talks to the engine through the `docker` binary rather than a daemon
//! socket client: `docker create`/`start`/`exec`/`rm`, and `docker cp
//! <id>:<path> -`, whose stdout is the tar byte stream handed back to the
//! extraction layer. Exec children are polled under a deadline so a hung
//! script cannot wedge the job.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use gradebox_common::types::ContainerId;

use super::{ContainerEngine, CreateSpec, EngineError, EngineResult, ExecOutput};

/// Name of the engine binary looked up on `PATH`.
const DOCKER_BINARY: &str = "docker";

/// Poll interval while waiting for an exec child to finish.
const EXEC_POLL_INTERVAL_MS: u64 = 250;

/// Deadline for the existence probe preceding a copy.
const PATH_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Container engine backed by the local `docker` CLI.
pub struct DockerCliEngine {
    binary: PathBuf,
}

impl DockerCliEngine {
    /// Locates the `docker` binary on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] if the binary is not installed.
    pub fn new() -> EngineResult<Self> {
        let binary = which::which(DOCKER_BINARY).map_err(|_| EngineError::Unavailable {
            message: format!("{DOCKER_BINARY} binary not found on PATH"),
        })?;
        Ok(Self { binary })
    }

    /// Uses an explicit engine binary instead of searching `PATH`.
    #[must_use]
    pub const fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    /// Runs one engine command to completion with captured output.
    fn run(&self, args: &[String]) -> EngineResult<Output> {
        tracing::debug!(?args, "invoking engine CLI");
        Ok(Command::new(&self.binary).args(args).output()?)
    }

    /// Checks that a path exists inside the container before streaming it.
    fn probe_path(&self, id: &ContainerId, path: &str) -> EngineResult<()> {
        let probe = vec!["test".to_string(), "-e".to_string(), path.to_string()];
        let output = self.exec(id, &probe, PATH_PROBE_TIMEOUT)?;
        if output.exit_code == 0 {
            Ok(())
        } else {
            Err(EngineError::PathNotFound {
                path: path.to_string(),
            })
        }
    }
}

impl ContainerEngine for DockerCliEngine {
    fn create(&self, spec: &CreateSpec) -> EngineResult<ContainerId> {
        let name = format!("gradebox-{}", uuid::Uuid::new_v4());
        let output = self.run(&create_args(spec, &name))?;
        if !output.status.success() {
            return Err(EngineError::Creation {
                message: stderr_text(&output),
            });
        }

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(EngineError::Creation {
                message: "engine returned no container id".into(),
            });
        }
        tracing::info!(%id, %name, "container created");
        Ok(ContainerId::new(id))
    }

    fn start(&self, id: &ContainerId) -> EngineResult<()> {
        let output = self.run(&["start".to_string(), id.as_str().to_string()])?;
        if output.status.success() {
            tracing::info!(%id, "container started");
            Ok(())
        } else {
            Err(EngineError::Start {
                message: stderr_text(&output),
            })
        }
    }

    fn exec(
        &self,
        id: &ContainerId,
        command: &[String],
        timeout: Duration,
    ) -> EngineResult<ExecOutput> {
        let mut args = vec!["exec".to_string(), id.as_str().to_string()];
        args.extend(command.iter().cloned());
        tracing::debug!(?command, "exec in container");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = spawn_pipe_reader(child.stdout.take());
        let stderr = spawn_pipe_reader(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::ExecTimeout {
                    limit_secs: timeout.as_secs(),
                });
            }
            std::thread::sleep(Duration::from_millis(EXEC_POLL_INTERVAL_MS));
        };

        Ok(ExecOutput {
            stdout: join_pipe_reader(stdout),
            stderr: join_pipe_reader(stderr),
            exit_code: status.code().unwrap_or(-1),
        })
    }

    fn exec_detached(&self, id: &ContainerId, command: &[String]) -> EngineResult<()> {
        let mut args = vec![
            "exec".to_string(),
            "--detach".to_string(),
            id.as_str().to_string(),
        ];
        args.extend(command.iter().cloned());
        let output = self.run(&args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::Exec {
                message: stderr_text(&output),
            })
        }
    }

    fn copy_archive_from(
        &self,
        id: &ContainerId,
        path: &str,
    ) -> EngineResult<Box<dyn Read + Send>> {
        self.probe_path(id, path)?;

        let mut child = Command::new(&self.binary)
            .args(["cp", &format!("{}:{path}", id.as_str()), "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Exec {
            message: "copy stream has no stdout".into(),
        })?;
        tracing::debug!(%id, path, "streaming archive from container");
        Ok(Box::new(CopyStream { child, stdout }))
    }

    fn remove(&self, id: &ContainerId) -> EngineResult<()> {
        let output = self.run(&[
            "rm".to_string(),
            "--force".to_string(),
            id.as_str().to_string(),
        ])?;
        if output.status.success() {
            tracing::info!(%id, "container removed");
            return Ok(());
        }

        let stderr = stderr_text(&output);
        if container_already_gone(&stderr) {
            // Auto-remove beat us to it; removal is a no-op.
            tracing::debug!(%id, "container already removed by engine");
            Ok(())
        } else {
            Err(EngineError::Remove { message: stderr })
        }
    }

    fn is_available(&self) -> bool {
        self.binary.exists()
    }
}

/// Tar stream produced by a `docker cp` child process.
///
/// Reaps the child when dropped so an abandoned stream never leaves a
/// zombie process behind.
struct CopyStream {
    child: Child,
    stdout: ChildStdout,
}

impl Read for CopyStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl Drop for CopyStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ---------------------------------------------------------------------------
// Free helper functions
// ---------------------------------------------------------------------------

/// Builds the full `docker create` argument list for a job container.
fn create_args(spec: &CreateSpec, name: &str) -> Vec<String> {
    let mut args = vec!["create".to_string(), "--name".to_string(), name.to_string()];
    if spec.auto_remove {
        args.push("--rm".to_string());
    }
    for bind in &spec.binds {
        args.push("-v".to_string());
        args.push(format!(
            "{}:{}",
            bind.host_path.display(),
            bind.container_path
        ));
    }
    for (key, value) in &spec.env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

/// Drains a child pipe on its own thread to keep the child from blocking
/// on a full pipe buffer while we poll for exit.
fn spawn_pipe_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    })
}

fn join_pipe_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Whether a removal error means the container no longer exists.
fn container_already_gone(stderr: &str) -> bool {
    stderr.contains("No such container") || stderr.contains("is already in progress")
}
