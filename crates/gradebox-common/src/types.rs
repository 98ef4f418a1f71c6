//! Domain primitive types used across the Gradebox workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unique identifier for a container instance, as assigned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The build system that produced the test reports inside the container.
///
/// Determines the in-container directory where reports are written and is
/// forwarded to the grading script via the environment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    /// Gradle; reports under `build/test-results/test`.
    Gradle,
    /// Maven; reports under `target/surefire-reports`.
    Maven,
}

impl BuildTool {
    /// Returns the in-container directory the build tool writes reports to.
    #[must_use]
    pub const fn report_directory(self) -> &'static str {
        match self {
            Self::Gradle => crate::constants::GRADLE_REPORT_DIR,
            Self::Maven => crate::constants::MAVEN_REPORT_DIR,
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gradle => write!(f, "gradle"),
            Self::Maven => write!(f, "maven"),
        }
    }
}

impl FromStr for BuildTool {
    type Err = crate::error::GradeboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gradle" => Ok(Self::Gradle),
            "maven" => Ok(Self::Maven),
            other => Err(crate::error::GradeboxError::Config {
                message: format!("unknown build tool: {other}"),
            }),
        }
    }
}

/// Lifecycle stage of a build-job container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStage {
    /// Container has been created but not yet started.
    Created,
    /// Container is running; the script has not been launched yet.
    Started,
    /// The grading script is executing inside the container.
    ScriptRunning,
    /// The script has finished (any exit status).
    ScriptDone,
    /// All result archives have been requested from the container.
    ResultsCopied,
    /// Container has been stopped and removed.
    TornDown,
    /// The job hit a fatal error before reaching `TornDown`.
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Started => write!(f, "started"),
            Self::ScriptRunning => write!(f, "script-running"),
            Self::ScriptDone => write!(f, "script-done"),
            Self::ResultsCopied => write!(f, "results-copied"),
            Self::TornDown => write!(f, "torn-down"),
            Self::Failed => write!(f, "failed"),
        }
    }
}
