//! `gbx run` — execute one containerized build job.

use std::path::{Path, PathBuf};

use clap::Args;
use gradebox_common::config::JobConfig;
use gradebox_common::types::BuildTool;
use gradebox_runtime::backend::docker::DockerCliEngine;
use gradebox_runtime::job::{BuildJob, BuildJobSpec};

use crate::output;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Host path of the student's assignment repository checkout.
    #[arg(long)]
    pub assignment: PathBuf,

    /// Host path of the instructor's test repository checkout.
    #[arg(long)]
    pub tests: PathBuf,

    /// Host path of the grading script.
    #[arg(long)]
    pub script: PathBuf,

    /// Build tool the test repository uses.
    #[arg(long, value_enum)]
    pub build_tool: BuildTool,

    /// Branch whose commit hashes are recorded in the report.
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Container image to run the job in.
    #[arg(long, default_value = gradebox_common::constants::DEFAULT_IMAGE)]
    pub image: String,

    /// Upper bound on grading-script wall-clock time, in seconds.
    #[arg(long, default_value_t = gradebox_common::constants::DEFAULT_SCRIPT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print the report as JSON instead of a text summary.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `run` command.
///
/// # Errors
///
/// Returns an error if an input path is missing, the engine is
/// unavailable, or the job fails before producing a report.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    require_path(&args.assignment, "assignment repository")?;
    require_path(&args.tests, "test repository")?;
    require_path(&args.script, "grading script")?;

    let engine = DockerCliEngine::new().map_err(|e| anyhow::anyhow!("{e}"))?;

    let spec = BuildJobSpec {
        assignment_repository: args.assignment,
        test_repository: args.tests,
        script: args.script,
        build_tool: args.build_tool,
        branch: args.branch,
    };
    let config = JobConfig {
        image: args.image,
        script_timeout_secs: args.timeout_secs,
        ..JobConfig::default()
    };

    let report = BuildJob::new(spec, config)
        .run(&engine)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if args.json {
        println!("{}", output::render_json(&report)?);
    } else {
        eprintln!("{}", output::render_summary(&report));
    }
    Ok(())
}

fn require_path(path: &Path, what: &str) -> anyhow::Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(anyhow::anyhow!("{what} not found: {}", path.display()))
    }
}
