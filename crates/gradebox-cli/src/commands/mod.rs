//! CLI command definitions and dispatch.

pub mod run;

use clap::{Parser, Subcommand};

/// Gradebox — containerized build-and-test jobs for student submissions.
#[derive(Parser, Debug)]
#[command(name = "gbx", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one build job and print its report.
    Run(run::RunArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::execute(args),
    }
}
