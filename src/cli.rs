//! CLI argument parsing.
//!
//! The CLI only locates configuration and applies overrides; everything
//! interactive happens inside the workflow.
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Top-level arguments for `groupadm`.
#[derive(Parser, Debug)]
#[command(
    name = "groupadm",
    version,
    about = "Bulk administration of course groups on a learning platform",
    after_help = "Commands:\n  run    Log in and administer groups interactively\n  check  Validate the configuration and print it with the password hidden\n\nExamples:\n  groupadm run --config ./groupadm.toml\n  GROUPADM_PASSWORD=... groupadm run -v --report-dir ./reports\n  groupadm check --config ./groupadm.toml",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and administer groups interactively
    Run(RunArgs),
    /// Validate the configuration and print it with the password hidden
    Check(CheckArgs),
}

/// Where to find the configuration file.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file (defaults to <config dir>/groupadm/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Log in and administer course groups interactively")]
pub struct RunArgs {
    /// Configuration location
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override how deep to search folders for groups
    #[arg(long, value_name = "N")]
    pub max_folder_depth: Option<u32>,

    /// Write a JSON report per executed action into this directory
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,
}

/// Check command inputs.
#[derive(Parser, Debug)]
#[command(about = "Validate the configuration without contacting the platform")]
pub struct CheckArgs {
    /// Configuration location
    #[command(flatten)]
    pub config: ConfigArgs,
}
