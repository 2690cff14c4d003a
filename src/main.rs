use anyhow::{anyhow, Result};
use clap::Parser;
use lms_groupadmin::cli::{CheckArgs, Command, ConfigArgs, RootArgs, RunArgs};
use lms_groupadmin::config::{self, AppConfig};
use lms_groupadmin::endpoint::HttpEndpoint;
use lms_groupadmin::input::TerminalConsole;
use lms_groupadmin::logging::init_logging;
use lms_groupadmin::workflow::Workflow;
use tracing::info;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Run(args) => cmd_run(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn load_validated(args: &ConfigArgs) -> Result<AppConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => config::default_config_path()
            .ok_or_else(|| anyhow!("no config directory on this platform; pass --config"))?,
    };
    let config = config::load_config(&path)?.with_env_password();
    config.validate()?;
    Ok(config)
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let mut config = load_validated(&args.config)?;
    if let Some(depth) = args.max_folder_depth {
        config.max_folder_depth = depth;
    }
    if let Some(dir) = args.report_dir {
        config.report_dir = Some(dir);
    }

    let endpoint = HttpEndpoint::new(&config.endpoint, config.request_timeout());
    let mut console = TerminalConsole::stdio();
    let mut workflow = Workflow::new(
        &endpoint,
        &mut console,
        config.credentials(),
        config.workflow_settings(),
    );
    let summary = workflow.run();
    info!(
        states = summary.visited.len(),
        actions = summary.actions_executed,
        failed_items = summary.failed_items,
        aborted = summary.aborted,
        "workflow finished"
    );
    Ok(())
}

fn cmd_check(args: CheckArgs) -> Result<()> {
    let config = load_validated(&args.config)?;
    print!("{}", config.redacted_toml()?);
    println!("configuration ok");
    Ok(())
}
