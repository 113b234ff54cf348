pub mod daemon_path;
pub mod process;
pub mod report;
pub mod tasks;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use report::ReportCommand;
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::start_daemon,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Taskclock", version, long_about = None)]
#[command(about = "Task and workday time tracker", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start the tracking daemon in the background")]
    Init {},
    #[command(
        about = "Run the tracker directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(
            long,
            help = "Don't mark the workday open, only make sure the previous session is closed"
        )]
        background: bool,
    },
    #[command(about = "Stop a currently running daemon")]
    Stop {},
    #[command(about = "Show the current task, active tasks and today's workday")]
    Status {},
    #[command(about = "Show worked and lunch time for a day of the ledger")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "Make a task current, registering it on first use")]
    Start { name: String },
    #[command(about = "Stop timing without picking another task")]
    Idle {},
    #[command(about = "Soft delete a task. Its recorded time stays computable")]
    Drop { name: String },
    #[command(about = "Print a task's elapsed time and fold it out of future totals")]
    Claim { name: String },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .clone()
        .map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Init {} => {
            process::restart_server()?;
            Ok(())
        }
        Commands::Stop {} => process::stop_server(),
        Commands::Serve { background } => start_daemon(app_dir, background).await,
        Commands::Status {} => report::print_status(&app_dir).await,
        Commands::Report { command } => report::process_report_command(&app_dir, command).await,
        Commands::Start { name } => tasks::start_task(&app_dir, &name).await,
        Commands::Idle {} => tasks::mark_idle(&app_dir).await,
        Commands::Drop { name } => tasks::drop_task(&app_dir, &name).await,
        Commands::Claim { name } => tasks::claim_task(&app_dir, &name).await,
    }
}
