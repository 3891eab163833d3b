mod commands;
mod config;
mod error;
mod plan;
mod render;
mod state;
mod store;
mod telemetry;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::init::InitArgs;
use commands::report::ReportArgs;
use commands::status::StatusArgs;
use commands::summary::SummaryArgs;

#[derive(Debug, Parser)]
#[command(
    name = "taskloop",
    version,
    about = "Build-test-repeat loop tracker for agent coding workflows"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a loop from a plan's checklist items
    Init(InitArgs),
    /// Show progress and activate the next pending task
    Status(StatusArgs),
    /// Record a pass/fail/skip outcome for the active task
    Report(ReportArgs),
    /// Print the tabular loop summary
    Summary(SummaryArgs),
    /// Print the JSON Schema for the loop state document
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Status(_) => "status",
            Self::Report(_) => "report",
            Self::Summary(_) => "summary",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Init(args) => args.execute(),
        Commands::Status(args) => args.execute(),
        Commands::Report(args) => args.execute(),
        Commands::Summary(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(loop_err) = e.downcast_ref::<error::LoopError>() {
                eprintln!("error: {loop_err}");
                loop_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
