use crate::commands::{
    run_build_request, run_day_state, run_handover, run_watch, BuildRequestArgs, DayStateArgs,
    HandoverArgs, WatchArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use collector_desk::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Collector Desk",
    about = "Serve or query the collector desk against the money-loan API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Refresh one collector's cash custody state and print the gate
    DayState(DayStateArgs),
    /// Poll a collector's day state the way the dashboard does
    Watch(WatchArgs),
    /// Build (and optionally send) a calculator request from an application export
    BuildRequest(BuildRequestArgs),
    /// Start the end-of-day cash handover
    Handover(HandoverArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::DayState(args) => run_day_state(args).await,
        Command::Watch(args) => run_watch(args).await,
        Command::BuildRequest(args) => run_build_request(args).await,
        Command::Handover(args) => run_handover(args).await,
    }
}
