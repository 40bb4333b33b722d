use crate::demo::{run_demo, run_prorate, DemoArgs, ProrateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housing_forms::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Housing Forms Service",
    about = "Run and demonstrate the manual check request form service from the command line",
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
    /// Compute a prorated HAP amount for a vacate date
    Prorate(ProrateArgs),
    /// Run an end-to-end CLI demo of the MCR submission and approval flow
    Demo(DemoArgs),
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
        Command::Prorate(args) => run_prorate(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
