use crate::demo::{run_demo, run_import_check, DemoArgs, ImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use school_admissions::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "School Admissions",
    about = "Run the school admissions pipeline service or walk through it from the command line",
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
    /// Check an applicant CSV export without starting the service
    Import(ImportArgs),
    /// Run a scripted enquiry-to-enrollment walkthrough
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
    /// Applicant CSV export loaded into the pool before the server accepts requests
    #[arg(long)]
    pub(crate) seed_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Import(args) => run_import_check(args),
        Command::Demo(args) => run_demo(args),
    }
}
