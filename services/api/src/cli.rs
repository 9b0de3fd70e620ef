use std::path::PathBuf;

use crate::batch::{run_batch, run_score};
use crate::server;
use clap::{Args, Parser, Subcommand};
use pretrial_dmf::config::AppConfig;
use pretrial_dmf::error::AppError;
use pretrial_dmf::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "pretrial-dmf",
    about = "Score pretrial risk assessments and resolve release recommendations",
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
    /// Score one responses document and print the result
    Score(ScoreArgs),
    /// Score every row of a CSV file and print one JSON line per row
    Batch(BatchArgs),
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

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON object holding the risk factor responses
    #[arg(long)]
    pub(crate) responses: PathBuf,
    /// Decision-matrix document; defaults to DMF_CONFIG_PATH or the bundled reference
    #[arg(long)]
    pub(crate) matrix: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV with an `assessmentId` column plus one column per response field
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Decision-matrix document; defaults to DMF_CONFIG_PATH or the bundled reference
    #[arg(long)]
    pub(crate) matrix: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => {
            let config = AppConfig::load()?;
            telemetry::init(&config.telemetry)?;
            run_score(args, &config)
        }
        Command::Batch(args) => {
            let config = AppConfig::load()?;
            telemetry::init(&config.telemetry)?;
            run_batch(args, &config)
        }
    }
}
