mod batch;
mod cli;
mod infra;
mod routes;
mod server;

use pretrial_dmf::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
