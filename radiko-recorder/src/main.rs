use anyhow::Context;
use clap::Parser;

use radiko_recorder::{cli::Cli, commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before parsing so they act as option fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let _logging_guard =
        logging::init_logging(&cli.logging_options()).context("Failed to initialize logging")?;

    commands::execute(cli.command).await.map_err(|e| {
        tracing::error!("{}", e);
        anyhow::Error::new(e)
    })
}
