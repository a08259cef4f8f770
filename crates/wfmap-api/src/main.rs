//! wfmap - map chromestatus entries to web-features ids

use clap::Parser;

use wfmap_api::{commands, telemetry, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = telemetry::init_tracing();

    let cli = Cli::parse();
    commands::run(cli).await
}
