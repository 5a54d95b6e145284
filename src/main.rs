use anyhow::Result;
use clap::Parser;
use defectlens::cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting DefectLens - Jira defect dashboard backend");
    cli.execute().await?;

    Ok(())
}
