use anyhow::Result;
use career_kit::cli::{handle_command, CareerCli};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("career_kit=warn")),
        )
        .init();

    handle_command(CareerCli::parse()).await
}
