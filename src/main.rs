use anyhow::{Context, Result};
use career_kit::app_log;
use career_kit::{core::ConfigManager, start_web_server};
use std::fs::OpenOptions;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigManager::load()?;
    config.ensure_directories().await?;

    let log_path = &config.environment.log_path;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("career_kit=info,rocket::server=warn")),
        )
        .init();

    app_log!(info, "Environment: {}", config.environment_name);
    app_log!(info, "Templates: {}", config.environment.templates_path.display());
    app_log!(info, "Job search: {}", config.environment.job_search_url);

    start_web_server(config).await
}
