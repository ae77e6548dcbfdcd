use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use tracing::info;

use job_scout::cli::{Cli, Command};
use job_scout::{runner, AppConfig, Automation};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let summary = Automation::new(config)?.run().await?;
            info!(
                "Done: run {} found {} job(s), {} qualifying, {} notified",
                summary.run_id, summary.jobs_found, summary.qualifying, summary.notified
            );
        }
        Command::Schedule => {
            runner::run_scheduled(config).await?;
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false);

    match std::env::var("LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {path}"))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(file)
                        .with_current_span(false)
                        .with_span_list(false),
                )
                .init();
        }
        Err(_) => {
            tracing_subscriber::registry().with(filter).with(console).init();
        }
    }

    Ok(())
}
