mod aggregator;
mod api;
mod classifier;
#[cfg(feature = "cli")]
mod cli;
mod config;
mod error;
mod export;
mod fetcher;
mod models;
mod parser;
mod report;
mod ui;

use anyhow::{Context, Result};
use config::Config;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use ui::App;

const LOG_FILE: &str = "canvas_grade_auditor.log";

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "cli")]
    let args = <cli::Args as clap::Parser>::parse();

    #[cfg(feature = "cli")]
    if let Some(courses) = args.courses.as_deref() {
        init_logging(LogTarget::Stderr)?;
        let client = build_client()?;
        return cli::run(&client, courses, args.export.clone()).await;
    }

    // The TUI owns the terminal, so logs go to a file
    init_logging(LogTarget::File)?;
    let client = build_client()?;

    // Start TUI application
    let mut app = App::new(client);
    app.run().await?;

    Ok(())
}

fn build_client() -> Result<api::CanvasClient> {
    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(base_url = %config.base_url, "Configuration loaded");
    api::CanvasClient::new(&config).context("Failed to initialize Canvas client")
}

enum LogTarget {
    File,
    #[cfg_attr(not(feature = "cli"), allow(dead_code))]
    Stderr,
}

fn init_logging(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::File => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(LOG_FILE)
                .with_context(|| format!("Failed to open log file {}", LOG_FILE))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}
