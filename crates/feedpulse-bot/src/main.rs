//! FeedPulse - Main Entry Point

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use feedpulse_bot::ReportBot;
use feedpulse_common::init_logging;
use feedpulse_config::ConfigLoader;
use std::path::PathBuf;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Run the report once and exit
    #[arg(long)]
    once: bool,

    /// Report run date for --once (defaults to today, UTC)
    #[arg(long, requires = "once")]
    run_date: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::new(args.config)
        .load()
        .context("Failed to load configuration")?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting FeedPulse");

    let bot = ReportBot::new(config)?;

    if args.once {
        let run_date = args.run_date.unwrap_or_else(|| Utc::now().date_naive());
        return match bot.run_once(run_date).await {
            Ok(summary) => {
                info!(report_date = %summary.report_date, "Report sent");
                Ok(())
            }
            Err(e) => {
                error!(%run_date, error = %e, "Report run failed");
                Err(e.into())
            }
        };
    }

    bot.run_scheduled().await?;
    Ok(())
}
