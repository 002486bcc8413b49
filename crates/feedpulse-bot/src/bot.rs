//! Wiring of configuration, pipeline and scheduler.

use crate::error::BotResult;
use crate::scheduler::ReportScheduler;
use crate::telegram::TelegramPublisher;
use chrono::{NaiveDate, Utc};
use feedpulse_common::ClickHouseSource;
use feedpulse_config::Config;
use feedpulse_graphs::{fonts_available, WeeklyTrendRenderer};
use feedpulse_pipeline::{ReportPipeline, RunSummary, StagePolicy};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Name of the cron job running the daily report.
pub const DAILY_REPORT_JOB: &str = "daily_report";

/// Main bot structure.
pub struct ReportBot {
    config: Arc<Config>,
    pipeline: Arc<ReportPipeline>,
}

impl ReportBot {
    /// Builds the production pipeline: ClickHouse, plotters and Telegram.
    pub fn new(config: Config) -> BotResult<Self> {
        let source = Arc::new(ClickHouseSource::new(&config.clickhouse.to_warehouse()));
        let renderer = Arc::new(WeeklyTrendRenderer::new(
            config.chart.clone(),
            config.schedule.comparison_days,
        ));
        if !fonts_available() {
            warn!("No usable sans-serif font found, chart rendering will fail");
        }
        let publisher = Arc::new(TelegramPublisher::new(&config.telegram)?);

        let pipeline = ReportPipeline::new(
            source,
            renderer,
            publisher,
            StagePolicy::from_schedule(&config.schedule),
            config.schedule.window_days,
        );
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Uses an already assembled pipeline.
    pub fn with_pipeline(config: Config, pipeline: ReportPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the report once for `run_date`.
    pub async fn run_once(&self, run_date: NaiveDate) -> BotResult<RunSummary> {
        Ok(self.pipeline.run(run_date).await?)
    }

    /// Creates a scheduler with the daily report job registered, not yet started.
    pub async fn scheduler(&self) -> BotResult<ReportScheduler> {
        let scheduler = ReportScheduler::new().await?;
        let pipeline = Arc::clone(&self.pipeline);

        scheduler
            .add_job(DAILY_REPORT_JOB, &self.config.schedule.cron, move || {
                let pipeline = Arc::clone(&pipeline);
                async move {
                    let run_date = Utc::now().date_naive();
                    if let Err(e) = pipeline.run(run_date).await {
                        error!(%run_date, error = %e, "Daily report failed");
                    }
                }
            })
            .await?;

        Ok(scheduler)
    }

    /// Triggers the report on schedule until Ctrl-C.
    pub async fn run_scheduled(&self) -> BotResult<()> {
        let mut scheduler = self.scheduler().await?;
        scheduler.start().await?;
        info!(cron = %self.config.schedule.cron, "FeedPulse is running, press Ctrl-C to stop");

        tokio::signal::ctrl_c().await?;
        info!("Received shutdown signal, starting graceful shutdown");

        scheduler.shutdown().await?;
        info!("FeedPulse has shut down");
        Ok(())
    }
}
