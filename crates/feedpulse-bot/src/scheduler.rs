//! Cron trigger for the daily report using tokio-cron-scheduler.

use crate::error::{BotError, BotResult};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

/// Lets at most one run of a job execute at a time.
///
/// A trigger that fires while a run is in progress is dropped, not queued.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    lock: Arc<Mutex<()>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` unless another run holds the slot; returns `None` when skipped.
    pub async fn run<F, T>(&self, task: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let _slot = self.lock.try_lock().ok()?;
        Some(task.await)
    }

    pub fn is_running(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}

/// Next trigger of a seconds-first cron expression after `after`.
pub fn next_trigger(cron_expression: &str, after: DateTime<Utc>) -> BotResult<Option<DateTime<Utc>>> {
    let schedule = cron::Schedule::from_str(cron_expression).map_err(BotError::scheduler)?;
    Ok(schedule.after(&after).next())
}

/// Owns the cron scheduler that triggers report runs.
pub struct ReportScheduler {
    scheduler: JobScheduler,
    running: bool,
}

impl ReportScheduler {
    pub async fn new() -> BotResult<Self> {
        let scheduler = JobScheduler::new().await.map_err(BotError::scheduler)?;
        debug!("JobScheduler created successfully");
        Ok(Self {
            scheduler,
            running: false,
        })
    }

    /// Registers a job on `cron_expression`. Overlapping triggers are skipped.
    pub async fn add_job<F, Fut>(&self, name: &str, cron_expression: &str, job_fn: F) -> BotResult<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let flight = SingleFlight::new();
        let job_fn = Arc::new(job_fn);
        let job_name = name.to_string();

        let job = Job::new_async(cron_expression, move |_uuid, _scheduler| {
            let flight = flight.clone();
            let job_fn = Arc::clone(&job_fn);
            let job_name = job_name.clone();
            Box::pin(async move {
                if flight.run(job_fn()).await.is_none() {
                    warn!(job = %job_name, "Previous run still in progress, skipping trigger");
                }
            })
        })
        .map_err(BotError::scheduler)?;

        let job_id = self.scheduler.add(job).await.map_err(BotError::scheduler)?;

        match next_trigger(cron_expression, Utc::now())? {
            Some(next) => info!(job = name, %job_id, cron = cron_expression, %next, "Job scheduled"),
            None => warn!(job = name, cron = cron_expression, "Cron expression never fires"),
        }
        Ok(())
    }

    pub async fn start(&mut self) -> BotResult<()> {
        if self.running {
            warn!("Scheduler is already running");
            return Ok(());
        }
        self.scheduler.start().await.map_err(BotError::scheduler)?;
        self.running = true;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> BotResult<()> {
        if !self.running {
            return Ok(());
        }
        self.scheduler.shutdown().await.map_err(BotError::scheduler)?;
        self.running = false;
        info!("Scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
