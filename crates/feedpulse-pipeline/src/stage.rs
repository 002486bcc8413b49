//! Uniform retry policy applied to every pipeline stage.

use feedpulse_common::{MetricKind, ReportError, Result};
use feedpulse_config::ScheduleConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;
use tracing::{debug, error, info_span, warn, Instrument};

/// A unit of work in the daily report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract(MetricKind),
    Summarize,
    Render,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract(metric) => write!(f, "extract_{}", metric.key()),
            Stage::Summarize => f.write_str("summarize"),
            Stage::Render => f.write_str("render"),
            Stage::Publish => f.write_str("publish"),
        }
    }
}

/// Retries after the first failed attempt, with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl StagePolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn from_schedule(schedule: &ScheduleConfig) -> Self {
        Self::new(schedule.retries, schedule.retry_delay())
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts a stage may make.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Runs `action` until it succeeds, fails with a non-retryable error, or
    /// the retries are used up.
    pub async fn run<T, F, Fut>(&self, stage: Stage, mut action: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let strategy = FixedInterval::new(self.delay).take(self.retries as usize);
        let max_attempts = self.max_attempts();
        let mut attempt = 0u32;
        let mut failures = 0u32;

        let result = RetryIf::start(
            strategy,
            || {
                attempt += 1;
                debug!(attempt, max_attempts, "Starting attempt");
                action()
            },
            |err: &ReportError| {
                failures += 1;
                let retry = err.is_retryable() && failures < max_attempts;
                if retry {
                    warn!(
                        error = %err,
                        failures,
                        delay_secs = self.delay.as_secs(),
                        "Stage failed, will retry"
                    );
                }
                retry
            },
        )
        .instrument(info_span!("stage", stage = %stage))
        .await;

        if let Err(err) = &result {
            error!(stage = %stage, error = %err, "Stage failed");
        }
        result
    }
}

impl Default for StagePolicy {
    fn default() -> Self {
        Self::from_schedule(&ScheduleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(retries: u32) -> StagePolicy {
        StagePolicy::new(retries, Duration::ZERO)
    }

    #[test]
    fn test_default_policy() {
        let policy = StagePolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.delay, Duration::from_secs(600));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(
            Stage::Extract(MetricKind::ClickThroughRate).to_string(),
            "extract_ctr"
        );
        assert_eq!(Stage::Publish.to_string(), "publish");
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast(3)
            .run(Stage::Render, || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ReportError::render("flaky"))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(3)
            .run(Stage::Publish, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ReportError::delivery("rejected"))
            })
            .await;

        assert!(matches!(result, Err(ReportError::Delivery { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_config_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(3)
            .run(Stage::Summarize, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ReportError::config("bad"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_misaligned_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast(3)
            .run(Stage::Extract(MetricKind::Views), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ReportError::misaligned("views has more than one row for 2025-02-27"))
            })
            .await;

        assert!(matches!(result, Err(ReportError::Misaligned { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_fixed_delay() {
        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let policy = StagePolicy::new(2, Duration::from_secs(600));

        let _: Result<()> = policy
            .run(Stage::Render, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ReportError::render("broken"))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(1200));
        assert!(elapsed < Duration::from_secs(1201));
    }
}
