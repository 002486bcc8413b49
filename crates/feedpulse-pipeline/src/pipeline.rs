//! The daily report run: four extractions fan out to the summary and the
//! chart, which converge on a single publish.

use crate::publish::Publisher;
use crate::stage::{Stage, StagePolicy};
use crate::summary::{summarize, ReportMessage};
use chrono::NaiveDate;
use feedpulse_common::{
    DailySeries, MetricKind, MetricSet, MetricSource, ReportError, ReportWindow, Result,
};
use feedpulse_graphs::{GraphRenderer, TrendChart};
use std::sync::Arc;
use tracing::{info, instrument};

/// What a successful run delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub report_date: NaiveDate,
    pub window: ReportWindow,
    pub file_name: String,
    pub image_bytes: usize,
    pub caption_chars: usize,
}

/// Wires a metric source, renderer and publisher into one run.
pub struct ReportPipeline {
    source: Arc<dyn MetricSource>,
    renderer: Arc<dyn GraphRenderer>,
    publisher: Arc<dyn Publisher>,
    policy: StagePolicy,
    window_days: u32,
}

impl ReportPipeline {
    pub fn new(
        source: Arc<dyn MetricSource>,
        renderer: Arc<dyn GraphRenderer>,
        publisher: Arc<dyn Publisher>,
        policy: StagePolicy,
        window_days: u32,
    ) -> Self {
        Self {
            source,
            renderer,
            publisher,
            policy,
            window_days,
        }
    }

    /// Days queried for a run started on `run_date`.
    pub fn window_for(&self, run_date: NaiveDate) -> ReportWindow {
        ReportWindow::ending_yesterday(run_date, self.window_days)
    }

    /// Executes the whole run. Nothing is published unless every upstream
    /// stage succeeded.
    #[instrument(skip(self), fields(run_date = %run_date))]
    pub async fn run(&self, run_date: NaiveDate) -> Result<RunSummary> {
        let window = self.window_for(run_date);
        info!(%window, "Starting daily report");

        let metrics = Arc::new(self.extract(window).await?);

        let (message, chart) =
            tokio::try_join!(self.summarize_stage(&metrics), self.render_stage(&metrics))?;

        self.policy
            .run(Stage::Publish, || self.publisher.publish(&message, &chart))
            .await?;

        let summary = RunSummary {
            report_date: message.date,
            window,
            file_name: chart.file_name.clone(),
            image_bytes: chart.len(),
            caption_chars: message.char_count(),
        };
        info!(
            report_date = %summary.report_date,
            file_name = %summary.file_name,
            image_bytes = summary.image_bytes,
            "Daily report published"
        );
        Ok(summary)
    }

    /// Runs the four extractions concurrently and aligns their results.
    pub async fn extract(&self, window: ReportWindow) -> Result<MetricSet> {
        let (active_users, views, likes, ctr) = tokio::try_join!(
            self.fetch_stage(MetricKind::ActiveUsers, window),
            self.fetch_stage(MetricKind::Views, window),
            self.fetch_stage(MetricKind::Likes, window),
            self.fetch_stage(MetricKind::ClickThroughRate, window),
        )?;

        MetricSet::new(active_users, views, likes, ctr)
    }

    async fn fetch_stage(&self, metric: MetricKind, window: ReportWindow) -> Result<DailySeries> {
        self.policy
            .run(Stage::Extract(metric), || async move {
                let series = self.source.fetch(metric, window).await?;
                if series.is_empty() {
                    return Err(ReportError::empty_result(metric.key()));
                }
                Ok(series)
            })
            .await
    }

    async fn summarize_stage(&self, metrics: &Arc<MetricSet>) -> Result<ReportMessage> {
        self.policy
            .run(Stage::Summarize, || async move { summarize(metrics) })
            .await
    }

    async fn render_stage(&self, metrics: &Arc<MetricSet>) -> Result<TrendChart> {
        self.policy
            .run(Stage::Render, || {
                let renderer = Arc::clone(&self.renderer);
                let metrics = Arc::clone(metrics);
                async move {
                    tokio::task::spawn_blocking(move || renderer.render(&metrics))
                        .await
                        .map_err(|e| ReportError::render_with_source("render task failed", e))?
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::MockPublisher;
    use feedpulse_common::test_utils::metric_fixtures::*;
    use feedpulse_common::test_utils::source_fixtures::{FlakySource, StaticSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubRenderer {
        calls: AtomicUsize,
    }

    impl StubRenderer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl GraphRenderer for StubRenderer {
        fn render(&self, metrics: &MetricSet) -> Result<TrendChart> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TrendChart::new(
                format!("stub_{}.png", metrics.latest_date()?),
                vec![0x89, b'P', b'N', b'G'],
            ))
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct BrokenRenderer;

    impl GraphRenderer for BrokenRenderer {
        fn render(&self, _metrics: &MetricSet) -> Result<TrendChart> {
            Err(ReportError::render("no fonts"))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
    }

    fn pipeline(
        source: Arc<dyn MetricSource>,
        renderer: Arc<dyn GraphRenderer>,
        publisher: MockPublisher,
    ) -> ReportPipeline {
        ReportPipeline::new(
            source,
            renderer,
            Arc::new(publisher),
            StagePolicy::new(3, Duration::ZERO),
            14,
        )
    }

    #[tokio::test]
    async fn test_publishes_once_with_message_and_chart() {
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .withf(|message, chart| {
                message.as_str().contains("February 27, 2025")
                    && message.as_str().contains("<b>20.00%</b>")
                    && chart.file_name == "stub_2025-02-27.png"
                    && !chart.is_empty()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let source = Arc::new(StaticSource::new(two_week_set()));
        let renderer = Arc::new(StubRenderer::new());
        let summary = pipeline(source.clone(), renderer.clone(), publisher)
            .run(run_date())
            .await
            .unwrap();

        assert_eq!(summary.report_date, report_date());
        assert_eq!(summary.window.end, report_date());
        assert_eq!(summary.window.days(), 14);
        assert_eq!(source.calls(), 4);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_render_failure_skips_publish() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(0);

        let err = pipeline(
            Arc::new(StaticSource::new(two_week_set())),
            Arc::new(BrokenRenderer),
            publisher,
        )
        .run(run_date())
        .await
        .unwrap_err();

        assert!(matches!(err, ReportError::Render { .. }));
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_publish() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(0);

        let source = Arc::new(FlakySource::new(two_week_set(), MetricKind::Likes, 10));
        let err = pipeline(source.clone(), Arc::new(StubRenderer::new()), publisher)
            .run(run_date())
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::DataAccess { .. }));
        assert_eq!(source.attempts(), 4);
    }

    #[tokio::test]
    async fn test_transient_extraction_failure_is_retried() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(1).returning(|_, _| Ok(()));

        let source = Arc::new(FlakySource::new(two_week_set(), MetricKind::Views, 2));
        pipeline(source.clone(), Arc::new(StubRenderer::new()), publisher)
            .run(run_date())
            .await
            .unwrap();

        assert_eq!(source.attempts(), 3);
    }

    #[tokio::test]
    async fn test_delivery_retried_then_fails() {
        let mut publisher = MockPublisher::new();
        publisher
            .expect_publish()
            .times(4)
            .returning(|_, _| Err(ReportError::delivery_with_code("Bad Request", 400)));

        let err = pipeline(
            Arc::new(StaticSource::new(two_week_set())),
            Arc::new(StubRenderer::new()),
            publisher,
        )
        .run(run_date())
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ReportError::Delivery {
                error_code: Some(400),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_short_history_still_publishes() {
        let mut publisher = MockPublisher::new();
        publisher.expect_publish().times(1).returning(|_, _| Ok(()));

        let summary = pipeline(
            Arc::new(StaticSource::new(set_with_days(3))),
            Arc::new(StubRenderer::new()),
            publisher,
        )
        .run(run_date())
        .await
        .unwrap();

        assert_eq!(summary.report_date, report_date());
    }
}
