//! Test utilities and shared fixtures for the FeedPulse workspace.
//!
//! Enabled for dependants through the `testing` feature.

use crate::types::{DailySeries, MetricKind, MetricPoint, MetricSet};
use chrono::{Duration, NaiveDate};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Fixtures for metric series.
pub mod metric_fixtures {
    use super::*;

    /// The last day of the reference fixture window.
    pub fn report_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 27).expect("valid fixture date")
    }

    /// A series with one value per consecutive day, the last value on `end`.
    pub fn series_ending(metric: MetricKind, end: NaiveDate, values: &[f64]) -> DailySeries {
        let start = end - Duration::days(values.len() as i64 - 1);
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| MetricPoint::new(start + Duration::days(i as i64), *v))
            .collect();
        DailySeries::new(metric, points).expect("fixture dates are unique")
    }

    /// `days` values starting at `first` and growing by `step`.
    pub fn ramp(days: usize, first: f64, step: f64) -> Vec<f64> {
        (0..days).map(|i| first + step * i as f64).collect()
    }

    /// Fourteen aligned days ending on [`report_date`].
    ///
    /// Active users 100, 105, .., 165; views 500 + 10/day; likes 100 + 2/day;
    /// CTR likes/views, except the last day which has 50 views and 10 likes.
    pub fn two_week_set() -> MetricSet {
        set_with_days(14)
    }

    /// Like [`two_week_set`] but covering only the last `days` days.
    pub fn set_with_days(days: usize) -> MetricSet {
        let end = report_date();
        let mut views = ramp(days, 500.0, 10.0);
        let mut likes = ramp(days, 100.0, 2.0);
        if let (Some(v), Some(l)) = (views.last_mut(), likes.last_mut()) {
            *v = 50.0;
            *l = 10.0;
        }
        let ctr: Vec<f64> = likes.iter().zip(&views).map(|(l, v)| l / v).collect();

        MetricSet::new(
            series_ending(MetricKind::ActiveUsers, end, &ramp(days, 100.0, 5.0)),
            series_ending(MetricKind::Views, end, &views),
            series_ending(MetricKind::Likes, end, &likes),
            series_ending(MetricKind::ClickThroughRate, end, &ctr),
        )
        .expect("fixture series are aligned")
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// A minimal valid configuration as YAML.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
clickhouse:
  url: "http://localhost:8123"
  user: "reader"
  password: "test_password"
  database: "simulator"

telegram:
  token: "123456:test_token"
  chat_id: -100123456
"#
    }
}

/// In-memory [`MetricSource`](crate::warehouse::MetricSource) doubles.
pub mod source_fixtures {
    use crate::error::{ReportError, Result};
    use crate::types::{DailySeries, MetricKind, MetricSet, ReportWindow};
    use crate::warehouse::MetricSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves the series of a fixed set and counts calls.
    #[derive(Debug)]
    pub struct StaticSource {
        set: MetricSet,
        calls: AtomicUsize,
    }

    impl StaticSource {
        pub fn new(set: MetricSet) -> Self {
            Self {
                set,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricSource for StaticSource {
        async fn fetch(&self, metric: MetricKind, _window: ReportWindow) -> Result<DailySeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.set.get(metric).clone())
        }
    }

    /// Fails the first `failures` calls for one metric, then serves `set`.
    #[derive(Debug)]
    pub struct FlakySource {
        set: MetricSet,
        metric: MetricKind,
        failures: usize,
        attempts: AtomicUsize,
    }

    impl FlakySource {
        pub fn new(set: MetricSet, metric: MetricKind, failures: usize) -> Self {
            Self {
                set,
                metric,
                failures,
                attempts: AtomicUsize::new(0),
            }
        }

        /// Calls made for the failing metric.
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricSource for FlakySource {
        async fn fetch(&self, metric: MetricKind, _window: ReportWindow) -> Result<DailySeries> {
            if metric == self.metric {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
                if attempt < self.failures {
                    return Err(ReportError::data_access(format!(
                        "simulated failure {} for {}",
                        attempt + 1,
                        metric
                    )));
                }
            }
            Ok(self.set.get(metric).clone())
        }
    }
}
