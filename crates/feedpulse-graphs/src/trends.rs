//! Week-over-week trend data prepared for plotting.
//!
//! Everything here is a pure function of the [`MetricSet`]; the renderer only
//! draws what these types contain.

use chrono::{Duration, NaiveDate};
use feedpulse_common::{
    format_compact_date, ratio_to_percent, weekday_abbrev, DailySeries, MetricKind, MetricSet,
};

/// Trend of one metric over the most recent days.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPanel {
    /// Metric shown by this panel
    pub metric: MetricKind,
    /// Values of the current week, one per date of [`WeeklyTrends::dates`],
    /// absent when the series has no row for that date
    pub current: Vec<Option<f64>>,
    /// Value of the same metric `offset` days earlier, when inside the series
    pub prior: Vec<Option<f64>>,
}

impl TrendPanel {
    fn from_series(series: &DailySeries, dates: &[NaiveDate], offset: Duration) -> Self {
        let metric = series.metric();
        let scale = |value: f64| {
            if metric.is_ratio() {
                ratio_to_percent(value)
            } else {
                value
            }
        };

        let current = dates
            .iter()
            .map(|date| series.value_on(*date).map(scale))
            .collect();
        let prior = dates
            .iter()
            .map(|date| series.value_on(*date - offset).map(scale))
            .collect();

        Self {
            metric,
            current,
            prior,
        }
    }

    /// Current-week points that exist, keyed by position on the x-axis.
    pub fn current_points(&self) -> Vec<(usize, f64)> {
        present_points(&self.current)
    }

    /// Comparison points that exist, keyed by position on the x-axis.
    pub fn prior_points(&self) -> Vec<(usize, f64)> {
        present_points(&self.prior)
    }

    /// Smallest and largest plotted value across both traces.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.current
            .iter()
            .chain(&self.prior)
            .flatten()
            .copied()
            .fold(None, |bounds, v| match bounds {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn present_points(values: &[Option<f64>]) -> Vec<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i, v)))
        .collect()
}

/// The four panels of the daily chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyTrends {
    /// Current-week dates, ascending; position k is the same day in every panel
    pub dates: Vec<NaiveDate>,
    /// Panels in grid order: active users, views, likes, CTR
    pub panels: Vec<TrendPanel>,
}

impl WeeklyTrends {
    /// Builds the trends over the last `days` dates of the set, compared with
    /// the values `offset_days` earlier.
    pub fn from_metrics(metrics: &MetricSet, days: usize, offset_days: u32) -> Self {
        let dates = metrics.recent_dates(days);
        let offset = Duration::days(i64::from(offset_days));
        let panels = MetricKind::ALL
            .iter()
            .map(|metric| TrendPanel::from_series(metrics.get(*metric), &dates, offset))
            .collect();

        Self { dates, panels }
    }

    /// Abbreviated weekday names for the x-axis.
    pub fn weekday_labels(&self) -> Vec<String> {
        self.dates.iter().map(|d| weekday_abbrev(*d)).collect()
    }

    /// Latest plotted date.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Attachment name derived from the latest date.
    pub fn file_name(&self) -> String {
        match self.latest_date() {
            Some(date) => format!("product_metrics_{}.png", format_compact_date(date)),
            None => "product_metrics.png".to_string(),
        }
    }

    pub fn panel(&self, metric: MetricKind) -> Option<&TrendPanel> {
        self.panels.iter().find(|p| p.metric == metric)
    }
}
