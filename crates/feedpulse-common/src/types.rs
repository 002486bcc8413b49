//! Common type definitions and newtype wrappers for domain modeling.

use crate::error::{ReportError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A Telegram chat ID. Group and channel chats are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four product metrics tracked by the daily report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Distinct users with any action on the day.
    ActiveUsers,
    /// Number of `view` actions.
    Views,
    /// Number of `like` actions.
    Likes,
    /// Likes divided by views, stored as a ratio.
    ClickThroughRate,
}

impl MetricKind {
    /// All metrics in grid order: top-left, top-right, bottom-left, bottom-right.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::ActiveUsers,
        MetricKind::Views,
        MetricKind::Likes,
        MetricKind::ClickThroughRate,
    ];

    /// Stable identifier used in logs and errors.
    pub fn key(self) -> &'static str {
        match self {
            Self::ActiveUsers => "active_users",
            Self::Views => "views",
            Self::Likes => "likes",
            Self::ClickThroughRate => "ctr",
        }
    }

    /// Chart subplot title.
    pub fn title(self) -> &'static str {
        match self {
            Self::ActiveUsers => "Daily Active Users",
            Self::Views => "Total Number of Views",
            Self::Likes => "Total Number of Likes",
            Self::ClickThroughRate => "Click Through Rate, %",
        }
    }

    /// Whether values are shown as a percentage rather than a raw count.
    pub fn is_ratio(self) -> bool {
        matches!(self, Self::ClickThroughRate)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One day's aggregate value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Per-day values of a single metric, sorted ascending by date with unique dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDailySeries")]
pub struct DailySeries {
    metric: MetricKind,
    points: Vec<MetricPoint>,
}

impl DailySeries {
    /// Build a series, sorting the points by date.
    ///
    /// Fails when two points share a date.
    pub fn new(metric: MetricKind, mut points: Vec<MetricPoint>) -> Result<Self> {
        points.sort_by_key(|p| p.date);
        if let Some(pair) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ReportError::misaligned(format!(
                "{} has more than one row for {}",
                metric, pair[0].date
            )));
        }
        Ok(Self { metric, points })
    }

    pub fn metric(&self) -> MetricKind {
        self.metric
    }

    pub fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The most recent day, or `None` for an empty series.
    pub fn latest(&self) -> Option<&MetricPoint> {
        self.points.last()
    }

    /// The most recent day, failing with [`ReportError::EmptyResult`] when there is none.
    pub fn require_latest(&self) -> Result<&MetricPoint> {
        self.latest()
            .ok_or_else(|| ReportError::empty_result(self.metric.key()))
    }

    /// The last `n` points (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[MetricPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Value recorded on `date`, if that day is in the series.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }
}

#[derive(Deserialize)]
struct RawDailySeries {
    metric: MetricKind,
    points: Vec<MetricPoint>,
}

impl TryFrom<RawDailySeries> for DailySeries {
    type Error = ReportError;

    fn try_from(raw: RawDailySeries) -> Result<Self> {
        Self::new(raw.metric, raw.points)
    }
}

/// The four series produced by one extraction run.
///
/// Construction guarantees every series is non-empty and all four cover the
/// same days, so position `k` means the same date for every metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMetricSet")]
pub struct MetricSet {
    active_users: DailySeries,
    views: DailySeries,
    likes: DailySeries,
    ctr: DailySeries,
}

#[derive(Deserialize)]
struct RawMetricSet {
    active_users: DailySeries,
    views: DailySeries,
    likes: DailySeries,
    ctr: DailySeries,
}

impl TryFrom<RawMetricSet> for MetricSet {
    type Error = ReportError;

    fn try_from(raw: RawMetricSet) -> Result<Self> {
        Self::new(raw.active_users, raw.views, raw.likes, raw.ctr)
    }
}

impl MetricSet {
    pub fn new(
        active_users: DailySeries,
        views: DailySeries,
        likes: DailySeries,
        ctr: DailySeries,
    ) -> Result<Self> {
        let set = Self {
            active_users,
            views,
            likes,
            ctr,
        };

        for series in set.iter() {
            if series.is_empty() {
                return Err(ReportError::empty_result(series.metric().key()));
            }
        }

        let reference: Vec<NaiveDate> = set.active_users.dates().collect();
        for series in [&set.views, &set.likes, &set.ctr] {
            if !series.dates().eq(reference.iter().copied()) {
                return Err(ReportError::misaligned(format!(
                    "{} covers different days than {}",
                    series.metric(),
                    set.active_users.metric()
                )));
            }
        }

        Ok(set)
    }

    pub fn active_users(&self) -> &DailySeries {
        &self.active_users
    }

    pub fn views(&self) -> &DailySeries {
        &self.views
    }

    pub fn likes(&self) -> &DailySeries {
        &self.likes
    }

    pub fn ctr(&self) -> &DailySeries {
        &self.ctr
    }

    /// Series for the given metric.
    pub fn get(&self, metric: MetricKind) -> &DailySeries {
        match metric {
            MetricKind::ActiveUsers => &self.active_users,
            MetricKind::Views => &self.views,
            MetricKind::Likes => &self.likes,
            MetricKind::ClickThroughRate => &self.ctr,
        }
    }

    /// Series in grid order.
    pub fn iter(&self) -> impl Iterator<Item = &DailySeries> {
        MetricKind::ALL.into_iter().map(move |m| self.get(m))
    }

    /// The most recent date present in the set.
    pub fn latest_date(&self) -> Result<NaiveDate> {
        self.active_users.require_latest().map(|p| p.date)
    }

    /// The most recent `days` dates present, ascending.
    pub fn recent_dates(&self, days: usize) -> Vec<NaiveDate> {
        self.active_users
            .tail(days)
            .iter()
            .map(|p| p.date)
            .collect()
    }
}

/// Inclusive range of calendar days queried for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportWindow {
    /// Window of `days` days ending the day before `run_date`.
    pub fn ending_yesterday(run_date: NaiveDate, days: u32) -> Self {
        let end = run_date - Duration::days(1);
        let start = end - Duration::days(i64::from(days.max(1)) - 1);
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn series(metric: MetricKind, days: &[u32]) -> DailySeries {
        DailySeries::new(
            metric,
            days.iter()
                .map(|d| MetricPoint::new(day(*d), f64::from(*d)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_series_is_sorted_on_construction() {
        let s = series(MetricKind::Views, &[20, 18, 19]);
        let dates: Vec<_> = s.dates().collect();
        assert_eq!(dates, vec![day(18), day(19), day(20)]);
        assert_eq!(s.latest().unwrap().value, 20.0);
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let result = DailySeries::new(
            MetricKind::Likes,
            vec![MetricPoint::new(day(1), 1.0), MetricPoint::new(day(1), 2.0)],
        );
        assert!(matches!(result, Err(ReportError::Misaligned { .. })));
    }

    #[test]
    fn test_require_latest_on_empty_series() {
        let s = DailySeries::new(MetricKind::Likes, vec![]).unwrap();
        let err = s.require_latest().unwrap_err();
        assert!(matches!(err, ReportError::EmptyResult { ref metric } if metric == "likes"));
    }

    #[test]
    fn test_tail_and_lookup() {
        let s = series(MetricKind::ActiveUsers, &[1, 2, 3, 4, 5]);
        assert_eq!(s.tail(2).len(), 2);
        assert_eq!(s.tail(10).len(), 5);
        assert_eq!(s.value_on(day(3)), Some(3.0));
        assert_eq!(s.value_on(day(9)), None);
    }

    #[test]
    fn test_metric_set_rejects_empty_series() {
        let err = MetricSet::new(
            series(MetricKind::ActiveUsers, &[1, 2]),
            series(MetricKind::Views, &[1, 2]),
            DailySeries::new(MetricKind::Likes, vec![]).unwrap(),
            series(MetricKind::ClickThroughRate, &[1, 2]),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::EmptyResult { ref metric } if metric == "likes"));
    }

    #[test]
    fn test_metric_set_rejects_misaligned_days() {
        let err = MetricSet::new(
            series(MetricKind::ActiveUsers, &[1, 2, 3]),
            series(MetricKind::Views, &[1, 3]),
            series(MetricKind::Likes, &[1, 2, 3]),
            series(MetricKind::ClickThroughRate, &[1, 2, 3]),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::Misaligned { .. }));
    }

    #[test]
    fn test_metric_set_dates() {
        let set = MetricSet::new(
            series(MetricKind::ActiveUsers, &[1, 2, 3]),
            series(MetricKind::Views, &[1, 2, 3]),
            series(MetricKind::Likes, &[1, 2, 3]),
            series(MetricKind::ClickThroughRate, &[1, 2, 3]),
        )
        .unwrap();
        assert_eq!(set.latest_date().unwrap(), day(3));
        assert_eq!(set.recent_dates(2), vec![day(2), day(3)]);
        assert_eq!(set.get(MetricKind::Likes).metric(), MetricKind::Likes);
    }

    #[test]
    fn test_deserialize_rejects_misaligned_set() {
        let json = r#"{
            "active_users": {"metric": "active_users", "points": [
                {"date": "2025-02-01", "value": 1.0}, {"date": "2025-02-02", "value": 2.0}]},
            "views": {"metric": "views", "points": [{"date": "2025-02-01", "value": 5.0}]},
            "likes": {"metric": "likes", "points": [
                {"date": "2025-02-01", "value": 1.0}, {"date": "2025-02-02", "value": 1.0}]},
            "ctr": {"metric": "click_through_rate", "points": [
                {"date": "2025-02-01", "value": 0.2}, {"date": "2025-02-02", "value": 0.5}]}
        }"#;
        let err = serde_json::from_str::<MetricSet>(json).unwrap_err();
        assert!(err.to_string().contains("covers different days"));
    }

    #[test]
    fn test_deserialize_rejects_empty_set() {
        let empty = |metric: &str| format!(r#"{{"metric": "{metric}", "points": []}}"#);
        let json = format!(
            r#"{{"active_users": {}, "views": {}, "likes": {}, "ctr": {}}}"#,
            empty("active_users"),
            empty("views"),
            empty("likes"),
            empty("click_through_rate")
        );
        assert!(serde_json::from_str::<MetricSet>(&json).is_err());
    }

    #[test]
    fn test_deserialize_sorts_series() {
        let json = r#"{"metric": "views", "points": [
            {"date": "2025-02-02", "value": 2.0}, {"date": "2025-02-01", "value": 1.0}]}"#;
        let series: DailySeries = serde_json::from_str(json).unwrap();
        assert_eq!(series.latest().unwrap().date, day(2));

        let duplicate = r#"{"metric": "views", "points": [
            {"date": "2025-02-01", "value": 2.0}, {"date": "2025-02-01", "value": 1.0}]}"#;
        assert!(serde_json::from_str::<DailySeries>(duplicate).is_err());
    }

    #[test]
    fn test_round_trip_through_json() {
        let set = MetricSet::new(
            series(MetricKind::ActiveUsers, &[1, 2]),
            series(MetricKind::Views, &[1, 2]),
            series(MetricKind::Likes, &[1, 2]),
            series(MetricKind::ClickThroughRate, &[1, 2]),
        )
        .unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(serde_json::from_str::<MetricSet>(&json).unwrap(), set);
    }

    #[test]
    fn test_window_ends_yesterday() {
        let window = ReportWindow::ending_yesterday(day(28), 14);
        assert_eq!(window.end, day(27));
        assert_eq!(window.start, day(14));
        assert_eq!(window.days(), 14);
        assert!(window.contains(day(20)));
        assert!(!window.contains(day(28)));
    }
}
