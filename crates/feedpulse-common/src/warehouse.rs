//! ClickHouse extractor for the daily usage aggregates
//!
//! Four read-only queries run against the usage-events table, each grouping
//! events by calendar day over the report window. The queries share nothing
//! but the immutable connection settings and are executed concurrently.

use crate::error::{ReportError, Result};
use crate::types::{DailySeries, MetricKind, MetricPoint, ReportWindow};
use crate::utils::click_through_ratio;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use clickhouse::{Client, Row};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Connection descriptor for the analytical data store
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// HTTP endpoint, e.g. "http://clickhouse.internal:8123"
    pub url: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Table holding one row per user action
    pub table: String,
}

impl WarehouseConfig {
    pub fn new(
        url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            table: "feed_actions".to_string(),
        }
    }

    /// Set the events table
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

/// Source of the per-day metric series
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch one metric over the window, ascending by date.
    async fn fetch(&self, metric: MetricKind, window: ReportWindow) -> Result<DailySeries>;
}

/// ClickHouse `Date` columns arrive as days since the Unix epoch
fn date_from_days(days: u16) -> NaiveDate {
    NaiveDate::default() + Duration::days(i64::from(days))
}

#[derive(Debug, Row, Deserialize)]
struct DailyCountRow {
    day: u16,
    value: u64,
}

#[derive(Debug, Row, Deserialize)]
struct DailyEngagementRow {
    day: u16,
    likes: u64,
    views: u64,
}

/// Build the aggregate query for a metric.
///
/// The two `?` placeholders are bound to the window start and end.
pub fn metric_query(metric: MetricKind, table: &str) -> String {
    let select = match metric {
        MetricKind::ActiveUsers => "uniqExact(user_id) AS value",
        MetricKind::Views => "countIf(action = 'view') AS value",
        MetricKind::Likes => "countIf(action = 'like') AS value",
        MetricKind::ClickThroughRate => {
            "countIf(action = 'like') AS likes, countIf(action = 'view') AS views"
        }
    };

    format!(
        "SELECT toDate(time) AS day, {select} \
         FROM {table} \
         WHERE toDate(time) BETWEEN toDate(?) AND toDate(?) \
         GROUP BY day \
         ORDER BY day"
    )
}

/// ClickHouse-backed [`MetricSource`]
#[derive(Clone)]
pub struct ClickHouseSource {
    client: Client,
    table: String,
}

impl std::fmt::Debug for ClickHouseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHouseSource")
            .field("client", &"<clickhouse::Client>")
            .field("table", &self.table)
            .finish()
    }
}

impl ClickHouseSource {
    /// Create a source from the connection descriptor
    pub fn new(config: &WarehouseConfig) -> Self {
        let client = Client::default()
            .with_url(&config.url)
            .with_user(&config.user)
            .with_password(&config.password)
            .with_database(&config.database);

        Self {
            client,
            table: config.table.clone(),
        }
    }

    async fn fetch_counts(&self, metric: MetricKind, window: ReportWindow) -> Result<Vec<MetricPoint>> {
        let rows = self
            .client
            .query(&metric_query(metric, &self.table))
            .bind(window.start.to_string())
            .bind(window.end.to_string())
            .fetch_all::<DailyCountRow>()
            .await
            .map_err(|e| {
                ReportError::data_access_with_source(format!("{} query failed", metric), e)
            })?;

        Ok(rows
            .into_iter()
            .map(|row| MetricPoint::new(date_from_days(row.day), row.value as f64))
            .collect())
    }

    async fn fetch_ctr(&self, window: ReportWindow) -> Result<Vec<MetricPoint>> {
        let rows = self
            .client
            .query(&metric_query(MetricKind::ClickThroughRate, &self.table))
            .bind(window.start.to_string())
            .bind(window.end.to_string())
            .fetch_all::<DailyEngagementRow>()
            .await
            .map_err(|e| ReportError::data_access_with_source("ctr query failed", e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let date = date_from_days(row.day);
                if row.views == 0 {
                    warn!(%date, likes = row.likes, "No views recorded, CTR reported as 0");
                }
                MetricPoint::new(date, click_through_ratio(row.likes, row.views))
            })
            .collect())
    }
}

#[async_trait]
impl MetricSource for ClickHouseSource {
    #[instrument(skip(self), fields(metric = %metric, window = %window))]
    async fn fetch(&self, metric: MetricKind, window: ReportWindow) -> Result<DailySeries> {
        debug!("Querying {}", self.table);

        let points = match metric {
            MetricKind::ClickThroughRate => self.fetch_ctr(window).await?,
            _ => self.fetch_counts(metric, window).await?,
        };

        let series = DailySeries::new(metric, points)?;
        info!(rows = series.len(), "Fetched {}", metric);
        Ok(series)
    }
}
