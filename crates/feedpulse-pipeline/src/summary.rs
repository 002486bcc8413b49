//! Report message built from the latest day of each series.

use chrono::NaiveDate;
use feedpulse_common::{format_count, format_long_date, ratio_to_percent, MetricSet, Result};
use std::fmt;

/// The latest day's values shown in the report.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub active_users: f64,
    pub views: f64,
    pub likes: f64,
    /// Click-through rate as a percentage rounded to two decimals
    pub ctr_percent: f64,
}

impl DailySnapshot {
    /// Takes the last point of every series.
    pub fn from_metrics(metrics: &MetricSet) -> Result<Self> {
        let active_users = metrics.active_users().require_latest()?;
        let views = metrics.views().require_latest()?;
        let likes = metrics.likes().require_latest()?;
        let ctr = metrics.ctr().require_latest()?;

        Ok(Self {
            date: active_users.date,
            active_users: active_users.value,
            views: views.value,
            likes: likes.value,
            ctr_percent: ratio_to_percent(ctr.value),
        })
    }
}

/// HTML caption sent with the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMessage {
    /// Day the message reports on
    pub date: NaiveDate,
    text: String,
}

impl ReportMessage {
    pub fn new(date: NaiveDate, text: impl Into<String>) -> Self {
        Self {
            date,
            text: text.into(),
        }
    }

    pub fn from_snapshot(snapshot: &DailySnapshot) -> Self {
        let text = format!(
            "For <b>{date}</b>, the key product metrics were as follows:\n\
             - Daily Active Users (DAU): <b>{dau}</b>\n\
             - Total views by all active users: <b>{views}</b>\n\
             - Total likes by all active users: <b>{likes}</b>\n\
             - Click-Through Rate (CTR) (views to likes): <b>{ctr:.2}%</b>\n\n\
             Above this message, you can see the metrics' trends over the past 7 days \
             compared to the previous 7-day period. Tap the image to see closer.\n",
            date = format_long_date(snapshot.date),
            dau = format_count(snapshot.active_users),
            views = format_count(snapshot.views),
            likes = format_count(snapshot.likes),
            ctr = snapshot.ctr_percent,
        );

        Self::new(snapshot.date, text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters once the HTML markup is parsed, as the caption
    /// limit counts them.
    pub fn char_count(&self) -> usize {
        visible_chars(&self.text)
    }
}

/// Counts the characters a reader sees: tags count nothing and each entity
/// such as `&amp;` counts as one.
fn visible_chars(html: &str) -> usize {
    let mut count = 0;
    let mut rest = html;

    while let Some(c) = rest.chars().next() {
        let skip = match c {
            '<' => rest.find('>').map(|end| end + 1),
            '&' => entity_len(rest),
            _ => None,
        };
        match skip {
            Some(len) if c == '<' => rest = &rest[len..],
            Some(len) => {
                count += 1;
                rest = &rest[len..];
            }
            None => {
                count += 1;
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    count
}

/// Byte length of a named or numeric entity at the start of `text`.
fn entity_len(text: &str) -> Option<usize> {
    let end = text.get(1..)?.find(';')? + 1;
    let name = &text[1..end];
    let well_formed = !name.is_empty()
        && name.len() <= 8
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    well_formed.then_some(end + 1)
}

impl fmt::Display for ReportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Builds the report message for a metric set.
pub fn summarize(metrics: &MetricSet) -> Result<ReportMessage> {
    let snapshot = DailySnapshot::from_metrics(metrics)?;
    Ok(ReportMessage::from_snapshot(&snapshot))
}
