//! Delivery seam between the pipeline and a messaging channel.

use crate::summary::ReportMessage;
use async_trait::async_trait;
use feedpulse_common::Result;
use feedpulse_graphs::TrendChart;

/// Sends the finished report.
///
/// Implementations deliver message and chart together in a single call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: &ReportMessage, chart: &TrendChart) -> Result<()>;
}
