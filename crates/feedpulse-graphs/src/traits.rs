//! Graph renderer trait definitions.

use feedpulse_common::{MetricSet, Result};
use std::io::Cursor;

/// A rendered chart held in memory, ready for upload.
#[derive(Debug, Clone)]
pub struct TrendChart {
    /// Attachment name, e.g. `product_metrics_2025_02_27.png`
    pub file_name: String,
    /// Encoded PNG, positioned at byte 0
    pub image: Cursor<Vec<u8>>,
}

impl TrendChart {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            image: Cursor::new(bytes),
        }
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        self.image.get_ref()
    }

    pub fn len(&self) -> usize {
        self.image.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.image.get_ref().is_empty()
    }
}

/// Trait for renderers that turn a metric set into a chart image.
///
/// Rendering is CPU-bound and synchronous; async callers run it on the
/// blocking pool.
pub trait GraphRenderer: Send + Sync {
    /// Renders the chart for the given metrics.
    fn render(&self, metrics: &MetricSet) -> Result<TrendChart>;

    /// Gets the name of this graph type.
    fn name(&self) -> &'static str;
}
