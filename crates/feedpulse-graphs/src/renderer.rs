//! 2×2 week-over-week trend chart drawn with plotters.

use crate::traits::{GraphRenderer, TrendChart};
use crate::trends::{TrendPanel, WeeklyTrends};
use crate::utils::{padded_range, parse_color};
use feedpulse_common::{MetricKind, MetricSet, ReportError, Result};
use feedpulse_config::ChartConfig;
use image::{ImageOutputFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;
use tracing::{debug, info, instrument};

const FONT_FAMILY: &str = "sans-serif";
const LINE_ALPHA: f64 = 0.5;
const CURRENT_LABEL: &str = "Current Week";
const COMPARISON_LABEL: &str = "1 Week Offset";

/// Renders the current week of every metric against the week before.
#[derive(Debug, Clone)]
pub struct WeeklyTrendRenderer {
    chart: ChartConfig,
    days: usize,
    offset_days: u32,
}

impl WeeklyTrendRenderer {
    /// Creates a renderer plotting `comparison_days` days against the same
    /// span `comparison_days` earlier.
    pub fn new(chart: ChartConfig, comparison_days: u32) -> Self {
        Self {
            chart,
            days: comparison_days as usize,
            offset_days: comparison_days,
        }
    }

    /// Prepares the plotted values.
    pub fn trends(&self, metrics: &MetricSet) -> WeeklyTrends {
        WeeklyTrends::from_metrics(metrics, self.days, self.offset_days)
    }

    /// Draws all panels and returns the encoded PNG.
    pub fn draw(&self, trends: &WeeklyTrends) -> Result<Vec<u8>> {
        let (width, height) = (self.chart.width, self.chart.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&parse_color(&self.chart.colors.background))?;

            let labels = trends.weekday_labels();
            let areas = root.split_evenly((2, 2));
            for (area, panel) in areas.iter().zip(&trends.panels) {
                debug!(metric = %panel.metric, points = panel.current.len(), "Drawing panel");
                self.draw_panel(area, panel, &labels)?;
            }

            root.present()?;
        }

        encode_png(buffer, width, height)
    }

    fn metric_color(&self, metric: MetricKind) -> RGBColor {
        let colors = &self.chart.colors;
        parse_color(match metric {
            MetricKind::ActiveUsers => &colors.active_users,
            MetricKind::Views => &colors.views,
            MetricKind::Likes => &colors.likes,
            MetricKind::ClickThroughRate => &colors.ctr,
        })
    }

    fn draw_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &TrendPanel,
        labels: &[String],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let current_color = self.metric_color(panel.metric).mix(LINE_ALPHA);
        let comparison_color = parse_color(&self.chart.colors.comparison).mix(LINE_ALPHA);
        let grid_color = parse_color(&self.chart.colors.grid);
        let stroke = self.chart.line_width;
        let label_font = (FONT_FAMILY, self.chart.label_font_size);

        let ticks = labels.len().max(1);
        let x_range = day_axis(ticks);
        let (y_min, y_max) = padded_range(panel.value_bounds());

        let mut chart = ChartBuilder::on(area)
            .caption(
                panel.metric.title(),
                (FONT_FAMILY, self.chart.title_font_size),
            )
            .margin(20)
            .x_label_area_size(self.chart.label_font_size * 2)
            .y_label_area_size(self.chart.label_font_size * 4)
            .build_cartesian_2d(x_range, y_min..y_max)?;

        let weekday = |x: &f64| day_label(labels, *x).unwrap_or_default();
        let is_ratio = panel.metric.is_ratio();
        let value = |y: &f64| {
            if is_ratio {
                format!("{:.2}", y)
            } else {
                format!("{:.0}", y)
            }
        };

        chart
            .configure_mesh()
            .light_line_style(grid_color.stroke_width(1))
            .x_labels(ticks)
            .x_label_formatter(&weekday)
            .y_label_formatter(&value)
            .label_style(label_font)
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                panel
                    .current_points()
                    .into_iter()
                    .map(|(i, v)| (i as f64, v)),
                current_color.stroke_width(stroke),
            ))?
            .label(CURRENT_LABEL)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], current_color.stroke_width(stroke))
            });

        chart
            .draw_series(DashedLineSeries::new(
                panel
                    .prior_points()
                    .into_iter()
                    .map(|(i, v)| (i as f64, v)),
                10,
                6,
                comparison_color.stroke_width(stroke),
            ))?
            .label(COMPARISON_LABEL)
            .legend(move |(x, y)| {
                PathElement::new(
                    vec![(x, y), (x + 20, y)],
                    comparison_color.stroke_width(stroke),
                )
            });

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(label_font)
            .draw()?;

        Ok(())
    }
}

impl GraphRenderer for WeeklyTrendRenderer {
    #[instrument(skip_all, fields(graph = self.name()))]
    fn render(&self, metrics: &MetricSet) -> Result<TrendChart> {
        let trends = self.trends(metrics);
        let bytes = self.draw(&trends)?;
        let file_name = trends.file_name();

        info!(file_name = %file_name, bytes = bytes.len(), "Rendered trend chart");
        Ok(TrendChart::new(file_name, bytes))
    }

    fn name(&self) -> &'static str {
        "weekly_trends"
    }
}

/// Whether the chart font can be measured. Every label needs it.
pub fn fonts_available() -> bool {
    (FONT_FAMILY, 12).into_font().box_size("Thu").is_ok()
}

/// X extent for `days` slots, padded by half a slot on each side so the
/// outer weekday labels stay inside the plotting area.
fn day_axis(days: usize) -> Range<f64> {
    -0.5..(days.max(1) as f64 - 0.5)
}

/// Label for a tick placed on a whole slot index. Fractional ticks stay blank.
fn day_label(labels: &[String], x: f64) -> Option<String> {
    let slot = x.round();
    if (x - slot).abs() > 1e-6 || slot < 0.0 {
        return None;
    }
    labels.get(slot as usize).cloned()
}

/// Encodes a raw RGB buffer as PNG.
pub fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ReportError::render("bitmap buffer does not match chart dimensions"))?;

    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ReportError::render_with_source("PNG encoding failed", e))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedpulse_common::test_utils::metric_fixtures::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn small_chart() -> ChartConfig {
        ChartConfig {
            width: 400,
            height: 200,
            ..ChartConfig::default()
        }
    }

    #[test]
    fn test_encode_png() {
        let bytes = encode_png(vec![255u8; 4 * 2 * 3], 4, 2).unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_encode_png_size_mismatch() {
        let err = encode_png(vec![0u8; 5], 4, 2).unwrap_err();
        assert!(matches!(err, ReportError::Render { .. }));
    }

    #[test]
    fn test_day_axis_pads_both_ends() {
        let axis = day_axis(7);
        assert_eq!(axis, -0.5..6.5);
        assert!(axis.contains(&0.0) && axis.contains(&6.0));
        assert_eq!(day_axis(0), -0.5..0.5);
    }

    #[test]
    fn test_day_label_only_on_whole_slots() {
        let labels: Vec<String> = ["Fri", "Sat", "Sun"].iter().map(|s| s.to_string()).collect();
        assert_eq!(day_label(&labels, 0.0).as_deref(), Some("Fri"));
        assert_eq!(day_label(&labels, 2.0).as_deref(), Some("Sun"));
        assert_eq!(day_label(&labels, 1.5), None);
        assert_eq!(day_label(&labels, -0.5), None);
        assert_eq!(day_label(&labels, 3.0), None);
    }

    #[test]
    fn test_metric_colors() {
        let renderer = WeeklyTrendRenderer::new(ChartConfig::default(), 7);
        assert_eq!(renderer.metric_color(MetricKind::ActiveUsers), RGBColor(255, 0, 0));
        assert_eq!(renderer.metric_color(MetricKind::Views), RGBColor(0, 128, 0));
        assert_eq!(renderer.metric_color(MetricKind::Likes), RGBColor(0, 0, 255));
        assert_eq!(
            renderer.metric_color(MetricKind::ClickThroughRate),
            RGBColor(165, 42, 42)
        );
    }

    #[test]
    fn test_trends_use_comparison_days() {
        let renderer = WeeklyTrendRenderer::new(ChartConfig::default(), 7);
        let trends = renderer.trends(&two_week_set());
        assert_eq!(trends.dates.len(), 7);
    }

    #[test]
    fn test_render_two_weeks() {
        if !fonts_available() {
            eprintln!("skipping: no sans-serif font installed");
            return;
        }
        let renderer = WeeklyTrendRenderer::new(small_chart(), 7);
        let chart = renderer.render(&two_week_set()).unwrap();

        assert_eq!(chart.file_name, "product_metrics_2025_02_27.png");
        assert_eq!(chart.image.position(), 0);
        assert_eq!(&chart.bytes()[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_render_short_series() {
        if !fonts_available() {
            eprintln!("skipping: no sans-serif font installed");
            return;
        }
        let renderer = WeeklyTrendRenderer::new(small_chart(), 7);
        let chart = renderer.render(&set_with_days(3)).unwrap();
        assert!(!chart.is_empty());
    }
}
