//! Graph utility functions and helpers.

use plotters::style::RGBColor;

/// Parses a `#rrggbb` string, falling back to black.
pub fn parse_color(color_str: &str) -> RGBColor {
    if let Some(hex) = color_str.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return RGBColor(r, g, b);
            }
        }
    }
    RGBColor(0, 0, 0)
}

/// Y-axis range around the plotted values with 10% padding.
///
/// Flat or missing data still yields a non-empty range.
pub fn padded_range(bounds: Option<(f64, f64)>) -> (f64, f64) {
    let Some((lo, hi)) = bounds else {
        return (0.0, 1.0);
    };
    let span = hi - lo;
    let padding = if span > f64::EPSILON {
        span * 0.1
    } else {
        (hi.abs() * 0.1).max(1.0)
    };
    let floor = if lo >= 0.0 { (lo - padding).max(0.0) } else { lo - padding };
    (floor, hi + padding)
}
