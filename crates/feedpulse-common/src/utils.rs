//! Shared formatting and arithmetic helpers.

use chrono::NaiveDate;

/// Formats a date in long form, e.g. "February 27, 2025".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Formats a date for file names, e.g. "2025_02_27".
pub fn format_compact_date(date: NaiveDate) -> String {
    date.format("%Y_%m_%d").to_string()
}

/// Abbreviated weekday name, e.g. "Thu".
pub fn weekday_abbrev(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Rounds half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Likes per view.
///
/// A day without views has a ratio of zero.
pub fn click_through_ratio(likes: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    likes as f64 / views as f64
}

/// A ratio as a percentage rounded to two decimals.
pub fn ratio_to_percent(ratio: f64) -> f64 {
    if !ratio.is_finite() {
        return 0.0;
    }
    round_to(ratio * 100.0, 2)
}

/// Formats a count without a fractional part.
pub fn format_count(value: f64) -> String {
    format!("{:.0}", value)
}
