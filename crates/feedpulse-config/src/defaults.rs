//! Default values for every configuration section.

use crate::schema::*;
use feedpulse_common::{ChatId, LoggingConfig};

/// Default trigger: 11:00 UTC every day.
pub const DEFAULT_CRON: &str = "0 0 11 * * *";

/// Default Bot API endpoint.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

impl Default for Config {
    fn default() -> Self {
        Self {
            clickhouse: ClickHouseConfig::default(),
            telegram: TelegramConfig::default(),
            schedule: ScheduleConfig::default(),
            chart: ChartConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            user: "default".to_string(),
            password: String::new(),
            database: "default".to_string(),
            table: "feed_actions".to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_id: ChatId(0),
            api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            request_timeout_seconds: 60,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: DEFAULT_CRON.to_string(),
            retries: 3,
            retry_delay_seconds: 600,
            window_days: 14,
            comparison_days: 7,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 1000,
            title_font_size: 28,
            label_font_size: 20,
            line_width: 2,
            colors: ChartColors::default(),
        }
    }
}

impl Default for ChartColors {
    fn default() -> Self {
        Self {
            background: "#ffffff".to_string(),
            grid: "#e0e0e0".to_string(),
            comparison: "#808080".to_string(),
            active_users: "#ff0000".to_string(),
            views: "#008000".to_string(),
            likes: "#0000ff".to_string(),
            ctr: "#a52a2a".to_string(),
        }
    }
}
