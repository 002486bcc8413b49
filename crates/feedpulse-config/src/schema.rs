//! Configuration schema definitions.

use feedpulse_common::{ChatId, LoggingConfig, ReportError, WarehouseConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Main configuration structure for FeedPulse.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Analytical data store connection.
    #[validate]
    pub clickhouse: ClickHouseConfig,
    /// Telegram delivery settings.
    #[validate]
    pub telegram: TelegramConfig,
    /// Trigger and retry policy.
    #[validate]
    pub schedule: ScheduleConfig,
    /// Chart styling.
    #[validate]
    pub chart: ChartConfig,
    /// Logging output.
    pub logging: LoggingConfig,
}

/// ClickHouse connection descriptor.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ClickHouseConfig {
    /// HTTP endpoint.
    #[validate(url(message = "ClickHouse URL must be a valid URL"))]
    #[validate(custom(function = "crate::validation::validate_http_scheme", message = "ClickHouse URL must use http or https"))]
    pub url: String,
    /// User name.
    #[validate(length(min = 1, message = "ClickHouse user cannot be empty"))]
    pub user: String,
    /// Password.
    #[validate(length(min = 1, message = "ClickHouse password cannot be empty"))]
    pub password: String,
    /// Database holding the events table.
    #[validate(regex(path = "crate::validation::IDENTIFIER_REGEX", message = "Database must be a plain SQL identifier"))]
    pub database: String,
    /// Events table, optionally qualified with the database.
    #[validate(regex(path = "crate::validation::IDENTIFIER_REGEX", message = "Table must be a plain or database-qualified SQL identifier"))]
    pub table: String,
}

/// Telegram bot configuration.
#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    #[validate(length(min = 1, message = "Telegram token cannot be empty"))]
    pub token: String,
    /// Destination chat for the daily report.
    #[validate(custom(function = "crate::validation::validate_chat_id", message = "Telegram chat id must be set"))]
    pub chat_id: ChatId,
    /// Bot API base URL.
    #[validate(url(message = "Telegram API URL must be a valid URL"))]
    #[validate(custom(function = "crate::validation::validate_http_scheme", message = "Telegram API URL must use http or https"))]
    pub api_url: String,
    /// Timeout for the upload request in seconds.
    #[validate(range(min = 1, max = 600, message = "Request timeout must be between 1 and 600 seconds"))]
    pub request_timeout_seconds: u64,
}

/// Scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "crate::validation::validate_window", skip_on_field_errors = false))]
pub struct ScheduleConfig {
    /// Cron expression with a leading seconds field.
    #[validate(custom(function = "crate::validation::validate_cron_expression", message = "Cron expression is invalid"))]
    pub cron: String,
    /// Additional attempts per stage after the first failure.
    pub retries: u32,
    /// Fixed delay between attempts in seconds.
    pub retry_delay_seconds: u64,
    /// Days of history extracted per run.
    pub window_days: u32,
    /// Offset in days of the comparison line.
    #[validate(range(min = 1, message = "Comparison offset must be at least one day"))]
    pub comparison_days: u32,
}

/// Chart configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChartConfig {
    /// Image width in pixels.
    #[validate(range(min = 100, max = 8000, message = "Width must be between 100 and 8000 pixels"))]
    pub width: u32,
    /// Image height in pixels.
    #[validate(range(min = 100, max = 8000, message = "Height must be between 100 and 8000 pixels"))]
    pub height: u32,
    /// Subplot title font size.
    pub title_font_size: u32,
    /// Axis label font size.
    pub label_font_size: u32,
    /// Line width of both traces.
    pub line_width: u32,
    /// Colors.
    #[validate]
    pub colors: ChartColors,
}

/// Chart colors as `#rrggbb` strings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChartColors {
    /// Background color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Background color must be a #rrggbb hex color"))]
    pub background: String,
    /// Grid line color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Grid color must be a #rrggbb hex color"))]
    pub grid: String,
    /// Dashed comparison line color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Comparison color must be a #rrggbb hex color"))]
    pub comparison: String,
    /// Active users line color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Active users color must be a #rrggbb hex color"))]
    pub active_users: String,
    /// Views line color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Views color must be a #rrggbb hex color"))]
    pub views: String,
    /// Likes line color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Likes color must be a #rrggbb hex color"))]
    pub likes: String,
    /// CTR line color.
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "CTR color must be a #rrggbb hex color"))]
    pub ctr: String,
}

impl Config {
    /// Validates every section, reporting all problems found.
    pub fn validate_all(&self) -> Result<(), ReportError> {
        crate::validation::ConfigValidator::validate(self)
    }
}

impl ClickHouseConfig {
    /// Connection descriptor for the extractor.
    pub fn to_warehouse(&self) -> WarehouseConfig {
        WarehouseConfig::new(&self.url, &self.user, &self.password, &self.database)
            .with_table(&self.table)
    }
}

impl TelegramConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl ScheduleConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for ClickHouseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHouseConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("database", &self.database)
            .field("table", &self.table)
            .finish()
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &redact(&self.token))
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}
