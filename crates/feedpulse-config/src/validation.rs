//! Validation utilities and regex patterns

use crate::schema::{Config, ScheduleConfig};
use feedpulse_common::{ChatId, ReportError, Result};
use regex::Regex;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::LazyLock;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Regex pattern for `#rrggbb` colors
pub static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid hex color regex pattern")
});

/// Regex pattern for a plain or database-qualified SQL identifier. The table
/// name is spliced into the query text, so nothing else may pass.
pub static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+)?$").expect("Invalid identifier regex pattern")
});

/// Validate a cron expression with a leading seconds field
pub fn validate_cron_expression(cron_expr: &str) -> std::result::Result<(), ValidationError> {
    if cron_expr.is_empty() {
        return Err(ValidationError::new("empty_cron_expression"));
    }

    match cron::Schedule::from_str(cron_expr) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("invalid_cron_expression")),
    }
}

/// Only http and https endpoints are reachable by the clients.
pub fn validate_http_scheme(value: &str) -> std::result::Result<(), ValidationError> {
    match url::Url::parse(value).map(|u| u.scheme().to_string()) {
        Ok(scheme) if scheme == "http" || scheme == "https" => Ok(()),
        _ => Err(ValidationError::new("unsupported_url_scheme")),
    }
}

/// Chat id 0 is the unset default.
pub fn validate_chat_id(chat_id: &ChatId) -> std::result::Result<(), ValidationError> {
    if chat_id.0 == 0 {
        Err(ValidationError::new("missing_chat_id"))
    } else {
        Ok(())
    }
}

/// The queried window must reach back past the comparison offset.
pub fn validate_window(schedule: &ScheduleConfig) -> std::result::Result<(), ValidationError> {
    if schedule.window_days > schedule.comparison_days {
        return Ok(());
    }

    let mut err = ValidationError::new("window_too_short");
    err.message = Some(Cow::Owned(format!(
        "window_days ({}) must exceed comparison_days ({})",
        schedule.window_days, schedule.comparison_days
    )));
    Err(err)
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates every section and reports all problems found, one
    /// `section.field: message` entry each.
    pub fn validate(config: &Config) -> Result<()> {
        Validate::validate(config).map_err(|errors| {
            let mut problems = Vec::new();
            collect_problems("", &errors, &mut problems);
            problems.sort();
            ReportError::config(format!("invalid configuration: {}", problems.join("; ")))
        })
    }
}

fn collect_problems(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = match (*field, prefix.is_empty()) {
            ("__all__", _) => prefix.to_string(),
            (field, true) => field.to_string(),
            (field, false) => format!("{prefix}.{field}"),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let detail = err.message.as_ref().unwrap_or(&err.code);
                    out.push(format!("{path}: {detail}"));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_problems(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_problems(&format!("{path}[{index}]"), nested, out);
                }
            }
        }
    }
}
