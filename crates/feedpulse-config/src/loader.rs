//! Configuration loading from YAML files and environment overrides.

use crate::schema::Config;
use feedpulse_common::{ChatId, ReportError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "FEEDPULSE_CONFIG_PATH";

/// File names tried in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["config.yaml", "config.yml"];

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for the schema
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment override holds a value of the wrong type
    #[error("Invalid value for {var}: '{value}'")]
    EnvParse { var: String, value: String },

    /// An explicitly requested file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),
}

impl From<ConfigError> for ReportError {
    fn from(err: ConfigError) -> Self {
        ReportError::config_with_source("failed to load configuration", err)
    }
}

/// Loads configuration for a run.
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Creates a loader for an explicit path, or for the default lookup when `None`.
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Loads, overrides from the process environment and validates.
    pub fn load(&self) -> Result<Config, ReportError> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Same as [`ConfigLoader::load`] with an injectable environment lookup.
    pub fn load_with_env<F>(&self, env: F) -> Result<Config, ReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.resolve_path(&env)? {
            Some(path) => load_file(&path)?,
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };
        apply_env_overrides_from(&mut config, &env)?;
        config.validate_all()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    fn resolve_path<F>(&self, env: &F) -> Result<Option<PathBuf>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = self.path.clone().or_else(|| env(CONFIG_PATH_ENV).map(PathBuf::from)) {
            if !path.exists() {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Some(path));
        }

        Ok(DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists()))
    }
}

/// Parses a configuration file without applying overrides or validation.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Loading configuration");
    parse_yaml(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses configuration from a YAML string.
pub fn parse_yaml(contents: &str) -> Result<Config, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

/// Applies environment overrides on top of file values.
pub fn apply_env_overrides_from<F>(config: &mut Config, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let string_overrides: [(&str, &mut String); 9] = [
        ("CLICKHOUSE_URL", &mut config.clickhouse.url),
        ("CLICKHOUSE_USER", &mut config.clickhouse.user),
        ("CLICKHOUSE_PASSWORD", &mut config.clickhouse.password),
        ("CLICKHOUSE_DATABASE", &mut config.clickhouse.database),
        ("CLICKHOUSE_TABLE", &mut config.clickhouse.table),
        ("TELEGRAM_BOT_TOKEN", &mut config.telegram.token),
        ("TELEGRAM_API_URL", &mut config.telegram.api_url),
        ("FEEDPULSE_CRON", &mut config.schedule.cron),
        ("FEEDPULSE_LOG_LEVEL", &mut config.logging.level),
    ];
    for (var, field) in string_overrides {
        if let Some(value) = env(var) {
            debug!(var, "Applying environment override");
            *field = value;
        }
    }

    if let Some(value) = env("TELEGRAM_CHAT_ID") {
        let id = value
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::EnvParse {
                var: "TELEGRAM_CHAT_ID".to_string(),
                value: value.clone(),
            })?;
        config.telegram.chat_id = ChatId(id);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = parse_yaml("telegram:\n  chat_id: 42\n").unwrap();
        assert_eq!(config.telegram.chat_id, ChatId(42));
        assert_eq!(config.schedule.window_days, 14);
        assert_eq!(config.clickhouse.table, "feed_actions");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let env = env_from(&[
            ("CLICKHOUSE_PASSWORD", "pw"),
            ("TELEGRAM_BOT_TOKEN", "1:abc"),
            ("TELEGRAM_CHAT_ID", " -1001 "),
            ("FEEDPULSE_CRON", "0 30 9 * * *"),
        ]);
        apply_env_overrides_from(&mut config, env).unwrap();

        assert_eq!(config.clickhouse.password, "pw");
        assert_eq!(config.telegram.token, "1:abc");
        assert_eq!(config.telegram.chat_id, ChatId(-1001));
        assert_eq!(config.schedule.cron, "0 30 9 * * *");
        assert_eq!(config.clickhouse.user, "default");
    }

    #[test]
    fn test_bad_chat_id_override() {
        let mut config = Config::default();
        let err = apply_env_overrides_from(&mut config, env_from(&[("TELEGRAM_CHAT_ID", "abc")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { ref var, .. } if var == "TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn test_missing_explicit_path() {
        let loader = ConfigLoader::new(Some(PathBuf::from("/nonexistent/feedpulse.yaml")));
        let err = loader.load_with_env(|_| None).unwrap_err();
        assert!(matches!(err, ReportError::Config { .. }));
        assert!(!err.is_retryable());
    }
}
