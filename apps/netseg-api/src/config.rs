//! Service configuration read from the environment

use std::str::FromStr;

use thiserror::Error;

/// Configuration errors, reported at startup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// HTTP service configuration
///
/// | Variable | Default |
/// |---|---|
/// | `NETSEG_HOST` | `0.0.0.0` |
/// | `NETSEG_PORT` | `9696` |
/// | `NETSEG_ALLOW_SORTING` | `true` |
/// | `NETSEG_ALLOW_PAGINATION` | `true` |
/// | `NETSEG_PAGINATION_MAX_LIMIT` | unlimited (`-1` also means unlimited) |
/// | `NETSEG_LOG_FORMAT` | `text` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub allow_sorting: bool,
    pub allow_pagination: bool,
    pub pagination_max_limit: Option<usize>,
    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9696,
            allow_sorting: true,
            allow_pagination: true,
            pagination_max_limit: None,
            log_format: LogFormat::Text,
        }
    }
}

impl ApiConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            host: lookup("NETSEG_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "NETSEG_PORT")?.unwrap_or(defaults.port),
            allow_sorting: parse_bool(&lookup, "NETSEG_ALLOW_SORTING")?
                .unwrap_or(defaults.allow_sorting),
            allow_pagination: parse_bool(&lookup, "NETSEG_ALLOW_PAGINATION")?
                .unwrap_or(defaults.allow_pagination),
            pagination_max_limit: parse_max_limit(&lookup)?,
            log_format: parse_var(&lookup, "NETSEG_LOG_FORMAT")?.unwrap_or(defaults.log_format),
        })
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clamp a requested page size to the configured maximum
    pub fn clamp_limit(&self, limit: usize) -> usize {
        match self.pagination_max_limit {
            Some(max) if limit == 0 || limit > max => max,
            _ => limit,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: ToString,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|err: T::Err| ConfigError::InvalidValue {
                key,
                value: value.clone(),
                reason: err.to_string(),
            })
        })
        .transpose()
}

fn parse_bool<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key,
                value,
                reason: "expected a boolean".to_string(),
            }),
        })
        .transpose()
}

fn parse_max_limit<F>(lookup: &F) -> Result<Option<usize>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const KEY: &str = "NETSEG_PAGINATION_MAX_LIMIT";

    match parse_var::<F, i64>(lookup, KEY)? {
        None | Some(-1) => Ok(None),
        Some(max) if max > 0 => Ok(Some(max as usize)),
        Some(max) => Err(ConfigError::InvalidValue {
            key: KEY,
            value: max.to_string(),
            reason: "expected a positive integer or -1".to_string(),
        }),
    }
}
