//! Configuration validation utilities.

use std::time::Duration;

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Parse duration string using humantime.
///
/// Supports various formats: `30s`, `1m`, `5m30s`, `1h`, `100ms`, etc.
///
/// # Examples
///
/// ```
/// use thermo_agent::config::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap().as_secs(), 30);
/// assert_eq!(parse_duration("1m").unwrap().as_secs(), 60);
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("duration string is empty".to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Parse a poll interval given as floating-point seconds (e.g. `60`, `12.34`).
///
/// # Examples
///
/// ```
/// use thermo_agent::config::parse_interval_secs;
///
/// assert_eq!(parse_interval_secs("12.5").unwrap().as_millis(), 12_500);
/// assert!(parse_interval_secs("0").is_err());
/// ```
pub fn parse_interval_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("invalid interval '{}': {}", s, e))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!(
            "interval must be a positive number of seconds, got '{}'",
            s
        ));
    }
    let interval = Duration::try_from_secs_f64(secs)
        .map_err(|e| format!("invalid interval '{}': {}", s, e))?;
    if interval.is_zero() {
        return Err(format!("interval '{}' rounds down to zero", s));
    }
    Ok(interval)
}

/// A single `CLASS=ARG=VALUE` sensor class argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorClassArg {
    /// Sensor class name.
    pub class: String,
    /// Argument name.
    pub arg: String,
    /// Argument value; may itself contain `=`.
    pub value: String,
}

impl std::str::FromStr for SensorClassArg {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '=');
        let (Some(class), Some(arg), Some(value)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ConfigError::ValidationError(format!(
                "sensor class argument '{}' must be of the form CLASS=ARG=VALUE",
                s
            )));
        };

        let (class, arg) = (class.trim(), arg.trim());
        if class.is_empty() || arg.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "sensor class argument '{}' has an empty class or argument name",
                s
            )));
        }

        Ok(Self {
            class: class.to_string(),
            arg: arg.to_string(),
            value: value.to_string(),
        })
    }
}
