//! Agent configuration structures.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::{DEFAULT_ENGINE_PORT, EngineEndpoint};
use crate::sensor::SensorArgs;

use super::validation::{ConfigError, SensorClassArg};

// =============================================================================
// Constants
// =============================================================================

/// Default poll interval (60 seconds).
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default timeout for the POST to the Engine (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-class constructor arguments, keyed by sensor class name.
pub type SensorClassArgs = BTreeMap<String, SensorArgs>;

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Engine API location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine address; discovered at startup when unset.
    pub address: Option<String>,

    /// Engine port (default: 8088).
    pub port: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: DEFAULT_ENGINE_PORT,
        }
    }
}

impl EngineConfig {
    /// Configured endpoint, if an address was given.
    pub fn endpoint(&self) -> Option<EngineEndpoint> {
        self.address
            .as_ref()
            .map(|address| EngineEndpoint::new(address, self.port))
    }
}

// =============================================================================
// Agent Configuration
// =============================================================================

/// Top-level agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Engine API location.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Time to sleep between poll cycles (default: 60s).
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Log what would be sent instead of POSTing it.
    #[serde(default)]
    pub dry_run: bool,

    /// Skip sensor discovery and send dummy data.
    #[serde(default)]
    pub dummy: bool,

    /// Host ID override; read from the system when unset.
    #[serde(default)]
    pub host_id: Option<String>,

    /// Timeout for each POST to the Engine (default: 30s).
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Constructor arguments per sensor class.
    #[serde(default)]
    pub sensor_args: SensorClassArgs,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            interval: DEFAULT_INTERVAL,
            dry_run: false,
            dummy: false,
            host_id: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            sensor_args: SensorClassArgs::new(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "interval must be positive".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request_timeout must be positive".to_string(),
            ));
        }

        if self.engine.port == 0 {
            return Err(ConfigError::ValidationError(
                "engine port must be non-zero".to_string(),
            ));
        }

        if let Some(endpoint) = self.engine.endpoint() {
            endpoint.update_url().map_err(|e| {
                ConfigError::ValidationError(format!(
                    "invalid engine address '{}': {}",
                    endpoint.address, e
                ))
            })?;
        }

        if matches!(self.host_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "host_id cannot be empty".to_string(),
            ));
        }

        for (class, args) in &self.sensor_args {
            if class.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "sensor_args class name cannot be empty".to_string(),
                ));
            }
            if args.iter().any(|(name, _)| name.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "sensor_args for '{}' contain an empty argument name",
                    class
                )));
            }
        }

        Ok(())
    }

    /// Merge `CLASS=ARG=VALUE` entries over the configured sensor arguments.
    ///
    /// Entries for the same class accumulate; a later value for the same
    /// argument replaces an earlier one.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` for a malformed entry.
    pub fn merge_sensor_class_args<S: AsRef<str>>(
        &mut self,
        entries: &[S],
    ) -> Result<(), ConfigError> {
        for entry in entries {
            let SensorClassArg { class, arg, value } = entry.as_ref().parse()?;
            self.sensor_args.entry(class).or_default().insert(arg, value);
        }
        Ok(())
    }

    /// Arguments configured for a sensor class (empty when none).
    pub fn args_for(&self, class: &str) -> SensorArgs {
        self.sensor_args.get(class).cloned().unwrap_or_default()
    }
}
