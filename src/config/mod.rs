//! Configuration module for the sensor agent.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Engine location (address, port)
//! - Poll interval and request timeout
//! - Per-sensor-class constructor arguments

mod app;
mod validation;

pub use app::{AgentConfig, EngineConfig, SensorClassArgs};
pub use validation::{ConfigError, SensorClassArg, parse_duration, parse_interval_secs};

// Re-export constants
pub use app::{DEFAULT_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
