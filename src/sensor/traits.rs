//! Core sensor traits and types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Globally unique sensor identifier (e.g. a 1-Wire device address).
pub type SensorId = String;

/// Readings from one poll, keyed by sensor ID.
pub type Readings = BTreeMap<SensorId, SensorReading>;

/// Errors that can occur while building, probing or reading a sensor backend.
#[derive(Debug, Error)]
pub enum SensorError {
    /// Filesystem access failed.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Backend cannot be configured (e.g. no mountpoint found).
    #[error("config error: {0}")]
    Config(String),

    /// Argument not declared in the class parameter table.
    #[error("sensor class '{class}' does not accept argument '{arg}'")]
    InvalidArgument {
        /// Sensor class name.
        class: String,
        /// Offending argument name.
        arg: String,
    },

    /// Required argument was not supplied.
    #[error("sensor class '{class}' requires argument '{arg}'")]
    MissingArgument {
        /// Sensor class name.
        class: String,
        /// Missing argument name.
        arg: String,
    },

    /// A registered entry point could not be loaded.
    #[error("failed to load entry point '{entry}': {reason}")]
    Load {
        /// Entry point name.
        entry: String,
        /// Why loading failed.
        reason: String,
    },

    /// Whole-backend read failure.
    #[error("read error: {0}")]
    Read(String),
}

impl SensorError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// One sensor's state for a single poll cycle.
///
/// `value` is degrees Celsius, or `None` if the sensor could not be read.
/// `type` and `value` are always serialized (as `null` when absent), while
/// `alias` and `extra` are omitted when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Sensor kind tag (e.g. "DS18S20", "dummy").
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Temperature in degrees Celsius; `None` on read failure.
    pub value: Option<f64>,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Free-form extra information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

impl SensorReading {
    /// Create a reading with the given value and no metadata.
    pub fn new(value: Option<f64>) -> Self {
        Self {
            kind: None,
            value,
            alias: None,
            extra: None,
        }
    }

    /// Set the sensor kind tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set the extra information.
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }
}

/// Daemon-owned context handed to sensor classes when they are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorContext {
    /// Identifier of this host, used to namespace synthetic sensor IDs.
    pub host_id: String,
}

impl SensorContext {
    /// Create a context for the given host.
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
        }
    }
}

/// Capability contract every sensor backend implements.
///
/// # Error Handling
///
/// - `sensors_present()` returns `Ok(false)` when hardware is simply absent;
///   `Err` is reserved for unexpected failures, which the daemon logs before
///   dropping the backend.
/// - `read()` reports per-sensor failures as entries with `value: None`.
///   `Err` means the whole backend failed this cycle; the daemon logs it and
///   keeps going with the other backends.
///
/// Callers must not assume `sensors_present()` runs before every `read()`.
#[async_trait::async_trait]
pub trait Sensor: Send + Sync {
    /// Name of the class this instance was built from.
    fn class_name(&self) -> &str;

    /// Discover hardware and report whether at least one sensor exists.
    async fn sensors_present(&mut self) -> Result<bool, SensorError>;

    /// Read every currently known sensor.
    async fn read(&mut self) -> Result<Readings, SensorError>;
}
