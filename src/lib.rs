//! Thermo Agent - Temperature Sensor Agent
//!
//! This crate provides the on-device agent of the thermostat system. It
//! discovers the temperature sensors attached to this host, polls them on a
//! fixed interval and reports the readings to the Engine over HTTP. It can be
//! used as a library, or run with the `thermo-agent` executable.
//!
//! # Architecture
//!
//! - **Sensors**: pluggable backends (OWFS 1-Wire, dummy) behind one trait
//! - **Registry**: sensor classes discovered through a named extension point
//! - **Daemon**: instantiates backends, runs the poll loop, isolates failures
//! - **Introspection**: lists sensor classes and their arguments
//!
//! # Example
//!
//! ```rust,ignore
//! use thermo_agent::{AgentConfig, SensorDaemon, SensorRegistry, SystemHostId, UnavailableDiscovery};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AgentConfig::load("agent.yaml")?;
//!     let registry = SensorRegistry::builtin();
//!     let mut daemon =
//!         SensorDaemon::new(config, &registry, &UnavailableDiscovery, &SystemHostId::new()).await?;
//!     daemon.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod daemon;
pub mod discovery;
pub mod introspect;
pub mod sensor;

// Re-export commonly used types
pub use config::{AgentConfig, ConfigError};
pub use daemon::{CycleOutcome, DaemonError, SensorDaemon, SensorReport};
pub use discovery::{
    EngineDiscovery, EngineEndpoint, HostIdentity, StaticHostId, SystemHostId, UnavailableDiscovery,
};
pub use sensor::{Sensor, SensorClass, SensorError, SensorReading, SensorRegistry};
