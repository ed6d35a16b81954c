//! Daemon Layer
//!
//! Startup and the poll loop. The daemon is the fault-isolation boundary:
//! backend errors and Engine failures are logged and never escape a cycle.
//! Only startup failures (Engine discovery, zero sensors) are fatal.
//!
//! # Architecture
//!
//! - [`SensorDaemon`]: owns the active sensors and runs the loop
//! - [`EngineClient`]: POSTs each [`SensorReport`] to the Engine
//! - [`CycleOutcome`]: result of one read-and-send cycle
//!
//! # Example
//!
//! ```rust,no_run
//! use thermo_agent::config::AgentConfig;
//! use thermo_agent::daemon::SensorDaemon;
//! use thermo_agent::discovery::{SystemHostId, UnavailableDiscovery};
//! use thermo_agent::sensor::SensorRegistry;
//!
//! # async fn example() -> Result<(), thermo_agent::daemon::DaemonError> {
//! let mut config = AgentConfig::default();
//! config.engine.address = Some("10.0.0.5".to_string());
//! let registry = SensorRegistry::builtin();
//! let mut daemon =
//!     SensorDaemon::new(config, &registry, &UnavailableDiscovery, &SystemHostId::new()).await?;
//! daemon.run().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod report;
mod runner;

pub use client::{ACCEPTED_STATUSES, EngineClient};
pub use report::{CycleOutcome, SensorReport};
pub use runner::{DaemonError, SensorDaemon};
