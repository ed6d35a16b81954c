//! Sensor Layer
//!
//! Pluggable sensor backends polled by the daemon.
//!
//! # Architecture
//!
//! - [`Sensor`]: capability contract (`sensors_present()` / `read()`)
//! - [`SensorClass`]: metadata and factory for a backend
//! - [`SensorRegistry`]: classes loaded from the [`EXTENSION_POINT`]
//! - [`OwfsSensor`]: 1-Wire sensors exposed through an OWFS mount
//! - [`DummySensor`]: random readings for testing without hardware
//!
//! # Example
//!
//! ```rust,no_run
//! use thermo_agent::sensor::{SensorArgs, SensorContext, SensorRegistry};
//!
//! # async fn example() -> Result<(), thermo_agent::sensor::SensorError> {
//! let registry = SensorRegistry::builtin();
//! let ctx = SensorContext::new("myhost");
//! for class in registry.classes() {
//!     let mut sensor = class.build(&ctx, &SensorArgs::new()).await?;
//!     if sensor.sensors_present().await? {
//!         println!("{:?}", sensor.read().await?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod dummy;
pub mod owfs;
mod registry;
mod schema;
mod traits;

pub use dummy::{DUMMY_CLASS, DummyClass, DummySensor};
pub use owfs::{DeviceDescriptor, OWFS_CLASS, OwfsClass, OwfsSensor, TemperatureScale};
pub use registry::{
    DEFAULT_DESCRIPTION, EXTENSION_POINT, EntryPoint, LoadFn, SensorClass, SensorRegistry,
    builtin_entry_points,
};
pub use schema::{ParamSpec, SensorArgs};
pub use traits::{Readings, Sensor, SensorContext, SensorError, SensorId, SensorReading};
