//! Sensor class registry.
//!
//! Sensor backends become discoverable by registering an [`EntryPoint`] under
//! the [`EXTENSION_POINT`] name. Loading an entry point yields a
//! [`SensorClass`]: a factory plus the metadata needed to list it. The
//! registry never instantiates sensors; the daemon does, because building a
//! sensor may need per-class arguments.

use std::collections::HashSet;
use std::sync::Arc;

use crate::sensor::owfs::OwfsClass;
use crate::sensor::schema::{ParamSpec, SensorArgs};
use crate::sensor::traits::{Sensor, SensorContext, SensorError};

/// Extension point that sensor classes register under.
pub const EXTENSION_POINT: &str = "thermo.sensors";

/// Description used when a class does not provide one.
pub const DEFAULT_DESCRIPTION: &str = "Unknown";

/// A sensor backend class: metadata plus an async factory.
#[async_trait::async_trait]
pub trait SensorClass: Send + Sync {
    /// Class name; the key for per-class arguments.
    fn name(&self) -> &str;

    /// One-line description of the supported hardware.
    fn description(&self) -> &str {
        DEFAULT_DESCRIPTION
    }

    /// Constructor parameters accepted by [`SensorClass::build`].
    fn params(&self) -> &[ParamSpec] {
        &[]
    }

    /// Build a sensor instance.
    ///
    /// # Errors
    /// Returns `SensorError` if the arguments are invalid or the backend
    /// cannot initialize.
    async fn build(
        &self,
        ctx: &SensorContext,
        args: &SensorArgs,
    ) -> Result<Box<dyn Sensor>, SensorError>;
}

/// Loader signature for an entry point.
pub type LoadFn = fn() -> Result<Arc<dyn SensorClass>, SensorError>;

/// Statically registered sensor class.
#[derive(Clone, Copy)]
pub struct EntryPoint {
    /// Entry point name.
    pub name: &'static str,
    /// Loader producing the class.
    pub load: LoadFn,
}

impl EntryPoint {
    /// Create an entry point.
    pub const fn new(name: &'static str, load: LoadFn) -> Self {
        Self { name, load }
    }
}

impl std::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Entry points shipped with this crate.
///
/// The dummy sensor is not registered; it is only used in dummy mode.
pub fn builtin_entry_points() -> Vec<EntryPoint> {
    vec![EntryPoint::new("owfs", || Ok(Arc::new(OwfsClass)))]
}

/// Loaded sensor classes for one extension point.
pub struct SensorRegistry {
    extension_point: String,
    classes: Vec<Arc<dyn SensorClass>>,
}

impl SensorRegistry {
    /// Load every entry point, skipping (and logging) the ones that fail.
    pub fn load(
        extension_point: impl Into<String>,
        entries: impl IntoIterator<Item = EntryPoint>,
    ) -> Self {
        let extension_point = extension_point.into();
        let mut classes: Vec<Arc<dyn SensorClass>> = Vec::new();
        let mut seen = HashSet::new();

        tracing::debug!(extension_point = %extension_point, "Loading sensor classes");
        for entry in entries {
            tracing::debug!(entry = entry.name, "Loading sensor class from entry point");
            let loaded = (entry.load)().and_then(|class| {
                validate_class(class.as_ref())?;
                Ok(class)
            });
            let class = match loaded {
                Ok(class) => class,
                Err(e) => {
                    tracing::warn!(entry = entry.name, error = %e, "Failed to load entry point");
                    continue;
                }
            };

            if !seen.insert(class.name().to_string()) {
                tracing::warn!(
                    entry = entry.name,
                    class = class.name(),
                    "Sensor class already loaded; skipping duplicate"
                );
                continue;
            }
            classes.push(class);
        }

        tracing::debug!(count = classes.len(), "Sensor classes loaded");
        Self {
            extension_point,
            classes,
        }
    }

    /// Registry of the built-in classes.
    pub fn builtin() -> Self {
        Self::load(EXTENSION_POINT, builtin_entry_points())
    }

    /// Extension point these classes were loaded from.
    pub fn extension_point(&self) -> &str {
        &self.extension_point
    }

    /// Loaded classes, in registration order.
    pub fn classes(&self) -> &[Arc<dyn SensorClass>] {
        &self.classes
    }

    /// Look up a class by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn SensorClass>> {
        self.classes.iter().find(|c| c.name() == name)
    }

    /// Number of loaded classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when nothing was loaded.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl std::fmt::Debug for SensorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.classes.iter().map(|c| c.name()).collect();
        f.debug_struct("SensorRegistry")
            .field("extension_point", &self.extension_point)
            .field("classes", &names)
            .finish()
    }
}

/// Reject classes whose metadata cannot be used.
fn validate_class(class: &dyn SensorClass) -> Result<(), SensorError> {
    let invalid = |reason: String| SensorError::Load {
        entry: class.name().to_string(),
        reason,
    };

    if class.name().trim().is_empty() {
        return Err(invalid("class name is empty".to_string()));
    }

    let mut names = HashSet::new();
    for param in class.params() {
        if param.name.is_empty() {
            return Err(invalid("parameter with empty name".to_string()));
        }
        if !names.insert(param.name) {
            return Err(invalid(format!("duplicate parameter '{}'", param.name)));
        }
    }
    Ok(())
}
