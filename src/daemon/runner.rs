//! Sensor daemon: startup, discovery and the poll/report loop.

use thiserror::Error;

use crate::config::{AgentConfig, ConfigError};
use crate::discovery::{DiscoveryError, EngineDiscovery, EngineEndpoint, HostIdentity};
use crate::sensor::{DummySensor, Readings, Sensor, SensorContext, SensorRegistry};

use super::client::EngineClient;
use super::report::{CycleOutcome, SensorReport};

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The Engine could not be located.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// No backend reported any sensors.
    #[error("no sensors discovered")]
    NoSensors,

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client could not be set up.
    #[error("client error: {0}")]
    Client(String),
}

/// The sensor daemon.
///
/// Owns the active sensors for its whole lifetime. Everything runs
/// sequentially on one task: backends are read one after another, then the
/// report is sent, then the daemon sleeps.
pub struct SensorDaemon {
    host_id: String,
    config: AgentConfig,
    endpoint: Option<EngineEndpoint>,
    client: Option<EngineClient>,
    sensors: Vec<Box<dyn Sensor>>,
}

impl SensorDaemon {
    /// Resolve the host ID and Engine endpoint, then discover sensors.
    ///
    /// # Errors
    /// - `DaemonError::Discovery` if no Engine address is configured, dry-run
    ///   is off, and discovery fails.
    /// - `DaemonError::NoSensors` if no backend reports sensors present.
    /// - `DaemonError::Config` / `DaemonError::Client` for a bad endpoint.
    pub async fn new(
        config: AgentConfig,
        registry: &SensorRegistry,
        discovery: &dyn EngineDiscovery,
        identity: &dyn HostIdentity,
    ) -> Result<Self, DaemonError> {
        config.validate()?;

        let host_id = config
            .host_id
            .clone()
            .unwrap_or_else(|| identity.host_id());
        tracing::warn!(host_id = %host_id, "This machine running with host_id");
        if config.dry_run {
            tracing::warn!("DRY RUN MODE - will not POST data to Engine.");
        }

        let endpoint = match config.engine.endpoint() {
            Some(endpoint) => Some(endpoint),
            None if config.dry_run => None,
            None => {
                let endpoint = discovery.discover().await?;
                tracing::info!(engine = %endpoint, "Discovered Engine");
                Some(endpoint)
            }
        };

        let client = match (&endpoint, config.dry_run) {
            (Some(endpoint), false) => {
                let url = endpoint.update_url().map_err(|e| {
                    ConfigError::ValidationError(format!(
                        "invalid engine endpoint '{}': {}",
                        endpoint, e
                    ))
                })?;
                Some(EngineClient::new(url, config.request_timeout)?)
            }
            _ => None,
        };

        let ctx = SensorContext::new(host_id.clone());
        let sensors = discover_sensors(&config, registry, &ctx).await;
        if sensors.is_empty() {
            tracing::error!("ERROR - no sensors discovered.");
            return Err(DaemonError::NoSensors);
        }

        Ok(Self {
            host_id,
            config,
            endpoint,
            client,
            sensors,
        })
    }

    /// Host ID reported with every update.
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// Engine endpoint, if one was configured or discovered.
    pub fn endpoint(&self) -> Option<&EngineEndpoint> {
        self.endpoint.as_ref()
    }

    /// Whether reports are only logged.
    pub fn is_dry_run(&self) -> bool {
        self.config.dry_run
    }

    /// Class names of the active sensors, in polling order.
    pub fn sensor_classes(&self) -> Vec<&str> {
        self.sensors.iter().map(|s| s.class_name()).collect()
    }

    /// Run the poll loop forever.
    pub async fn run(&mut self) {
        tracing::info!(interval = ?self.config.interval, "Running sensor daemon loop...");
        loop {
            self.read_and_send().await;
            tracing::debug!(interval = ?self.config.interval, "Sleeping");
            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Read every sensor and send the aggregate to the Engine.
    pub async fn read_and_send(&mut self) -> CycleOutcome {
        let report = SensorReport::new(self.host_id.clone(), self.collect().await);

        let Some(client) = &self.client else {
            tracing::warn!(
                report = %serde_json::to_string(&report).unwrap_or_default(),
                "DRY RUN - would POST sensor data"
            );
            return CycleOutcome::DryRun;
        };

        tracing::debug!(
            url = %client.url(),
            report = %serde_json::to_string(&report).unwrap_or_default(),
            "POSTing sensor data"
        );
        client.send(&report).await
    }

    /// Read every active sensor and merge the results.
    ///
    /// A backend whose read fails is logged and left out. When two backends
    /// report the same sensor ID, the later one wins.
    pub async fn collect(&mut self) -> Readings {
        tracing::debug!("Reading sensors");
        let mut aggregate = Readings::new();
        for sensor in &mut self.sensors {
            match sensor.read().await {
                Ok(readings) => aggregate.extend(readings),
                Err(e) => {
                    tracing::error!(sensor = sensor.class_name(), error = %e, "Exception reading sensor");
                }
            }
        }
        aggregate
    }
}

impl std::fmt::Debug for SensorDaemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorDaemon")
            .field("host_id", &self.host_id)
            .field("endpoint", &self.endpoint)
            .field("dry_run", &self.config.dry_run)
            .field("sensors", &self.sensor_classes())
            .finish_non_exhaustive()
    }
}

/// Build and probe sensor backends.
///
/// In dummy mode this is a single [`DummySensor`] and the registry is not
/// consulted. Otherwise each registered class is built with its configured
/// arguments and kept only if it reports sensors present; build and probe
/// failures are logged and the class is skipped.
async fn discover_sensors(
    config: &AgentConfig,
    registry: &SensorRegistry,
    ctx: &SensorContext,
) -> Vec<Box<dyn Sensor>> {
    if config.dummy {
        tracing::warn!("Running with --dummy - only DummySensor will be loaded");
        return vec![Box::new(DummySensor::new(ctx.host_id.clone()))];
    }

    for class in config.sensor_args.keys() {
        if registry.get(class).is_none() {
            tracing::warn!(class = %class, "Arguments given for unknown sensor class");
        }
    }

    tracing::debug!("Checking sensor classes for sensors...");
    let mut active = Vec::new();
    for class in registry.classes() {
        let args = config.args_for(class.name());
        let mut sensor = match class.build(ctx, &args).await {
            Ok(sensor) => sensor,
            Err(e) => {
                tracing::warn!(class = class.name(), error = %e, "Failed to initialize sensor class");
                continue;
            }
        };

        match sensor.sensors_present().await {
            Ok(true) => {
                tracing::info!(class = class.name(), "Sensor class reports sensors present");
                active.push(sensor);
            }
            Ok(false) => {
                tracing::debug!(class = class.name(), "Sensor class reports no sensors");
            }
            Err(e) => {
                tracing::warn!(
                    class = class.name(),
                    error = %e,
                    "Exception while discovering sensors"
                );
            }
        }
    }

    tracing::debug!(
        count = active.len(),
        "Discovered sensor classes with sensors present"
    );
    active
}
