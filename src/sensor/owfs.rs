//! OWFS (1-Wire filesystem) temperature sensors.
//!
//! OWFS exposes each 1-Wire device as a directory named `<family>.<id>` in
//! hex, holding a `temperature` file and optional `address`, `alias` and
//! `type` files. The bus itself carries `settings/units/temperature_scale`.
//!
//! Devices are rediscovered on every call so hot-plugged sensors show up on
//! the next poll.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::sensor::registry::SensorClass;
use crate::sensor::schema::{ParamSpec, SensorArgs};
use crate::sensor::traits::{Readings, Sensor, SensorContext, SensorError, SensorReading};

/// Class name of the OWFS backend.
pub const OWFS_CLASS: &str = "OWFS";

/// Mountpoints tried, in order, when no path is configured.
pub const DEFAULT_OWFS_PATHS: &[&str] = &[
    "/run/owfs",
    "/owfs",
    "/mnt/owfs",
    "/var/owfs",
    "/1wire",
    "/var/1wire",
    "/mnt/1wire",
    "/run/1wire",
];

/// Name of the temperature file in each device directory.
const TEMPERATURE_FILE: &str = "temperature";

const OWFS_PARAMS: &[ParamSpec] = &[ParamSpec::new(
    "owfs_path",
    "Absolute path to the OWFS mountpoint. If not specified, \
     some common defaults will be tried.",
)
.with_type("str")];

fn sensor_dir_regex() -> &'static Regex {
    static SENSOR_DIR_RE: OnceLock<Regex> = OnceLock::new();
    SENSOR_DIR_RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]+\.[0-9a-fA-F]+$").expect("failed to compile sensor dir regex")
    })
}

/// Path of the temperature scale setting below a mountpoint.
fn temp_scale_path(owfs_path: &Path) -> PathBuf {
    owfs_path
        .join("settings")
        .join("units")
        .join("temperature_scale")
}

/// Temperature scale configured on the OWFS mount.
///
/// Detected for information only; readings are reported as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum TemperatureScale {
    /// Degrees Celsius.
    #[strum(serialize = "C")]
    Celsius,
    /// Degrees Fahrenheit.
    #[strum(serialize = "F")]
    Fahrenheit,
    /// Kelvin.
    #[strum(serialize = "K")]
    Kelvin,
    /// Degrees Rankine.
    #[strum(serialize = "R")]
    Rankine,
}

/// A temperature device found on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// File to read the temperature from.
    pub temp_path: PathBuf,
    /// Device address; the directory name when no `address` file exists.
    pub address: String,
    /// Alias, if set.
    pub alias: Option<String>,
    /// Device type (e.g. "DS18S20"), if reported.
    pub kind: Option<String>,
}

/// OWFS temperature sensor backend.
#[derive(Debug, Clone)]
pub struct OwfsSensor {
    owfs_path: PathBuf,
    temp_scale: String,
}

impl OwfsSensor {
    /// Open an OWFS mount, autodiscovering it when `owfs_path` is `None`.
    ///
    /// # Errors
    /// Returns `SensorError::Config` if no mountpoint is configured or found,
    /// and `SensorError::Io` if the temperature scale cannot be read.
    pub async fn new(owfs_path: Option<PathBuf>) -> Result<Self, SensorError> {
        Self::with_candidates(owfs_path, DEFAULT_OWFS_PATHS).await
    }

    /// Like [`OwfsSensor::new`], probing `candidates` instead of the defaults.
    pub async fn with_candidates<P: AsRef<Path>>(
        owfs_path: Option<PathBuf>,
        candidates: &[P],
    ) -> Result<Self, SensorError> {
        let owfs_path = match owfs_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Using specified owfs_path");
                path
            }
            None => Self::discover_mount(candidates).await.ok_or_else(|| {
                SensorError::Config(
                    "could not discover OWFS mountpoint and owfs_path class argument not specified"
                        .to_string(),
                )
            })?,
        };

        let scale_path = temp_scale_path(&owfs_path);
        let temp_scale = tokio::fs::read_to_string(&scale_path)
            .await
            .map_err(|e| SensorError::io(&scale_path, e))?
            .trim()
            .to_string();

        if temp_scale.parse::<TemperatureScale>().is_err() {
            tracing::warn!(scale = %temp_scale, "Unrecognized OWFS temperature scale");
        }
        tracing::debug!(
            path = %owfs_path.display(),
            scale = %temp_scale,
            "Found OWFS mount"
        );

        Ok(Self {
            owfs_path,
            temp_scale,
        })
    }

    /// First candidate that exists and carries the temperature scale setting.
    pub async fn discover_mount<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
        for candidate in candidates {
            let path = candidate.as_ref();
            if !exists(path).await {
                tracing::debug!(path = %path.display(), "Path does not exist; skipping");
                continue;
            }
            if !exists(&temp_scale_path(path)).await {
                tracing::debug!(
                    path = %path.display(),
                    "Path exists but does not appear to have OWFS mounted"
                );
                continue;
            }
            tracing::info!(path = %path.display(), "Found OWFS mounted");
            return Some(path.to_path_buf());
        }
        tracing::debug!("Could not discover any OWFS at known mountpoints");
        None
    }

    /// Mountpoint in use.
    pub fn owfs_path(&self) -> &Path {
        &self.owfs_path
    }

    /// Raw temperature scale setting of the mount.
    pub fn temp_scale(&self) -> &str {
        &self.temp_scale
    }

    /// Parsed temperature scale, if recognized.
    pub fn temperature_scale(&self) -> Option<TemperatureScale> {
        self.temp_scale.parse().ok()
    }

    /// Enumerate temperature devices currently on the bus.
    ///
    /// Only directories named like `<hex>.<hex>` that contain a
    /// `temperature` entry are returned, sorted by directory name.
    ///
    /// # Errors
    /// Returns `SensorError::Io` if the mountpoint cannot be listed.
    pub async fn find_sensors(&self) -> Result<Vec<DeviceDescriptor>, SensorError> {
        let mut entries = tokio::fs::read_dir(&self.owfs_path)
            .await
            .map_err(|e| SensorError::io(&self.owfs_path, e))?;

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SensorError::io(&self.owfs_path, e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let path = entry.path();
            if !is_dir(&path).await {
                continue;
            }
            if !sensor_dir_regex().is_match(&name) {
                continue;
            }
            let temp_path = path.join(TEMPERATURE_FILE);
            if !exists(&temp_path).await {
                continue;
            }
            dirs.push((name, path, temp_path));
        }
        dirs.sort_by(|a, b| a.0.cmp(&b.0));

        let mut sensors = Vec::with_capacity(dirs.len());
        for (name, dir, temp_path) in dirs {
            tracing::debug!(path = %temp_path.display(), "Found temperature sensor");
            sensors.push(DeviceDescriptor {
                temp_path,
                address: read_owfs_file(&dir, "address").await.unwrap_or(name),
                alias: read_owfs_file(&dir, "alias").await,
                kind: read_owfs_file(&dir, "type").await,
            });
        }
        Ok(sensors)
    }
}

#[async_trait::async_trait]
impl Sensor for OwfsSensor {
    fn class_name(&self) -> &str {
        OWFS_CLASS
    }

    async fn sensors_present(&mut self) -> Result<bool, SensorError> {
        let sensors = self.find_sensors().await?;
        tracing::debug!(count = sensors.len(), "OWFS sensors present");
        Ok(!sensors.is_empty())
    }

    async fn read(&mut self) -> Result<Readings, SensorError> {
        let mut readings = Readings::new();

        for device in self.find_sensors().await? {
            tracing::debug!(
                address = %device.address,
                path = %device.temp_path.display(),
                "Reading temperature"
            );
            let value = match read_temperature(&device.temp_path).await {
                Ok(value) => {
                    tracing::debug!(address = %device.address, value, "Got temperature");
                    Some(value)
                }
                Err(e) => {
                    tracing::debug!(address = %device.address, error = %e, "Failed to read sensor");
                    None
                }
            };

            let mut reading = SensorReading::new(value);
            reading.kind = device.kind;
            reading.alias = device.alias;
            readings.insert(device.address, reading);
        }

        Ok(readings)
    }
}

/// Factory for [`OwfsSensor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OwfsClass;

#[async_trait::async_trait]
impl SensorClass for OwfsClass {
    fn name(&self) -> &str {
        OWFS_CLASS
    }

    fn description(&self) -> &str {
        "OWFS 1-Wire temperature sensors"
    }

    fn params(&self) -> &[ParamSpec] {
        OWFS_PARAMS
    }

    async fn build(
        &self,
        _ctx: &SensorContext,
        args: &SensorArgs,
    ) -> Result<Box<dyn Sensor>, SensorError> {
        args.validate(OWFS_CLASS, OWFS_PARAMS)?;
        let owfs_path = args.value(&OWFS_PARAMS[0]).map(PathBuf::from);
        Ok(Box::new(OwfsSensor::new(owfs_path).await?))
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Trimmed contents of a device file; `None` if missing, unreadable or blank.
async fn read_owfs_file(dir: &Path, name: &str) -> Option<String> {
    let path = dir.join(name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let content = content.trim();
            (!content.is_empty()).then(|| content.to_string())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Failed to read OWFS file");
            None
        }
    }
}

async fn read_temperature(path: &Path) -> Result<f64, SensorError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SensorError::io(path, e))?;
    content
        .trim()
        .parse::<f64>()
        .map_err(|e| SensorError::Read(format!("'{}': {}", content.trim(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Build a fake OWFS mount inside a temp dir.
    fn owfs_mount(scale: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let units = dir.path().join("settings").join("units");
        fs::create_dir_all(&units).unwrap();
        fs::write(units.join("temperature_scale"), format!("{scale}\n")).unwrap();
        dir
    }

    fn add_device(root: &Path, name: &str, files: &[(&str, &str)]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for (file, content) in files {
            fs::write(dir.join(file), content).unwrap();
        }
    }

    async fn open(mount: &tempfile::TempDir) -> OwfsSensor {
        OwfsSensor::new(Some(mount.path().to_path_buf()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_reads_temperature_scale() {
        let mount = owfs_mount("C");
        let sensor = open(&mount).await;
        assert_eq!(sensor.owfs_path(), mount.path());
        assert_eq!(sensor.temp_scale(), "C");
        assert_eq!(sensor.temperature_scale(), Some(TemperatureScale::Celsius));
    }

    #[tokio::test]
    async fn test_unknown_scale_is_kept_raw() {
        let mount = owfs_mount("X");
        let sensor = open(&mount).await;
        assert_eq!(sensor.temp_scale(), "X");
        assert_eq!(sensor.temperature_scale(), None);
    }

    #[tokio::test]
    async fn test_discover_mount_picks_first_qualifying_candidate() {
        let missing = tempfile::tempdir().unwrap().path().join("nope");
        let not_owfs = tempfile::tempdir().unwrap();
        let first = owfs_mount("F");
        let second = owfs_mount("C");

        let candidates = [
            missing,
            not_owfs.path().to_path_buf(),
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ];
        let sensor = OwfsSensor::with_candidates(None, &candidates)
            .await
            .unwrap();
        assert_eq!(sensor.owfs_path(), first.path());
        assert_eq!(sensor.temperature_scale(), Some(TemperatureScale::Fahrenheit));
    }

    #[tokio::test]
    async fn test_discovery_failure_is_config_error() {
        let not_owfs = tempfile::tempdir().unwrap();
        let err = OwfsSensor::with_candidates(None, &[not_owfs.path()])
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::Config(_)));
        assert!(err.to_string().contains("could not discover OWFS mountpoint"));
    }

    #[tokio::test]
    async fn test_explicit_path_without_settings_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = OwfsSensor::new(Some(dir.path().to_path_buf()))
            .await
            .unwrap_err();
        assert!(matches!(err, SensorError::Io { .. }));
    }

    #[tokio::test]
    async fn test_find_sensors_filters_directories() {
        let mount = owfs_mount("C");
        let root = mount.path();
        add_device(root, "10.A8B7C6D5E4F3", &[("temperature", "21.5")]);
        add_device(root, "28.ff0011223344", &[("temperature", "19.0")]);
        add_device(root, "bus.0", &[("temperature", "0")]);
        add_device(root, "uncached", &[]);
        add_device(root, "81.000000000000", &[("address", "81000000")]);
        fs::write(root.join("3A.123456"), "not a dir").unwrap();

        let sensor = open(&mount).await;
        let found = sensor.find_sensors().await.unwrap();
        let addresses: Vec<&str> = found.iter().map(|d| d.address.as_str()).collect();
        assert_eq!(addresses, vec!["10.A8B7C6D5E4F3", "28.ff0011223344"]);
        assert_eq!(
            found[0].temp_path,
            root.join("10.A8B7C6D5E4F3").join("temperature")
        );
    }

    #[tokio::test]
    async fn test_find_sensors_reads_sidecar_files() {
        let mount = owfs_mount("C");
        add_device(
            mount.path(),
            "10.A8B7C6D5E4F3",
            &[
                ("temperature", "21.5"),
                ("address", "  10A8B7C6D5E4F3A1\n"),
                ("alias", "   \n\t"),
                ("type", "DS18S20\n"),
            ],
        );

        let sensor = open(&mount).await;
        let found = sensor.find_sensors().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].address, "10A8B7C6D5E4F3A1");
        assert_eq!(found[0].alias, None);
        assert_eq!(found[0].kind.as_deref(), Some("DS18S20"));
    }

    #[tokio::test]
    async fn test_sensors_present() {
        let mount = owfs_mount("C");
        let mut sensor = open(&mount).await;
        assert!(!sensor.sensors_present().await.unwrap());

        add_device(mount.path(), "10.AB", &[("temperature", "20")]);
        assert!(sensor.sensors_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_read_nulls_bad_sensor_only() {
        let mount = owfs_mount("C");
        add_device(
            mount.path(),
            "10.AA",
            &[
                ("temperature", "     22.375"),
                ("address", "10AA"),
                ("alias", "kitchen"),
                ("type", "DS18S20"),
            ],
        );
        add_device(
            mount.path(),
            "10.BB",
            &[("temperature", "garbage"), ("address", "10BB")],
        );
        add_device(mount.path(), "10.CC", &[("address", "10CC")]);
        // A directory named "temperature" exists but cannot be read as a file.
        fs::create_dir_all(mount.path().join("10.CC").join("temperature")).unwrap();

        let mut sensor = open(&mount).await;
        let readings = sensor.read().await.unwrap();
        assert_eq!(readings.len(), 3);

        let good = &readings["10AA"];
        assert_eq!(good.value, Some(22.375));
        assert_eq!(good.alias.as_deref(), Some("kitchen"));
        assert_eq!(good.kind.as_deref(), Some("DS18S20"));

        let bad = &readings["10BB"];
        assert_eq!(bad.value, None);
        assert_eq!(bad.kind, None);
        assert_eq!(bad.alias, None);

        assert_eq!(readings["10CC"].value, None);
    }

    #[tokio::test]
    async fn test_present_then_read_key_sets_match() {
        let mount = owfs_mount("C");
        add_device(mount.path(), "10.01", &[("temperature", "1"), ("address", "A")]);
        add_device(mount.path(), "28.02", &[("temperature", "2"), ("address", "B")]);
        add_device(mount.path(), "28.03", &[("address", "C")]);

        let mut sensor = open(&mount).await;
        let probed: Vec<String> = sensor
            .find_sensors()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.address)
            .collect();
        assert!(sensor.sensors_present().await.unwrap());

        let read: Vec<String> = sensor.read().await.unwrap().into_keys().collect();
        assert_eq!(read, probed);
        assert_eq!(read, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_class_uses_owfs_path_argument() {
        let mount = owfs_mount("C");
        add_device(mount.path(), "10.01", &[("temperature", "23.5")]);

        let args = SensorArgs::new().with("owfs_path", mount.path().to_string_lossy());
        let mut sensor = OwfsClass
            .build(&SensorContext::new("h1"), &args)
            .await
            .unwrap();
        assert_eq!(sensor.class_name(), OWFS_CLASS);

        let readings = sensor.read().await.unwrap();
        assert_eq!(readings["10.01"].value, Some(23.5));
    }

    #[tokio::test]
    async fn test_class_rejects_unknown_argument() {
        let args = SensorArgs::new().with("owfs_mount", "/tmp");
        let err = OwfsClass
            .build(&SensorContext::new("h1"), &args)
            .await
            .err()
            .expect("unknown argument must fail");
        assert!(matches!(err, SensorError::InvalidArgument { .. }));
    }
}
