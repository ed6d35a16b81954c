//! Synthetic sensor for testing and demos.
//!
//! Always present; each read yields one random temperature between 18.00 and
//! 26.75 in quarter-degree steps.

use rand::Rng;

use crate::sensor::registry::SensorClass;
use crate::sensor::schema::SensorArgs;
use crate::sensor::traits::{Readings, Sensor, SensorContext, SensorError, SensorReading};

/// Class name of the dummy sensor.
pub const DUMMY_CLASS: &str = "Dummy";

/// Lowest value produced.
pub const DUMMY_MIN: f64 = 18.0;

/// Step between produced values.
pub const DUMMY_STEP: f64 = 0.25;

/// Number of distinct values (18.00 ..= 26.75).
pub const DUMMY_CHOICES: u32 = 36;

/// Sensor kind and alias reported by the dummy sensor.
const DUMMY_TAG: &str = "dummy";

/// Dummy sensor scoped to a host.
#[derive(Debug, Clone)]
pub struct DummySensor {
    host_id: String,
}

impl DummySensor {
    /// Create a dummy sensor for the given host.
    pub fn new(host_id: impl Into<String>) -> Self {
        Self {
            host_id: host_id.into(),
        }
    }

    /// Host this sensor is scoped to.
    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// The single sensor ID this backend reports.
    pub fn sensor_id(&self) -> String {
        format!("{}_dummy1", self.host_id)
    }

    /// Every value the dummy sensor can produce, ascending.
    pub fn choices() -> impl Iterator<Item = f64> {
        (0..DUMMY_CHOICES).map(|i| DUMMY_MIN + f64::from(i) * DUMMY_STEP)
    }
}

#[async_trait::async_trait]
impl Sensor for DummySensor {
    fn class_name(&self) -> &str {
        DUMMY_CLASS
    }

    async fn sensors_present(&mut self) -> Result<bool, SensorError> {
        Ok(true)
    }

    async fn read(&mut self) -> Result<Readings, SensorError> {
        let step = rand::thread_rng().gen_range(0..DUMMY_CHOICES);
        let value = DUMMY_MIN + f64::from(step) * DUMMY_STEP;

        let mut readings = Readings::new();
        readings.insert(
            self.sensor_id(),
            SensorReading::new(Some(value))
                .with_kind(DUMMY_TAG)
                .with_alias(DUMMY_TAG),
        );
        Ok(readings)
    }
}

/// Factory for [`DummySensor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyClass;

#[async_trait::async_trait]
impl SensorClass for DummyClass {
    fn name(&self) -> &str {
        DUMMY_CLASS
    }

    fn description(&self) -> &str {
        "Dummy sensor returning random temperatures"
    }

    async fn build(
        &self,
        ctx: &SensorContext,
        args: &SensorArgs,
    ) -> Result<Box<dyn Sensor>, SensorError> {
        args.validate(DUMMY_CLASS, self.params())?;
        Ok(Box::new(DummySensor::new(ctx.host_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choices() {
        let choices: Vec<f64> = DummySensor::choices().collect();
        assert_eq!(choices.len(), 36);
        assert_eq!(choices.first().copied(), Some(18.0));
        assert_eq!(choices.last().copied(), Some(26.75));
    }

    #[tokio::test]
    async fn test_always_present() {
        let mut sensor = DummySensor::new("h1");
        assert!(sensor.sensors_present().await.unwrap());
    }

    #[tokio::test]
    async fn test_read_is_single_quarter_degree_value() {
        let mut sensor = DummySensor::new("h1");
        let choices: Vec<f64> = DummySensor::choices().collect();

        for _ in 0..1000 {
            let readings = sensor.read().await.unwrap();
            assert_eq!(readings.len(), 1);

            let reading = readings.get("h1_dummy1").expect("dummy sensor id");
            assert_eq!(reading.kind.as_deref(), Some("dummy"));
            assert_eq!(reading.alias.as_deref(), Some("dummy"));
            assert!(reading.extra.is_none());

            let value = reading.value.expect("dummy always has a value");
            assert!(choices.contains(&value), "unexpected value {value}");
        }
    }

    #[tokio::test]
    async fn test_class_builds_with_host_scope() {
        let ctx = SensorContext::new("kitchen-pi");
        let mut sensor = DummyClass.build(&ctx, &SensorArgs::new()).await.unwrap();
        assert_eq!(sensor.class_name(), DUMMY_CLASS);

        let readings = sensor.read().await.unwrap();
        assert!(readings.contains_key("kitchen-pi_dummy1"));
    }

    #[tokio::test]
    async fn test_class_rejects_arguments() {
        let ctx = SensorContext::new("h1");
        let args = SensorArgs::new().with("speed", "fast");
        assert!(DummyClass.build(&ctx, &args).await.is_err());
    }
}
