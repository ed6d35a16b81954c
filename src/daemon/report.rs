//! Payload sent to the Engine and the result of one poll cycle.

use serde::{Deserialize, Serialize};

use crate::sensor::Readings;

/// Body of `POST /v1/sensors/update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReport {
    /// Reporting host.
    pub host_id: String,
    /// Aggregated readings from every backend.
    pub sensors: Readings,
}

impl SensorReport {
    /// Create a report.
    pub fn new(host_id: impl Into<String>, sensors: Readings) -> Self {
        Self {
            host_id: host_id.into(),
            sensors,
        }
    }
}

/// What happened to one cycle's report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The Engine accepted the report.
    Sent {
        /// Response status (201 or 202).
        status: u16,
    },
    /// Dry-run mode; nothing was sent.
    DryRun,
    /// The Engine answered with a non-success status.
    Rejected {
        /// Response status.
        status: u16,
        /// Response body text.
        body: String,
    },
    /// The request never got a response.
    TransportFailed {
        /// Error description.
        error: String,
    },
}

impl CycleOutcome {
    /// True when the report reached the Engine and was accepted.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorReading;

    #[test]
    fn test_report_wire_format() {
        let mut sensors = Readings::new();
        sensors.insert(
            "10AA".to_string(),
            SensorReading::new(Some(21.5)).with_kind("DS18S20").with_alias("hall"),
        );
        sensors.insert("10BB".to_string(), SensorReading::new(None));

        let json = serde_json::to_value(SensorReport::new("myhostid", sensors)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "host_id": "myhostid",
                "sensors": {
                    "10AA": { "type": "DS18S20", "value": 21.5, "alias": "hall" },
                    "10BB": { "type": null, "value": null },
                }
            })
        );
    }

    #[test]
    fn test_is_sent() {
        assert!(CycleOutcome::Sent { status: 201 }.is_sent());
        assert!(!CycleOutcome::DryRun.is_sent());
        assert!(
            !CycleOutcome::Rejected {
                status: 404,
                body: String::new()
            }
            .is_sent()
        );
    }
}
