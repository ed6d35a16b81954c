//! HTTP client for the Engine sensor update API.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use super::report::{CycleOutcome, SensorReport};
use super::runner::DaemonError;

/// Status codes the Engine uses to accept an update.
pub const ACCEPTED_STATUSES: &[u16] = &[201, 202];

/// Posts reports to the Engine.
#[derive(Debug, Clone)]
pub struct EngineClient {
    client: Client,
    url: Url,
}

impl EngineClient {
    /// Create a client for `url` with the given request timeout.
    ///
    /// # Errors
    /// Returns `DaemonError::Client` if the HTTP client cannot be built.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, DaemonError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DaemonError::Client(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, url })
    }

    /// Update endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST a report. Never fails; every problem is logged and returned as
    /// a [`CycleOutcome`].
    pub async fn send(&self, report: &SensorReport) -> CycleOutcome {
        let response = match self.client.post(self.url.clone()).json(report).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    url = %self.url,
                    error = %e,
                    "Exception caught when trying to POST data to Engine; will try again at next interval"
                );
                return CycleOutcome::TransportFailed {
                    error: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        if ACCEPTED_STATUSES.contains(&status) {
            tracing::info!(status, "POSTed sensor data to Engine");
            return CycleOutcome::Sent { status };
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(status, body = %body, "Error POSTing sensor data");
        CycleOutcome::Rejected { status, body }
    }
}
