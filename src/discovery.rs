//! Engine endpoint discovery and host identity.
//!
//! Both are collaborators of the daemon rather than part of it: the daemon
//! asks an [`EngineDiscovery`] where the Engine lives when no address is
//! configured, and a [`HostIdentity`] for the ID reported with every update.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Path of the Engine's sensor update endpoint.
pub const UPDATE_PATH: &str = "/v1/sensors/update";

/// Default Engine API port.
pub const DEFAULT_ENGINE_PORT: u16 = 8088;

/// Host ID used when no identity source is readable.
pub const FALLBACK_HOST_ID: &str = "unknown-host";

/// Files tried, in order, by [`SystemHostId`].
pub const HOST_ID_SOURCES: &[&str] = &[
    "/etc/machine-id",
    "/var/lib/dbus/machine-id",
    "/proc/sys/kernel/hostname",
];

/// Engine discovery failed.
#[derive(Debug, Error)]
#[error("engine discovery failed: {0}")]
pub struct DiscoveryError(pub String);

/// Address and port of the Engine API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEndpoint {
    /// Hostname or IP address.
    pub address: String,
    /// TCP port.
    pub port: u16,
}

impl EngineEndpoint {
    /// Create an endpoint.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// URL readings are POSTed to.
    ///
    /// The address must be a bare host or IP literal; path, query, fragment
    /// and userinfo delimiters are rejected.
    ///
    /// # Errors
    /// Returns `url::ParseError` if the address is not a valid host.
    pub fn update_url(&self) -> Result<Url, url::ParseError> {
        let address = self.address.trim();
        let bare = address
            .strip_prefix('[')
            .and_then(|a| a.strip_suffix(']'))
            .unwrap_or(address);
        if bare.is_empty() {
            return Err(url::ParseError::EmptyHost);
        }
        let is_delimiter =
            |c: char| c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '@' | '[' | ']');
        if bare.contains(is_delimiter) {
            return Err(url::ParseError::InvalidDomainCharacter);
        }

        let host = if bare.contains(':') {
            format!("[{}]", bare)
        } else {
            bare.to_string()
        };
        let mut url = Url::parse(&format!("http://{}", host))?;
        url.set_port(Some(self.port))
            .map_err(|()| url::ParseError::InvalidPort)?;
        url.set_path(UPDATE_PATH);
        Ok(url)
    }
}

impl std::fmt::Display for EngineEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Locates the Engine on the network.
#[async_trait::async_trait]
pub trait EngineDiscovery: Send + Sync {
    /// Find the Engine endpoint.
    async fn discover(&self) -> Result<EngineEndpoint, DiscoveryError>;
}

/// Discovery used when no mechanism is available; always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableDiscovery;

#[async_trait::async_trait]
impl EngineDiscovery for UnavailableDiscovery {
    async fn discover(&self) -> Result<EngineEndpoint, DiscoveryError> {
        Err(DiscoveryError(
            "engine autodiscovery not implemented; pass --engine-address".to_string(),
        ))
    }
}

/// Discovery that returns a fixed endpoint.
#[derive(Debug, Clone)]
pub struct StaticDiscovery(pub EngineEndpoint);

#[async_trait::async_trait]
impl EngineDiscovery for StaticDiscovery {
    async fn discover(&self) -> Result<EngineEndpoint, DiscoveryError> {
        Ok(self.0.clone())
    }
}

/// Source of this host's stable identifier.
pub trait HostIdentity: Send + Sync {
    /// Opaque identifier for the current host.
    fn host_id(&self) -> String;
}

/// Fixed host ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHostId(pub String);

impl HostIdentity for StaticHostId {
    fn host_id(&self) -> String {
        self.0.clone()
    }
}

/// Host ID read from the first non-empty system identity file.
#[derive(Debug, Clone)]
pub struct SystemHostId {
    sources: Vec<PathBuf>,
}

impl SystemHostId {
    /// Read from [`HOST_ID_SOURCES`].
    pub fn new() -> Self {
        Self::with_sources(HOST_ID_SOURCES.iter().map(PathBuf::from))
    }

    /// Read from custom files, in order.
    pub fn with_sources(sources: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            sources: sources.into_iter().collect(),
        }
    }
}

impl Default for SystemHostId {
    fn default() -> Self {
        Self::new()
    }
}

impl HostIdentity for SystemHostId {
    fn host_id(&self) -> String {
        for source in &self.sources {
            match std::fs::read_to_string(source) {
                Ok(content) => {
                    let id = content.trim();
                    if !id.is_empty() {
                        return id.to_string();
                    }
                }
                Err(e) => {
                    tracing::debug!(path = %source.display(), error = %e, "Host ID source unreadable");
                }
            }
        }
        tracing::warn!("No host ID source readable; using {}", FALLBACK_HOST_ID);
        FALLBACK_HOST_ID.to_string()
    }
}
