//! Thermo Agent Binary Entry Point
//!
//! Runs the sensor daemon until interrupted.
//! Core functionality is provided by the `thermo_agent` library crate.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use thermo_agent::{
    config::{AgentConfig, ConfigError, parse_duration, parse_interval_secs},
    daemon::SensorDaemon,
    discovery::{SystemHostId, UnavailableDiscovery},
    introspect,
    sensor::SensorRegistry,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Thermo Agent - Temperature Sensor Daemon
#[derive(Parser, Debug)]
#[command(name = "thermo-agent", version, about, long_about = None)]
struct Cli {
    /// Path to an optional YAML configuration file
    #[arg(long, env = "THERMO_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output; specify twice for debug-level output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log results, do not POST to Engine
    #[arg(short, long)]
    dry_run: bool,

    /// Engine API address (discovered when omitted)
    #[arg(short = 'a', long, env = "THERMO_AGENT_ENGINE_ADDRESS")]
    engine_address: Option<String>,

    /// Engine API port [default: 8088]
    #[arg(short = 'p', long, env = "THERMO_AGENT_ENGINE_PORT")]
    engine_port: Option<u16>,

    /// Do not discover or read sensors; instead send dummy data
    #[arg(long)]
    dummy: bool,

    /// Float number of seconds to sleep between sensor poll/POST cycles [default: 60]
    #[arg(short, long, value_parser = parse_interval_secs)]
    interval: Option<Duration>,

    /// Timeout for each POST to the Engine (e.g. "30s", "2m") [default: 30s]
    #[arg(long, value_parser = parse_duration)]
    request_timeout: Option<Duration>,

    /// List all discovered sensor classes and their arguments, then exit
    #[arg(short = 'l', long)]
    list_sensor_classes: bool,

    /// Argument for a sensor class constructor; repeatable
    #[arg(short = 'c', long = "sensor-class-arg", value_name = "CLASS=ARG=VALUE")]
    sensor_class_args: Vec<String>,

    /// Override the host ID reported to the Engine
    #[arg(long, env = "THERMO_AGENT_HOST_ID")]
    host_id: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = SensorRegistry::builtin();
    if cli.list_sensor_classes {
        introspect::list_classes(&registry);
        return ExitCode::SUCCESS;
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let identity = SystemHostId::new();
    let startup = SensorDaemon::new(config, &registry, &UnavailableDiscovery, &identity);
    let mut daemon = tokio::select! {
        result = startup => match result {
            Ok(daemon) => daemon,
            Err(e) => {
                tracing::error!(error = %e, "Sensor daemon failed to start");
                return ExitCode::FAILURE;
            }
        },
        () = shutdown_signal() => return ExitCode::SUCCESS,
    };

    tokio::select! {
        () = daemon.run() => {}
        () = shutdown_signal() => {}
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

/// Initialize tracing. `RUST_LOG` wins over the `-v` count.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(verbose > 1)
                .with_line_number(verbose > 1),
        )
        .init();
}

/// Load the optional config file and apply CLI/env overrides
/// (CLI > ENV > config file).
fn build_config(cli: &Cli) -> Result<AgentConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading configuration");
            AgentConfig::load(path)?
        }
        None => AgentConfig::default(),
    };

    if cli.dry_run {
        config.dry_run = true;
    }
    if cli.dummy {
        config.dummy = true;
    }
    if let Some(address) = &cli.engine_address {
        config.engine.address = Some(address.clone());
    }
    if let Some(port) = cli.engine_port {
        config.engine.port = port;
    }
    if let Some(interval) = cli.interval {
        config.interval = interval;
    }
    if let Some(timeout) = cli.request_timeout {
        config.request_timeout = timeout;
    }
    if let Some(host_id) = &cli.host_id {
        config.host_id = Some(host_id.clone());
    }
    config.merge_sensor_class_args(&cli.sensor_class_args)?;

    config.validate()?;
    Ok(config)
}

/// Resolve when Ctrl+C or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::warn!("Received Ctrl+C signal; exiting");
        }
        () = terminate => {
            tracing::warn!("Received terminate signal; exiting");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["thermo-agent"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.dry_run);
        assert!(!cli.dummy);
        assert!(!cli.list_sensor_classes);
        assert_eq!(cli.engine_address, None);

        let config = build_config(&cli).unwrap();
        assert_eq!(config.engine.port, 8088);
        assert_eq!(config.interval, Duration::from_secs(60));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "thermo-agent",
            "-vv",
            "--dry-run",
            "-a",
            "foo.bar.baz",
            "--engine-port=1234",
            "--dummy",
            "-i",
            "12.34",
            "-c",
            "OWFS=owfs_path=/mnt/1wire",
            "--request-timeout",
            "5s",
            "--host-id",
            "myhostid",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let config = build_config(&cli).unwrap();
        assert!(config.dry_run);
        assert!(config.dummy);
        assert_eq!(config.engine.address.as_deref(), Some("foo.bar.baz"));
        assert_eq!(config.engine.port, 1234);
        assert_eq!(config.interval, Duration::from_secs_f64(12.34));
        assert_eq!(config.args_for("OWFS").get("owfs_path"), Some("/mnt/1wire"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.host_id.as_deref(), Some("myhostid"));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.yaml");
        std::fs::write(
            &path,
            "engine:
  address: 10.0.0.5
  port: 9000
sensor_args:
  OWFS:
    owfs_path: /old
",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "thermo-agent",
            "--config",
            path.to_str().unwrap(),
            "-p",
            "9100",
            "-c",
            "OWFS=owfs_path=/new",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.engine.address.as_deref(), Some("10.0.0.5"));
        assert_eq!(config.engine.port, 9100);
        assert_eq!(config.args_for("OWFS").get("owfs_path"), Some("/new"));
    }

    #[test]
    fn test_cli_rejects_bad_interval() {
        assert!(Cli::try_parse_from(["thermo-agent", "-i", "0"]).is_err());
        assert!(Cli::try_parse_from(["thermo-agent", "-i", "abc"]).is_err());
        assert!(Cli::try_parse_from(["thermo-agent", "--request-timeout", "30"]).is_err());
    }

    #[test]
    fn test_bad_sensor_class_arg_is_config_error() {
        let cli = Cli::try_parse_from(["thermo-agent", "-c", "OWFS"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
