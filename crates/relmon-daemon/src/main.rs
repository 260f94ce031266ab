//! Relmon Daemon - Hardware reliability telemetry service
//!
//! This binary runs as a system service and handles:
//! - Listening for kernel uevents over netlink
//! - Tracking USB connector and audio accessory attach state
//! - Forwarding reliability telemetry to the stats service
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! The daemon binds the netlink uevent socket, builds the listener use case
//! around it and the HTTP stats client, and drives the listen loop until
//! either the transport fails or a `CancellationToken` is triggered by
//! receipt of SIGTERM or SIGINT.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use relmon_core::{
    config::Config,
    ports::{IClock, IStatsReporter, IUeventSource, SystemClock},
    usecases::UeventListener,
};
use relmon_netlink::NetlinkUeventSource;
use relmon_stats::StatsClient;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Main daemon service that owns the listener and its shutdown token
struct DaemonService {
    /// Application configuration loaded from YAML
    config: Config,
    /// Token for signalling graceful shutdown
    shutdown: CancellationToken,
}

impl DaemonService {
    /// Creates a new DaemonService, loading configuration from the default
    /// path (or falling back to built-in defaults).
    fn new(shutdown: CancellationToken) -> Self {
        let config_path = Config::default_path();
        let config = Config::load_or_default(&config_path);
        info!(config_path = %config_path.display(), "Loaded configuration");

        Self { config, shutdown }
    }

    /// Runs the daemon's main loop
    ///
    /// 1. Builds the HTTP stats client
    /// 2. Binds the netlink uevent socket
    /// 3. Enters the listen loop with graceful shutdown support
    async fn run(&self) -> Result<()> {
        let reporter: Arc<dyn IStatsReporter> = Arc::new(
            StatsClient::new(
                self.config.reporting.endpoint.clone(),
                Duration::from_secs(self.config.reporting.timeout_secs),
            )
            .context("Failed to build stats client")?,
        );
        info!(endpoint = %self.config.reporting.endpoint, "Stats reporting configured");

        let source: Arc<dyn IUeventSource> = Arc::new(
            NetlinkUeventSource::bind().context("Failed to open the uevent netlink socket")?,
        );

        let clock: Arc<dyn IClock> = Arc::new(SystemClock);
        let mut listener = UeventListener::new(&self.config.listener, source, reporter, clock);

        info!("Entering uevent listen loop");

        tokio::select! {
            result = listener.listen() => {
                result.context("Uevent listen loop terminated")
            }
            _ = self.shutdown.cancelled() => {
                info!("Shutdown signal received, stopping listen loop");
                Ok(())
            }
        }
    }
}

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    info!("Relmon daemon starting (relmond)");

    let shutdown_token = CancellationToken::new();

    // Spawn signal handler task
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let service = DaemonService::new(shutdown_token.clone());

    let result = service.run().await;

    match &result {
        Ok(()) => info!("Relmon daemon shut down gracefully"),
        Err(e) => error!(error = format!("{e:#}"), "Relmon daemon exiting with error"),
    }

    result
}
