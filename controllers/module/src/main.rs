//! Module Controller
//!
//! Watches `Module` resources and, for every kernel mapping that needs it,
//! drives a signing Job to completion. Jobs are owned by their Module, so a
//! Job change re-triggers reconciliation of the owning Module.

mod backoff;
mod config;
mod controller;
mod error;
mod metrics;
mod probes;
mod reconciler;
mod watcher;

use crate::config::Config;
use crate::controller::Controller;
use crate::error::ControllerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Module Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.watch_namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Signer image: {}", config.signer_image);
    info!("  Signer mode: {}", config.signer_mode);
    info!("  Requeue interval: {:?}", config.requeue_interval);
    info!("  Backoff: {}m..{}m", config.backoff_min_minutes, config.backoff_max_minutes);
    info!("  Probe address: {}", config.probe_addr);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
