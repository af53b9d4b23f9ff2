//! IPAM Claims Controller
//!
//! Watches KubeVirt VirtualMachineInstances and, for their secondary Multus
//! networks:
//! - creates the IPAMClaims giving persistent IPs to networks whose
//!   NetworkAttachmentDefinition asks for them
//! - publishes the Multus network selection annotation the launcher pod
//!   must carry

mod backoff;
mod config;
mod controller;
mod error;
mod ipam_claims;
mod multus_annotations;
mod namescheme;
mod netconf;
mod reconciler;
mod vmispec;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::ClusterConfig;
use crate::error::ControllerError;
use controller::Controller;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting IPAM Claims Controller");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").ok().filter(|ns| !ns.is_empty());
    let config = ClusterConfig::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Feature gates: {}", config.feature_gates().collect::<Vec<_>>().join(","));
    info!(
        "  Network binding plugins: {}",
        config.binding_plugin_names().collect::<Vec<_>>().join(",")
    );

    let controller = Controller::new(namespace, config).await?;
    controller.run().await?;

    Ok(())
}
