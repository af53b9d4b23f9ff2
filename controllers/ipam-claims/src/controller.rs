//! Main controller implementation.
//!
//! Wires the Kubernetes client, the reconciler and the VMI watcher together.

use crate::config::ClusterConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use crds::VirtualMachineInstance;
use kube::{Api, Client};
use network_client::KubeNetworkClient;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for IPAMClaims and Multus annotations.
pub struct Controller {
    vmi_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Connects to the cluster and starts the VMI watcher.
    ///
    /// `namespace` limits the watch to one namespace; `None` watches all.
    pub async fn new(namespace: Option<String>, config: ClusterConfig) -> Result<Self, ControllerError> {
        info!("Initializing IPAM Claims Controller");

        let kube_client = Client::try_default().await?;

        let vmi_api: Api<VirtualMachineInstance> = match namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client.clone(), ns),
            None => Api::all(kube_client.clone()),
        };

        let network_client = Arc::new(KubeNetworkClient::new(kube_client));
        let reconciler = Arc::new(Reconciler::new(network_client, config));
        let watcher = Watcher::new(reconciler, vmi_api);

        let vmi_watcher = tokio::spawn(async move { watcher.watch_virtual_machine_instances().await });

        Ok(Self { vmi_watcher })
    }

    /// Runs the controller until the watcher stops.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("IPAM Claims Controller running");
        self.vmi_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("VirtualMachineInstance watcher panicked: {}", e)))?
    }
}
