//! Kubernetes resource watchers.
//!
//! Watches VirtualMachineInstances with `kube_runtime::Controller` and feeds
//! them to the reconciler. The controller handles reconnection; failed
//! reconciles requeue with a per-VMI Fibonacci backoff.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::VirtualMachineInstance;
use futures::StreamExt;
use kube::{Api, ResourceExt};
use kube_runtime::{Controller, controller::{Action, Config as ControllerConfig}, watcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Periodic resync of healthy VMIs
const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

fn resource_key(vmi: &VirtualMachineInstance) -> String {
    format!("{}/{}", vmi.namespace().unwrap_or_default(), vmi.name_any())
}

async fn reconcile(vmi: Arc<VirtualMachineInstance>, reconciler: Arc<Reconciler>) -> Result<Action, ControllerError> {
    let key = resource_key(&vmi);
    debug!("Reconciling VirtualMachineInstance {}", key);

    reconciler.reconcile_vmi(&vmi).await?;
    reconciler.reset_backoff(&key);
    Ok(Action::requeue(RESYNC_INTERVAL))
}

fn error_policy(vmi: Arc<VirtualMachineInstance>, error: &ControllerError, reconciler: Arc<Reconciler>) -> Action {
    let key = resource_key(&vmi);
    let backoff = reconciler.backoff_for(&key);
    warn!(
        "Reconciliation of VirtualMachineInstance {} failed, retrying in {}s: {}",
        key,
        backoff.as_secs(),
        error
    );
    Action::requeue(backoff)
}

/// Watches VirtualMachineInstances for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    vmi_api: Api<VirtualMachineInstance>,
}

impl Watcher {
    pub fn new(reconciler: Arc<Reconciler>, vmi_api: Api<VirtualMachineInstance>) -> Self {
        Self { reconciler, vmi_api }
    }

    /// Runs until the watch stream ends.
    pub async fn watch_virtual_machine_instances(&self) -> Result<(), ControllerError> {
        info!("Starting VirtualMachineInstance watcher");

        // Debounce batches bursts of VMI status updates into one reconcile
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(1))
            .concurrency(4);

        Controller::new(self.vmi_api.clone(), watcher::Config::default())
            .with_config(controller_config)
            .run(reconcile, error_policy, Arc::clone(&self.reconciler))
            .for_each(|res| async move {
                match res {
                    Ok((object, _)) => debug!("Reconciled VirtualMachineInstance {}", object),
                    Err(e) => error!("VirtualMachineInstance controller error: {}", e),
                }
            })
            .await;

        Err(ControllerError::Watch(
            "VirtualMachineInstance watch stream ended".to_string(),
        ))
    }
}
