//! Reconciliation logic for VirtualMachineInstances.
//!
//! For every VMI the reconciler makes sure the IPAMClaims of its persistent
//! secondary networks exist and carry the right owner, then publishes the
//! Multus annotations the launcher pod needs on the VMI's metadata.
//! Claims of deleted VMIs are left to the garbage collector through their
//! owner reference.

use crate::backoff::FibonacciBackoff;
use crate::config::ClusterConfig;
use crate::error::ControllerError;
use crate::ipam_claims::{self, IPAMClaimsManager, NetworkToIPAMClaimParams};
use crate::multus_annotations;
use crate::vmispec;
use crds::{MULTUS_DEFAULT_NETWORK_CNI_ANNOTATION, NETWORK_ATTACHMENT_ANNOT, VirtualMachineInstance};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use network_client::NetworkClientTrait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

const BACKOFF_MIN_SECONDS: u64 = 5;
const BACKOFF_MAX_SECONDS: u64 = 300;

/// Reconciles VirtualMachineInstances.
pub struct Reconciler {
    client: Arc<dyn NetworkClientTrait>,
    claims_manager: IPAMClaimsManager,
    config: ClusterConfig,
    /// Backoff per VMI (namespace/name)
    backoff_states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl Reconciler {
    pub fn new(client: Arc<dyn NetworkClientTrait>, config: ClusterConfig) -> Self {
        Self {
            claims_manager: IPAMClaimsManager::new(Arc::clone(&client)),
            client,
            config,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Reconciles a single VirtualMachineInstance.
    pub async fn reconcile_vmi(&self, vmi: &VirtualMachineInstance) -> Result<(), ControllerError> {
        let name = vmi.name_any();
        let namespace = vmi.namespace().ok_or_else(|| {
            ControllerError::InvalidConfig(format!("VirtualMachineInstance {} has no namespace", name))
        })?;

        if vmi.metadata.deletion_timestamp.is_some() {
            debug!("VirtualMachineInstance {}/{} is being deleted, nothing to do", namespace, name);
            self.reset_backoff(&format!("{}/{}", namespace, name));
            return Ok(());
        }

        let owner_ref = owner_reference(vmi).ok_or_else(|| {
            ControllerError::InvalidConfig(format!(
                "VirtualMachineInstance {}/{} has no uid to own its IPAMClaims",
                namespace, name
            ))
        })?;

        let interfaces = &vmi.spec.domain.devices.interfaces;
        let networks = &vmi.spec.networks;

        let params = if self.config.persistent_ips_enabled() {
            self.claims_manager
                .create_ipam_claims(&namespace, &name, interfaces, networks, &owner_ref)
                .await?
        } else {
            self.reject_persistent_ip_networks(&namespace, vmi).await?;
            NetworkToIPAMClaimParams::new()
        };

        let networks_annotation = multus_annotations::generate_multus_cni_annotation(
            &namespace,
            interfaces,
            networks,
            &params,
            &self.config,
        )?;
        let default_network_annotation = multus_annotations::multus_default_network_annotation(networks);

        let desired = BTreeMap::from([
            (NETWORK_ATTACHMENT_ANNOT, networks_annotation),
            (MULTUS_DEFAULT_NETWORK_CNI_ANNOTATION, default_network_annotation),
        ]);
        let patch = annotations_patch(vmi.annotations(), &desired);
        if patch.is_empty() {
            debug!("Multus annotations of VirtualMachineInstance {}/{} are up to date", namespace, name);
            return Ok(());
        }

        info!(
            "Updating Multus annotations of VirtualMachineInstance {}/{} ({} claims)",
            namespace,
            name,
            params.len()
        );
        self.client
            .annotate_virtual_machine_instance(&namespace, &name, &patch)
            .await?;
        Ok(())
    }

    /// Fails when an attached network asks for persistent IPs while the
    /// PersistentIPs gate is off.
    async fn reject_persistent_ip_networks(
        &self,
        namespace: &str,
        vmi: &VirtualMachineInstance,
    ) -> Result<(), ControllerError> {
        for network in vmispec::filter_non_absent_networks(&vmi.spec.domain.devices.interfaces, &vmi.spec.networks) {
            if ipam_claims::persistent_ip_network(self.client.as_ref(), namespace, network).await? {
                return Err(ControllerError::persistent_ips_disabled());
            }
        }
        Ok(())
    }

    /// Next requeue delay for a VMI whose reconciliation failed
    pub fn backoff_for(&self, resource_key: &str) -> Duration {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(resource_key.to_string())
            .or_insert_with(|| FibonacciBackoff::new(BACKOFF_MIN_SECONDS, BACKOFF_MAX_SECONDS))
            .next_backoff()
    }

    /// Forget the failure history of a VMI (on successful reconciliation
    /// or deletion)
    pub fn reset_backoff(&self, resource_key: &str) {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(resource_key);
    }
}

/// Owner of a VMI's IPAMClaims: the VMI's controller (its VM) when it has
/// one, the VMI itself otherwise.
pub fn owner_reference(vmi: &VirtualMachineInstance) -> Option<OwnerReference> {
    vmi.owner_references()
        .iter()
        .find(|owner| owner.controller == Some(true))
        .cloned()
        .or_else(|| {
            vmi.controller_owner_ref(&()).map(|owner| OwnerReference {
                block_owner_deletion: Some(true),
                ..owner
            })
        })
}

/// Annotations to patch so that `current` matches `desired`.
///
/// `None` in `desired` means the annotation must not be set.
fn annotations_patch(
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<&str, Option<String>>,
) -> BTreeMap<String, Option<String>> {
    let mut patch = BTreeMap::new();
    for (key, value) in desired {
        if current.get(*key) != value.as_ref() {
            patch.insert((*key).to_string(), value.clone());
        }
    }
    patch
}

#[cfg(test)]
#[path = "reconciler_test.rs"]
mod reconciler_test;
