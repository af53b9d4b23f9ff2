//! Kubernetes-backed network client
//!
//! Implements `NetworkClientTrait` on top of `kube::Api`, one typed API per
//! call since the target namespace changes from call to call.

use crate::error::NetworkClientError;
use crate::netclient_trait::NetworkClientTrait;
use crds::{IPAMClaim, NetworkAttachmentDefinition, VirtualMachineInstance};
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

/// Network client talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeNetworkClient {
    client: Client,
}

impl KubeNetworkClient {
    /// Create a new client from an existing kube `Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl NetworkClientTrait for KubeNetworkClient {
    async fn get_network_attachment_definition(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<NetworkAttachmentDefinition, NetworkClientError> {
        debug!("Getting NetworkAttachmentDefinition {}/{}", namespace, name);
        let api: Api<NetworkAttachmentDefinition> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| NetworkClientError::from_kube(e, namespace, name))
    }

    async fn create_ipam_claim(
        &self,
        namespace: &str,
        claim: &IPAMClaim,
    ) -> Result<IPAMClaim, NetworkClientError> {
        let name = claim.metadata.name.as_deref().unwrap_or("<unknown>");
        debug!("Creating IPAMClaim {}/{}", namespace, name);
        let api: Api<IPAMClaim> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), claim)
            .await
            .map_err(|e| NetworkClientError::from_kube(e, namespace, name))
    }

    async fn get_ipam_claim(&self, namespace: &str, name: &str) -> Result<IPAMClaim, NetworkClientError> {
        debug!("Getting IPAMClaim {}/{}", namespace, name);
        let api: Api<IPAMClaim> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| NetworkClientError::from_kube(e, namespace, name))
    }

    async fn annotate_virtual_machine_instance(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, Option<String>>,
    ) -> Result<(), NetworkClientError> {
        debug!("Patching annotations of VirtualMachineInstance {}/{}", namespace, name);
        let api: Api<VirtualMachineInstance> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({
            "metadata": {
                "annotations": annotations
            }
        });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| NetworkClientError::from_kube(e, namespace, name))?;
        Ok(())
    }
}
