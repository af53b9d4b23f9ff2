//! NetworkClient trait for mocking
//!
//! This trait abstracts the Kubernetes calls the IPAM claims pipeline makes so
//! that reconcilers can be unit tested without an API server. The concrete
//! `KubeNetworkClient` implements it, tests use `MockNetworkClient`.

use crate::error::NetworkClientError;
use crds::{IPAMClaim, NetworkAttachmentDefinition};
use std::collections::BTreeMap;

/// Kubernetes operations needed by the IPAM claims controller.
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait NetworkClientTrait: Send + Sync {
    /// Fetch a NetworkAttachmentDefinition by namespace and name
    async fn get_network_attachment_definition(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<NetworkAttachmentDefinition, NetworkClientError>;

    /// Create an IPAMClaim; fails with `AlreadyExists` when the name is taken
    async fn create_ipam_claim(
        &self,
        namespace: &str,
        claim: &IPAMClaim,
    ) -> Result<IPAMClaim, NetworkClientError>;

    /// Fetch an IPAMClaim by namespace and name
    async fn get_ipam_claim(&self, namespace: &str, name: &str) -> Result<IPAMClaim, NetworkClientError>;

    /// Merge the given annotations into a VMI's metadata; `None` removes the key
    async fn annotate_virtual_machine_instance(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, Option<String>>,
    ) -> Result<(), NetworkClientError>;
}
