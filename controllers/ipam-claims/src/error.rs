//! Controller-specific error types.
//!
//! This module defines error types specific to the IPAM Claims Controller
//! that are not covered by upstream library errors.

use kube::Error as KubeError;
use network_client::NetworkClientError;
use thiserror::Error;

/// Errors that can occur in the IPAM Claims Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Network client error
    #[error("Network client error: {0}")]
    Client(#[from] NetworkClientError),

    /// NetworkAttachmentDefinition lookup failed
    #[error("failed to locate network attachment definition {0}")]
    NetworkAttachmentDefinitionNotFound(String),

    /// NAD `spec.config` is malformed or incomplete
    #[error("failed retrieving persistentIPsNetworkName: {0}")]
    InvalidNetConf(String),

    /// IPAMClaim create/get failed
    #[error("failed IPAMClaims creation: {0}")]
    IPAMClaimCreation(String),

    /// An IPAMClaim with the expected name belongs to someone else
    #[error("failed validating IPAMClaim {0}, wrong IPAMClaim with the same name still exists")]
    IPAMClaimOwnership(String),

    /// A feature gate required by the VMI spec is disabled
    #[error("failed FG validation: {0}")]
    FeatureGate(String),

    /// Interface references a binding plugin missing from the configuration
    #[error("unable to find the network binding plugin '{0}' in Kubevirt configuration")]
    BindingPluginNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

impl ControllerError {
    /// A network asks for persistent IPs while the PersistentIPs gate is off
    pub fn persistent_ips_disabled() -> Self {
        Self::FeatureGate("allowPersistentIPs requested but PersistentIPs is disabled".to_string())
    }
}
