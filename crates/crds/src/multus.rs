//! Multus annotation payloads
//!
//! Plain serde types for the JSON carried in the Multus pod annotations.
//! These are not Kubernetes resources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pod annotation selecting the secondary networks to attach
pub const NETWORK_ATTACHMENT_ANNOT: &str = "k8s.v1.cni.cncf.io/networks";

/// Pod annotation overriding the cluster default network
pub const MULTUS_DEFAULT_NETWORK_CNI_ANNOTATION: &str = "v1.multus-cni.io/default-network";

/// One element of the `k8s.v1.cni.cncf.io/networks` list.
///
/// Field order matches the serialized key order Multus documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkSelectionElement {
    /// NetworkAttachmentDefinition name
    pub name: String,

    /// NetworkAttachmentDefinition namespace
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(rename = "ips", default, skip_serializing_if = "Vec::is_empty")]
    pub ip_request: Vec<String>,

    #[serde(rename = "mac", default, skip_serializing_if = "String::is_empty")]
    pub mac_request: String,

    /// Requested pod interface name
    #[serde(rename = "interface", default, skip_serializing_if = "String::is_empty")]
    pub interface_request: String,

    #[serde(rename = "cni-args", default, skip_serializing_if = "Option::is_none")]
    pub cni_args: Option<BTreeMap<String, serde_json::Value>>,

    #[serde(rename = "ipam-claim-reference", default, skip_serializing_if = "String::is_empty")]
    pub ipam_claim_reference: String,
}
