//! IPAMClaim CRD
//!
//! Records a persistent IP allocation for one secondary network interface of
//! a VMI. The IPAM plugin fills in `status.ips`; the controller only creates
//! claims and checks who owns them.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "k8s.cni.cncf.io",
    version = "v1alpha1",
    kind = "IPAMClaim",
    plural = "ipamclaims",
    namespaced,
    status = "IPAMClaimStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct IPAMClaimSpec {
    /// Network name as declared in the NAD config `name` field
    pub network: String,

    /// Pod interface name the claim is bound to
    pub interface: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IPAMClaimStatus {
    /// IPs allocated for the claim, in CIDR notation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,
}
