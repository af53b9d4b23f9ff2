//! NetworkAttachmentDefinition CRD
//!
//! The Multus network definition. The controller only reads it; its `config`
//! is the raw CNI configuration JSON and is parsed on demand.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "k8s.cni.cncf.io",
    version = "v1",
    kind = "NetworkAttachmentDefinition",
    plural = "network-attachment-definitions",
    shortname = "net-attach-def",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAttachmentDefinitionSpec {
    /// CNI configuration as a JSON document; may be empty
    #[serde(default)]
    pub config: String,
}
