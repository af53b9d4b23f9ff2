//! VirtualMachineInstance (subset)
//!
//! Only the network-facing part of the KubeVirt VMI spec is modelled here:
//! the declared interfaces and the networks they attach to. Fields the
//! controller does not read are ignored on deserialization.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachineInstance",
    shortname = "vmi",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceSpec {
    /// Guest domain; only `devices.interfaces` is read
    #[serde(default)]
    pub domain: DomainSpec,

    /// Networks the interfaces attach to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Network>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainSpec {
    #[serde(default)]
    pub devices: Devices,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Devices {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<Interface>,
}

/// A network declared on the VMI.
///
/// `name` is the logical network name; it is unique within the VMI and
/// matches the name of the interface attached to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,

    /// The cluster default pod network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<PodNetwork>,

    /// A Multus network backed by a NetworkAttachmentDefinition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multus: Option<MultusNetwork>,
}

impl Network {
    /// The default pod network, named `default`.
    pub fn default_pod_network() -> Self {
        Self {
            name: "default".to_string(),
            pod: Some(PodNetwork::default()),
            multus: None,
        }
    }

    /// A secondary Multus network referencing `nad_name` (`[namespace/]name`).
    pub fn multus(name: impl Into<String>, nad_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pod: None,
            multus: Some(MultusNetwork {
                network_name: nad_name.into(),
                default: false,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PodNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_network_cidr: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultusNetwork {
    /// NetworkAttachmentDefinition reference, `name` or `namespace/name`
    pub network_name: String,

    /// Replaces the pod network as the default Multus network
    #[serde(default)]
    pub default: bool,
}

/// A NIC declared on the VMI.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<InterfaceBridge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masquerade: Option<InterfaceMasquerade>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sriov: Option<InterfaceSriov>,

    /// Network binding plugin, resolved against the cluster configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<PluginBinding>,

    /// Desired link state; unset means present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<InterfaceState>,
}

impl Interface {
    /// An interface with no binding method, MAC or state.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the interface has been hot-unplugged (state `absent`).
    pub fn is_absent(&self) -> bool {
        self.state == Some(InterfaceState::Absent)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InterfaceBridge {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InterfaceMasquerade {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InterfaceSriov {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PluginBinding {
    pub name: String,
}

/// Interface link state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceState {
    #[default]
    #[serde(alias = "up")]
    Present,
    Down,
    Absent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vmi_spec_deserializes_network_fields() {
        let spec: VirtualMachineInstanceSpec = serde_json::from_value(serde_json::json!({
            "domain": {
                "cpu": {"cores": 2},
                "devices": {
                    "interfaces": [
                        {"name": "default", "masquerade": {}},
                        {"name": "red", "bridge": {}, "macAddress": "02:00:00:00:00:01"},
                        {"name": "blue", "binding": {"name": "passt"}, "state": "absent"}
                    ]
                }
            },
            "networks": [
                {"name": "default", "pod": {}},
                {"name": "red", "multus": {"networkName": "other-ns/red-net"}},
                {"name": "blue", "multus": {"networkName": "blue-net", "default": true}}
            ]
        }))
        .unwrap();

        let ifaces = &spec.domain.devices.interfaces;
        assert_eq!(ifaces.len(), 3);
        assert!(ifaces[0].masquerade.is_some());
        assert_eq!(ifaces[1].mac_address.as_deref(), Some("02:00:00:00:00:01"));
        assert!(ifaces[2].is_absent());
        assert_eq!(ifaces[2].binding.as_ref().map(|b| b.name.as_str()), Some("passt"));

        assert_eq!(spec.networks[0], Network::default_pod_network());
        assert_eq!(spec.networks[1], Network::multus("red", "other-ns/red-net"));
        assert!(spec.networks[2].multus.as_ref().unwrap().default);
    }

    #[test]
    fn test_interface_state_aliases() {
        let up: InterfaceState = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(up, InterfaceState::Present);
        assert!(!Interface::named("red").is_absent());
    }
}
