//! Test utilities for unit testing the pipeline and reconciler
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::config::{ClusterConfig, InterfaceBindingPlugin};
use crds::{
    Interface, Network, NetworkAttachmentDefinition, NetworkAttachmentDefinitionSpec,
    VirtualMachineInstance, VirtualMachineInstanceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use network_client::MockNetworkClient;
use std::collections::BTreeMap;

pub const NAD_NETWORK_NAME: &str = "nad_network_name";
pub const VMI_NAME: &str = "testvmi";
pub const VMI_UID: &str = "vmiUID";

/// CNI config requesting persistent IPs on `NAD_NETWORK_NAME`
pub fn persistent_ips_config() -> String {
    format!(r#"{{"allowPersistentIPs": true, "name": "{}"}}"#, NAD_NETWORK_NAME)
}

/// Helper to create a test NetworkAttachmentDefinition
pub fn create_test_nad(namespace: &str, name: &str, config: &str) -> NetworkAttachmentDefinition {
    NetworkAttachmentDefinition {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: NetworkAttachmentDefinitionSpec {
            config: config.to_string(),
        },
    }
}

/// Helper to create a test VMI
pub fn create_test_vmi(
    namespace: &str,
    name: &str,
    uid: &str,
    networks: Vec<Network>,
    interfaces: Vec<Interface>,
) -> VirtualMachineInstance {
    let mut spec = VirtualMachineInstanceSpec {
        networks,
        ..Default::default()
    };
    spec.domain.devices.interfaces = interfaces;

    VirtualMachineInstance {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(uid.to_string()),
            ..Default::default()
        },
        spec,
    }
}

/// Controller owner reference pointing at a VMI
pub fn vmi_owner_reference(name: &str, uid: &str) -> OwnerReference {
    OwnerReference {
        api_version: "kubevirt.io/v1".to_string(),
        kind: "VirtualMachineInstance".to_string(),
        name: name.to_string(),
        uid: uid.to_string(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Registers a NAD in `namespace` for every Multus network, persistent for
/// the NAD names listed in `persistent`
pub fn create_nads(client: &MockNetworkClient, namespace: &str, networks: &[Network], persistent: &[&str]) {
    for network in networks {
        let Some(multus) = &network.multus else {
            continue;
        };
        let config = if persistent.contains(&multus.network_name.as_str()) {
            persistent_ips_config()
        } else {
            String::new()
        };
        client.add_network_attachment_definition(namespace, &multus.network_name, &config);
    }
}

/// Cluster config with the given gates and binding plugins
pub fn test_cluster_config(
    feature_gates: &[&str],
    plugins: &[(&str, Option<&str>)],
) -> ClusterConfig {
    let plugins = plugins
        .iter()
        .map(|(name, nad)| {
            (
                name.to_string(),
                InterfaceBindingPlugin {
                    network_attachment_definition: nad.map(str::to_string),
                    ..Default::default()
                },
            )
        })
        .collect::<BTreeMap<_, _>>();
    ClusterConfig::new(feature_gates.iter().copied(), plugins)
}
