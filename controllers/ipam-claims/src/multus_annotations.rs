//! Multus annotation rendering
//!
//! Builds the `k8s.v1.cni.cncf.io/networks` selection list for a VMI's
//! launcher pod: one element per secondary Multus network, plus one element
//! per binding plugin that runs its CNI from a NetworkAttachmentDefinition.

use crate::config::ClusterConfig;
use crate::error::ControllerError;
use crate::ipam_claims::NetworkToIPAMClaimParams;
use crate::namescheme;
use crate::vmispec;
use crds::{Interface, Network, NetworkSelectionElement};
use std::collections::BTreeMap;

/// CNI arg carrying the VMI logical network name to a binding plugin
const CNI_ARG_NETWORK_NAME: &str = "logicNetworkName";

/// Ordered list of network selection elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultusNetworkAnnotationPool {
    pool: Vec<NetworkSelectionElement>,
}

impl MultusNetworkAnnotationPool {
    pub fn add(&mut self, element: NetworkSelectionElement) {
        self.pool.push(element);
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// JSON array of the elements, `[]` when the pool is empty
    pub fn to_json_string(&self) -> Result<String, ControllerError> {
        Ok(serde_json::to_string(&self.pool)?)
    }

    /// The element requesting pod interface `pod_interface_name`.
    ///
    /// Binding plugin elements carry no interface request and never match.
    pub fn find_multus_annotation(&mut self, pod_interface_name: &str) -> Option<&mut NetworkSelectionElement> {
        self.pool.iter_mut().find(|element| {
            !element.interface_request.is_empty() && element.interface_request == pod_interface_name
        })
    }

    /// Points the elements of persistent-IP networks at their IPAMClaims.
    pub fn set_ipam_claim_references(
        &mut self,
        network_name_scheme: &BTreeMap<String, String>,
        network_to_ipam_claim_params: &NetworkToIPAMClaimParams,
    ) {
        for (network_name, params) in network_to_ipam_claim_params {
            let Some(pod_interface_name) = network_name_scheme.get(network_name) else {
                continue;
            };
            if let Some(element) = self.find_multus_annotation(pod_interface_name) {
                element.ipam_claim_reference = params.claim_name.clone();
            }
        }
    }
}

/// Renders the Multus networks annotation using the hashed pod interface
/// naming scheme.
///
/// Returns `None` when no element is needed.
pub fn generate_multus_cni_annotation(
    namespace: &str,
    interfaces: &[Interface],
    networks: &[Network],
    network_to_ipam_claim_params: &NetworkToIPAMClaimParams,
    config: &ClusterConfig,
) -> Result<Option<String>, ControllerError> {
    generate_multus_cni_annotation_from_name_scheme(
        namespace,
        interfaces,
        networks,
        &namescheme::create_hashed_network_name_scheme(networks),
        network_to_ipam_claim_params,
        config,
    )
}

pub fn generate_multus_cni_annotation_from_name_scheme(
    namespace: &str,
    interfaces: &[Interface],
    networks: &[Network],
    network_name_scheme: &BTreeMap<String, String>,
    network_to_ipam_claim_params: &NetworkToIPAMClaimParams,
    config: &ClusterConfig,
) -> Result<Option<String>, ControllerError> {
    if !network_to_ipam_claim_params.is_empty() && !config.persistent_ips_enabled() {
        return Err(ControllerError::persistent_ips_disabled());
    }

    let mut pool = MultusNetworkAnnotationPool::default();

    for network in vmispec::filter_non_absent_networks(interfaces, networks) {
        if vmispec::is_secondary_multus_network(network) {
            let pod_interface_name = network_name_scheme
                .get(&network.name)
                .cloned()
                .unwrap_or_default();
            pool.add(new_multus_annotation_data(namespace, interfaces, network, pod_interface_name)?);
        }

        if !config.network_binding_plugins_enabled() {
            continue;
        }
        let plugin_name = vmispec::lookup_interface_by_name(interfaces, &network.name)
            .and_then(|iface| iface.binding.as_ref())
            .map(|binding| binding.name.as_str());
        if let Some(plugin_name) = plugin_name {
            if let Some(element) =
                new_binding_plugin_multus_annotation_data(config, plugin_name, namespace, &network.name)?
            {
                pool.add(element);
            }
        }
    }

    pool.set_ipam_claim_references(network_name_scheme, network_to_ipam_claim_params);

    if pool.is_empty() {
        return Ok(None);
    }
    pool.to_json_string().map(Some)
}

/// Element attaching the pod to a secondary Multus network
pub fn new_multus_annotation_data(
    namespace: &str,
    interfaces: &[Interface],
    network: &Network,
    pod_interface_name: String,
) -> Result<NetworkSelectionElement, ControllerError> {
    let full_network_name = network
        .multus
        .as_ref()
        .map(|multus| multus.network_name.as_str())
        .unwrap_or_default();
    let (nad_namespace, nad_name) = vmispec::get_namespace_and_network_name(namespace, full_network_name)?;
    let mac_request = vmispec::lookup_interface_by_name(interfaces, &network.name)
        .and_then(|iface| iface.mac_address.clone())
        .unwrap_or_default();

    Ok(NetworkSelectionElement {
        name: nad_name.to_string(),
        namespace: nad_namespace.to_string(),
        mac_request,
        interface_request: pod_interface_name,
        ..Default::default()
    })
}

/// Element running a binding plugin's CNI for `network_name`.
///
/// `None` when the plugin is registered without a NAD.
pub fn new_binding_plugin_multus_annotation_data(
    config: &ClusterConfig,
    plugin_name: &str,
    namespace: &str,
    network_name: &str,
) -> Result<Option<NetworkSelectionElement>, ControllerError> {
    let plugin = config
        .binding_plugin(plugin_name)
        .ok_or_else(|| ControllerError::BindingPluginNotFound(plugin_name.to_string()))?;

    let Some(nad) = plugin.network_attachment_definition.as_deref().filter(|nad| !nad.is_empty()) else {
        return Ok(None);
    };
    let (nad_namespace, nad_name) = vmispec::get_namespace_and_network_name(namespace, nad)?;

    Ok(Some(NetworkSelectionElement {
        name: nad_name.to_string(),
        namespace: nad_namespace.to_string(),
        cni_args: Some(BTreeMap::from([(
            CNI_ARG_NETWORK_NAME.to_string(),
            serde_json::Value::from(network_name),
        )])),
        ..Default::default()
    }))
}

/// Value for `v1.multus-cni.io/default-network`: the NAD of the Multus
/// network flagged `default`, if any
pub fn multus_default_network_annotation(networks: &[Network]) -> Option<String> {
    networks
        .iter()
        .filter_map(|network| network.multus.as_ref())
        .find(|multus| multus.default)
        .map(|multus| multus.network_name.clone())
}

#[cfg(test)]
#[path = "multus_annotations_test.rs"]
mod multus_annotations_test;
