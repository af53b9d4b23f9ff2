//! VMI spec helpers.
//!
//! Lookups and filters over the interfaces and networks declared in a VMI
//! spec.

use crate::error::ControllerError;
use crds::{Interface, Network};

pub fn is_secondary_multus_network(network: &Network) -> bool {
    network.multus.as_ref().is_some_and(|multus| !multus.default)
}

pub fn filter_multus_non_default_networks<'a, I>(networks: I) -> Vec<&'a Network>
where
    I: IntoIterator<Item = &'a Network>,
{
    networks
        .into_iter()
        .filter(|network| is_secondary_multus_network(network))
        .collect()
}

/// Keeps the networks backed by an interface that is not `absent`.
///
/// Networks without a matching interface are dropped as well. Declaration
/// order of `networks` is preserved.
pub fn filter_non_absent_networks<'a>(interfaces: &[Interface], networks: &'a [Network]) -> Vec<&'a Network> {
    networks
        .iter()
        .filter(|network| {
            lookup_interface_by_name(interfaces, &network.name).is_some_and(|iface| !iface.is_absent())
        })
        .collect()
}

pub fn lookup_interface_by_name<'a>(interfaces: &'a [Interface], name: &str) -> Option<&'a Interface> {
    interfaces.iter().find(|iface| iface.name == name)
}

/// The network that backs the pod's primary interface: either the pod
/// network or a Multus network flagged `default`.
pub fn lookup_default_network<'a, I>(networks: I) -> Option<&'a Network>
where
    I: IntoIterator<Item = &'a Network>,
{
    networks
        .into_iter()
        .find(|network| !is_secondary_multus_network(network))
}

/// Splits a `[namespace/]name` NAD reference.
///
/// Unqualified names resolve in `namespace`, which must then be non-empty.
pub fn get_namespace_and_network_name<'a>(
    namespace: &'a str,
    full_network_name: &'a str,
) -> Result<(&'a str, &'a str), ControllerError> {
    if let Some((ns, name)) = full_network_name.split_once('/') {
        return Ok((ns, name));
    }
    if namespace.is_empty() {
        return Err(ControllerError::InvalidConfig(format!(
            "cannot resolve network {}: namespace is empty",
            full_network_name
        )));
    }
    Ok((namespace, full_network_name))
}
