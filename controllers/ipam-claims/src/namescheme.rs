//! Pod interface naming.
//!
//! Secondary networks get a pod interface name derived from a hash of their
//! logical name, so names stay within the kernel's 15 character limit no
//! matter how long the logical name is.

use crate::vmispec;
use crds::Network;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Interface name of the pod's primary network
pub const PRIMARY_POD_INTERFACE_NAME: &str = "eth0";

const HASHED_INTERFACE_PREFIX: &str = "pod";
const HASHED_INTERFACE_HASH_LEN: usize = 11;

/// `pod` followed by the first 11 hex digits of SHA-256(`network_name`).
pub fn generate_hashed_interface_name(network_name: &str) -> String {
    let digest = hex::encode(Sha256::digest(network_name.as_bytes()));
    format!("{}{}", HASHED_INTERFACE_PREFIX, &digest[..HASHED_INTERFACE_HASH_LEN])
}

/// Maps every logical network to its pod interface name.
pub fn create_hashed_network_name_scheme(networks: &[Network]) -> BTreeMap<String, String> {
    let mut scheme: BTreeMap<String, String> = vmispec::filter_multus_non_default_networks(networks)
        .into_iter()
        .map(|network| (network.name.clone(), generate_hashed_interface_name(&network.name)))
        .collect();

    if let Some(default_network) = vmispec::lookup_default_network(networks) {
        scheme.insert(default_network.name.clone(), PRIMARY_POD_INTERFACE_NAME.to_string());
    }
    scheme
}
