//! IPAMClaim derivation and creation.
//!
//! For every non-absent secondary Multus network whose NAD allows persistent
//! IPs, an IPAMClaim named `<vmi>.<network>` is created in the VMI namespace
//! and owned by the VMI's owner. Creation is idempotent: when the claim
//! already exists it is accepted only if it has the same single owner.

use crate::error::ControllerError;
use crate::{namescheme, netconf, vmispec};
use crds::{IPAMClaim, IPAMClaimSpec, Interface, Network, NetworkAttachmentDefinition};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use network_client::NetworkClientTrait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Claim parameters derived for one logical network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IPAMClaimParams {
    /// `<vmiName>.<logicalNetworkName>`
    pub claim_name: String,
    /// Network name from the NAD config
    pub network_name: String,
}

/// Logical network name to its claim parameters
pub type NetworkToIPAMClaimParams = BTreeMap<String, IPAMClaimParams>;

/// Creates and validates IPAMClaims for VMIs.
pub struct IPAMClaimsManager {
    client: Arc<dyn NetworkClientTrait>,
}

impl IPAMClaimsManager {
    pub fn new(client: Arc<dyn NetworkClientTrait>) -> Self {
        Self { client }
    }

    /// Ensures an IPAMClaim exists for every persistent-IP network of the VMI.
    ///
    /// Returns the claim parameters per logical network so callers can
    /// reference the claims from the Multus annotation.
    pub async fn create_ipam_claims(
        &self,
        namespace: &str,
        vmi_name: &str,
        interfaces: &[Interface],
        networks: &[Network],
        owner_ref: &OwnerReference,
    ) -> Result<NetworkToIPAMClaimParams, ControllerError> {
        let non_absent_networks = vmispec::filter_non_absent_networks(interfaces, networks);
        let secondary_networks = vmispec::filter_multus_non_default_networks(non_absent_networks);
        let params = self
            .get_network_to_ipam_claim_params(namespace, vmi_name, &secondary_networks)
            .await?;

        let claims = compose_ipam_claims(namespace, owner_ref, &params);
        self.create_claims(namespace, &owner_ref.uid, &claims)
            .await
            .map_err(|e| match e {
                ControllerError::IPAMClaimCreation(reason) => ControllerError::IPAMClaimCreation(
                    format!("VMI {}/{}: {}", namespace, vmi_name, reason),
                ),
                other => other,
            })?;

        Ok(params)
    }

    /// Looks up the NAD of every given network and derives claim parameters
    /// for the ones that allow persistent IPs.
    pub async fn get_network_to_ipam_claim_params(
        &self,
        namespace: &str,
        vmi_name: &str,
        secondary_networks: &[&Network],
    ) -> Result<NetworkToIPAMClaimParams, ControllerError> {
        let nads =
            get_network_attachment_definitions_by_name(self.client.as_ref(), namespace, secondary_networks).await?;
        extract_network_to_ipam_claim_params(&nads, vmi_name)
    }

    async fn create_claims(
        &self,
        namespace: &str,
        owner_uid: &str,
        claims: &[IPAMClaim],
    ) -> Result<(), ControllerError> {
        for claim in claims {
            let claim_name = claim.metadata.name.as_deref().unwrap_or_default();
            match self.client.create_ipam_claim(namespace, claim).await {
                Ok(_) => {
                    info!("Created IPAMClaim {}/{}", namespace, claim_name);
                }
                Err(e) if e.is_already_exists() => {
                    debug!("IPAMClaim {}/{} already exists, validating owner", namespace, claim_name);
                    self.ensure_valid_ipam_claim_for_vmi(namespace, claim_name, owner_uid)
                        .await?;
                }
                Err(e) => {
                    return Err(ControllerError::IPAMClaimCreation(format!(
                        "failed to create IPAMClaim {}/{}: {}",
                        namespace, claim_name, e
                    )));
                }
            }
        }
        Ok(())
    }

    /// An existing claim must have exactly one owner with the expected UID;
    /// anything else is a leftover of a deleted VM/VMI with the same name.
    async fn ensure_valid_ipam_claim_for_vmi(
        &self,
        namespace: &str,
        claim_name: &str,
        expected_owner_uid: &str,
    ) -> Result<(), ControllerError> {
        let current = self
            .client
            .get_ipam_claim(namespace, claim_name)
            .await
            .map_err(|e| {
                ControllerError::IPAMClaimCreation(format!(
                    "failed getting IPAMClaim {}/{}: {}",
                    namespace, claim_name, e
                ))
            })?;

        match current.metadata.owner_references.as_deref() {
            Some([owner]) if owner.uid == expected_owner_uid => Ok(()),
            _ => Err(ControllerError::IPAMClaimOwnership(format!("{}/{}", namespace, claim_name))),
        }
    }
}

/// Fetches the NAD behind each network, keyed by logical network name.
pub async fn get_network_attachment_definitions_by_name(
    client: &dyn NetworkClientTrait,
    namespace: &str,
    networks: &[&Network],
) -> Result<BTreeMap<String, NetworkAttachmentDefinition>, ControllerError> {
    let mut nads = BTreeMap::new();
    for network in networks {
        let Some(multus) = &network.multus else {
            continue;
        };
        let (nad_namespace, nad_name) = vmispec::get_namespace_and_network_name(namespace, &multus.network_name)?;
        let nad = client
            .get_network_attachment_definition(nad_namespace, nad_name)
            .await
            .map_err(|e| {
                ControllerError::NetworkAttachmentDefinitionNotFound(format!(
                    "{}/{}: {}",
                    nad_namespace, nad_name, e
                ))
            })?;
        nads.insert(network.name.clone(), nad);
    }
    Ok(nads)
}

/// Whether `network` is a secondary Multus network whose NAD allows
/// persistent IPs.
pub async fn persistent_ip_network(
    client: &dyn NetworkClientTrait,
    namespace: &str,
    network: &Network,
) -> Result<bool, ControllerError> {
    if !vmispec::is_secondary_multus_network(network) {
        return Ok(false);
    }
    let nads = get_network_attachment_definitions_by_name(client, namespace, &[network]).await?;
    match nads.get(&network.name) {
        Some(nad) => Ok(netconf::persistent_ips_conf(nad)?.allow_persistent_ips),
        None => Ok(false),
    }
}

/// Derives claim parameters from NADs keyed by logical network name.
pub fn extract_network_to_ipam_claim_params(
    nads: &BTreeMap<String, NetworkAttachmentDefinition>,
    vmi_name: &str,
) -> Result<NetworkToIPAMClaimParams, ControllerError> {
    let mut params = NetworkToIPAMClaimParams::new();
    for (logical_name, nad) in nads {
        if let Some(network_name) = netconf::persistent_ips_network_name(nad)? {
            params.insert(
                logical_name.clone(),
                IPAMClaimParams {
                    claim_name: format!("{}.{}", vmi_name, logical_name),
                    network_name,
                },
            );
        }
    }
    Ok(params)
}

fn compose_ipam_claims(
    namespace: &str,
    owner_ref: &OwnerReference,
    params: &NetworkToIPAMClaimParams,
) -> Vec<IPAMClaim> {
    params
        .iter()
        .map(|(logical_name, claim_params)| {
            compose_ipam_claim(
                namespace,
                owner_ref,
                claim_params,
                namescheme::generate_hashed_interface_name(logical_name),
            )
        })
        .collect()
}

fn compose_ipam_claim(
    namespace: &str,
    owner_ref: &OwnerReference,
    params: &IPAMClaimParams,
    interface_name: String,
) -> IPAMClaim {
    IPAMClaim {
        metadata: ObjectMeta {
            name: Some(params.claim_name.clone()),
            namespace: Some(namespace.to_string()),
            owner_references: Some(vec![owner_ref.clone()]),
            ..Default::default()
        },
        spec: IPAMClaimSpec {
            network: params.network_name.clone(),
            interface: interface_name,
        },
        status: None,
    }
}

#[cfg(test)]
#[path = "ipam_claims_test.rs"]
mod ipam_claims_test;
