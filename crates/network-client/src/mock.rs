//! Mock NetworkClient for unit testing
//!
//! This module provides a mock implementation of `NetworkClientTrait` that can
//! be used in unit tests without a running API server. Objects live in memory
//! keyed by `(namespace, name)`; creating an object whose key is taken fails
//! with `AlreadyExists`, reading a missing one fails with `NotFound`.

use crate::error::NetworkClientError;
use crate::netclient_trait::NetworkClientTrait;
use crds::{
    IPAMClaim, NetworkAttachmentDefinition, NetworkAttachmentDefinitionSpec,
};
use kube::api::ObjectMeta;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock NetworkClient for testing
#[derive(Clone, Default)]
pub struct MockNetworkClient {
    nads: Arc<Mutex<HashMap<Key, NetworkAttachmentDefinition>>>,
    ipam_claims: Arc<Mutex<HashMap<Key, IPAMClaim>>>,
    vmi_annotations: Arc<Mutex<HashMap<Key, BTreeMap<String, String>>>>,
    create_error: Arc<Mutex<Option<String>>>,
    create_calls: Arc<Mutex<usize>>,
    annotate_calls: Arc<Mutex<usize>>,
}

impl MockNetworkClient {
    /// Create an empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a NetworkAttachmentDefinition with the given CNI config (for test setup)
    pub fn add_network_attachment_definition(&self, namespace: &str, name: &str, config: &str) {
        let nad = NetworkAttachmentDefinition {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            spec: NetworkAttachmentDefinitionSpec {
                config: config.to_string(),
            },
        };
        lock(&self.nads).insert(key(namespace, name), nad);
    }

    /// Store an IPAMClaim as if it had been created earlier (for test setup)
    pub fn add_ipam_claim(&self, claim: IPAMClaim) {
        let namespace = claim.metadata.namespace.clone().unwrap_or_default();
        let name = claim.metadata.name.clone().unwrap_or_default();
        lock(&self.ipam_claims).insert((namespace, name), claim);
    }

    /// Make every subsequent `create_ipam_claim` fail with an API error
    pub fn fail_ipam_claim_creation(&self, message: &str) {
        *lock(&self.create_error) = Some(message.to_string());
    }

    /// IPAMClaims stored in `namespace`, sorted by name
    pub fn list_ipam_claims(&self, namespace: &str) -> Vec<IPAMClaim> {
        let mut claims: Vec<IPAMClaim> = lock(&self.ipam_claims)
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, claim)| claim.clone())
            .collect();
        claims.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        claims
    }

    /// Annotations patched onto the VMI `namespace/name` so far
    pub fn vmi_annotations(&self, namespace: &str, name: &str) -> BTreeMap<String, String> {
        lock(&self.vmi_annotations)
            .get(&key(namespace, name))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `create_ipam_claim` calls, failed ones included
    pub fn create_calls(&self) -> usize {
        *lock(&self.create_calls)
    }

    /// Number of `annotate_virtual_machine_instance` calls
    pub fn annotate_calls(&self) -> usize {
        *lock(&self.annotate_calls)
    }
}

#[async_trait::async_trait]
impl NetworkClientTrait for MockNetworkClient {
    async fn get_network_attachment_definition(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<NetworkAttachmentDefinition, NetworkClientError> {
        lock(&self.nads)
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| NetworkClientError::NotFound(format!("{}/{}", namespace, name)))
    }

    async fn create_ipam_claim(
        &self,
        namespace: &str,
        claim: &IPAMClaim,
    ) -> Result<IPAMClaim, NetworkClientError> {
        *lock(&self.create_calls) += 1;
        if let Some(message) = lock(&self.create_error).clone() {
            return Err(NetworkClientError::Api(message));
        }

        let name = claim.metadata.name.clone().unwrap_or_default();
        let mut claims = lock(&self.ipam_claims);
        if claims.contains_key(&key(namespace, &name)) {
            return Err(NetworkClientError::AlreadyExists(format!("{}/{}", namespace, name)));
        }

        let mut stored = claim.clone();
        stored.metadata.namespace = Some(namespace.to_string());
        claims.insert(key(namespace, &name), stored.clone());
        Ok(stored)
    }

    async fn get_ipam_claim(&self, namespace: &str, name: &str) -> Result<IPAMClaim, NetworkClientError> {
        lock(&self.ipam_claims)
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| NetworkClientError::NotFound(format!("{}/{}", namespace, name)))
    }

    async fn annotate_virtual_machine_instance(
        &self,
        namespace: &str,
        name: &str,
        annotations: &BTreeMap<String, Option<String>>,
    ) -> Result<(), NetworkClientError> {
        *lock(&self.annotate_calls) += 1;
        let mut all = lock(&self.vmi_annotations);
        let current = all.entry(key(namespace, name)).or_default();
        for (annotation, value) in annotations {
            match value {
                Some(value) => {
                    current.insert(annotation.clone(), value.clone());
                }
                None => {
                    current.remove(annotation);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::IPAMClaimSpec;

    fn claim(name: &str) -> IPAMClaim {
        IPAMClaim {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: IPAMClaimSpec {
                network: "net".to_string(),
                interface: "pod0".to_string(),
            },
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_twice_reports_already_exists() {
        let client = MockNetworkClient::new();
        client.create_ipam_claim("ns", &claim("vmi.red")).await.unwrap();

        let err = client.create_ipam_claim("ns", &claim("vmi.red")).await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(client.create_calls(), 2);
        assert_eq!(client.list_ipam_claims("ns").len(), 1);
    }

    #[tokio::test]
    async fn test_missing_objects_report_not_found() {
        let client = MockNetworkClient::new();
        client.add_network_attachment_definition("ns", "red-net", "{}");

        assert!(client.get_network_attachment_definition("ns", "red-net").await.is_ok());
        let err = client.get_network_attachment_definition("other", "red-net").await.unwrap_err();
        assert!(matches!(err, NetworkClientError::NotFound(ref key) if key == "other/red-net"));
        assert!(matches!(
            client.get_ipam_claim("ns", "vmi.red").await.unwrap_err(),
            NetworkClientError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_annotate_merges_and_removes_keys() {
        let client = MockNetworkClient::new();
        let set = BTreeMap::from([
            ("a".to_string(), Some("1".to_string())),
            ("b".to_string(), Some("2".to_string())),
        ]);
        client.annotate_virtual_machine_instance("ns", "vmi", &set).await.unwrap();

        let unset = BTreeMap::from([("a".to_string(), None)]);
        client.annotate_virtual_machine_instance("ns", "vmi", &unset).await.unwrap();

        assert_eq!(
            client.vmi_annotations("ns", "vmi"),
            BTreeMap::from([("b".to_string(), "2".to_string())])
        );
        assert_eq!(client.annotate_calls(), 2);
    }
}
