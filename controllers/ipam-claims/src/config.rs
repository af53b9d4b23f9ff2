//! Cluster configuration.
//!
//! The subset of the KubeVirt configuration the controller honours: enabled
//! feature gates and the registered network binding plugins. Both are read
//! from the environment at startup.

use crate::error::ControllerError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;

/// Gate enabling persistent IPs (IPAMClaim creation) for secondary networks
pub const PERSISTENT_IPS_GATE: &str = "PersistentIPs";

/// Gate enabling network binding plugins
pub const NETWORK_BINDING_PLUGINS_GATE: &str = "NetworkBindingPlugins";

/// A registered network binding plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceBindingPlugin {
    /// NAD (`[namespace/]name`) the plugin's CNI runs from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_attachment_definition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_attachment_type: Option<String>,
}

/// Feature gates and binding plugins in effect for the cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    feature_gates: BTreeSet<String>,
    binding_plugins: BTreeMap<String, InterfaceBindingPlugin>,
}

impl ClusterConfig {
    pub fn new<I, S>(feature_gates: I, binding_plugins: BTreeMap<String, InterfaceBindingPlugin>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            feature_gates: feature_gates.into_iter().map(Into::into).collect(),
            binding_plugins,
        }
    }

    /// Loads the configuration from the environment.
    ///
    /// - `FEATURE_GATES`: comma separated gate names
    /// - `NETWORK_BINDING_PLUGINS_FILE`: optional YAML map of plugin name to
    ///   plugin settings
    pub fn from_env() -> Result<Self, ControllerError> {
        let feature_gates = env::var("FEATURE_GATES")
            .map(|raw| parse_feature_gates(&raw))
            .unwrap_or_default();

        let binding_plugins = match env::var("NETWORK_BINDING_PLUGINS_FILE") {
            Ok(path) => {
                let raw = fs::read_to_string(&path).map_err(|e| {
                    ControllerError::InvalidConfig(format!(
                        "failed to read network binding plugins from {}: {}",
                        path, e
                    ))
                })?;
                parse_binding_plugins(&raw)?
            }
            Err(_) => BTreeMap::new(),
        };

        Ok(Self::new(feature_gates, binding_plugins))
    }

    pub fn feature_gates(&self) -> impl Iterator<Item = &str> {
        self.feature_gates.iter().map(String::as_str)
    }

    pub fn binding_plugin_names(&self) -> impl Iterator<Item = &str> {
        self.binding_plugins.keys().map(String::as_str)
    }

    pub fn persistent_ips_enabled(&self) -> bool {
        self.feature_gates.contains(PERSISTENT_IPS_GATE)
    }

    pub fn network_binding_plugins_enabled(&self) -> bool {
        self.feature_gates.contains(NETWORK_BINDING_PLUGINS_GATE)
    }

    pub fn binding_plugin(&self, name: &str) -> Option<&InterfaceBindingPlugin> {
        self.binding_plugins.get(name)
    }
}

fn parse_feature_gates(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|gate| !gate.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_binding_plugins(raw: &str) -> Result<BTreeMap<String, InterfaceBindingPlugin>, ControllerError> {
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(raw).map_err(|e| {
        ControllerError::InvalidConfig(format!("invalid network binding plugins: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_gates() {
        let gates = parse_feature_gates(" PersistentIPs, ,NetworkBindingPlugins,");
        let config = ClusterConfig::new(gates, BTreeMap::new());
        assert!(config.persistent_ips_enabled());
        assert!(config.network_binding_plugins_enabled());
        assert_eq!(config.feature_gates().count(), 2);
    }

    #[test]
    fn test_no_feature_gates() {
        let config = ClusterConfig::new(parse_feature_gates(""), BTreeMap::new());
        assert!(!config.persistent_ips_enabled());
        assert!(!config.network_binding_plugins_enabled());
    }

    #[test]
    fn test_parse_binding_plugins() {
        let plugins = parse_binding_plugins(
            r#"
passt:
  sidecarImage: quay.io/kubevirt/network-passt-binding:v1.3.0
  networkAttachmentDefinition: default/netbindingpasst
macvtap:
  domainAttachmentType: tap
"#,
        )
        .unwrap();

        assert_eq!(plugins.len(), 2);
        assert_eq!(
            plugins["passt"].network_attachment_definition.as_deref(),
            Some("default/netbindingpasst")
        );
        assert_eq!(plugins["macvtap"].network_attachment_definition, None);
        assert_eq!(plugins["macvtap"].domain_attachment_type.as_deref(), Some("tap"));
    }

    #[test]
    fn test_parse_binding_plugins_rejects_garbage() {
        let err = parse_binding_plugins("passt: [unterminated").unwrap_err();
        assert!(matches!(err, ControllerError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_binding_plugins_file() {
        assert!(parse_binding_plugins("\n").unwrap().is_empty());
    }
}
