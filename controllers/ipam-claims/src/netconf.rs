//! NetworkAttachmentDefinition config parsing.
//!
//! Only the two CNI config keys relevant to persistent IPs are read; the rest
//! of the document is ignored.

use crate::error::ControllerError;
use crds::NetworkAttachmentDefinition;
use serde::Deserialize;

const ALLOW_PERSISTENT_IPS_KEY: &str = "allowPersistentIPs";

/// Persistent-IP settings of a NAD's CNI config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NetConf {
    #[serde(rename = "allowPersistentIPs", default)]
    pub allow_persistent_ips: bool,

    #[serde(default)]
    pub name: String,
}

/// Parses the NAD config. An empty config yields the defaults.
///
/// `allowPersistentIPs` must be a JSON boolean when present.
pub fn persistent_ips_conf(nad: &NetworkAttachmentDefinition) -> Result<NetConf, ControllerError> {
    if nad.spec.config.is_empty() {
        return Ok(NetConf::default());
    }
    let unmarshal_error =
        |e: serde_json::Error| ControllerError::InvalidNetConf(format!("failed to unmarshal NAD spec.config JSON: {}", e));

    let raw: serde_json::Value = serde_json::from_str(&nad.spec.config).map_err(unmarshal_error)?;
    if raw.get(ALLOW_PERSISTENT_IPS_KEY).is_some_and(|value| !value.is_boolean()) {
        return Err(ControllerError::InvalidNetConf(format!(
            "value for key {} is not a boolean",
            ALLOW_PERSISTENT_IPS_KEY
        )));
    }
    serde_json::from_value(raw).map_err(unmarshal_error)
}

/// The network name to claim IPs on, or `None` when the NAD does not allow
/// persistent IPs.
pub fn persistent_ips_network_name(nad: &NetworkAttachmentDefinition) -> Result<Option<String>, ControllerError> {
    let conf = persistent_ips_conf(nad)?;
    if !conf.allow_persistent_ips {
        return Ok(None);
    }
    if conf.name.is_empty() {
        return Err(ControllerError::InvalidNetConf(
            "failed to obtain network name: missing required field".to_string(),
        ));
    }
    Ok(Some(conf.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_nad;

    #[test]
    fn test_empty_config_is_not_persistent() {
        let nad = create_test_nad("ns", "red-net", "");
        assert_eq!(persistent_ips_conf(&nad).unwrap(), NetConf::default());
        assert_eq!(persistent_ips_network_name(&nad).unwrap(), None);
    }

    #[test]
    fn test_persistent_ips_network_name() {
        let nad = create_test_nad(
            "ns",
            "red-net",
            r#"{"cniVersion": "0.4.0", "type": "ovn-k8s-cni-overlay", "allowPersistentIPs": true, "name": "tenantblue"}"#,
        );
        assert_eq!(persistent_ips_network_name(&nad).unwrap().as_deref(), Some("tenantblue"));
    }

    #[test]
    fn test_persistent_ips_disabled() {
        let nad = create_test_nad("ns", "red-net", r#"{"allowPersistentIPs": false, "name": "tenantblue"}"#);
        assert_eq!(persistent_ips_network_name(&nad).unwrap(), None);

        let nad = create_test_nad("ns", "red-net", r#"{"name": "tenantblue"}"#);
        assert_eq!(persistent_ips_network_name(&nad).unwrap(), None);
    }

    #[test]
    fn test_missing_name_with_persistent_ips() {
        let nad = create_test_nad("ns", "red-net", r#"{"allowPersistentIPs": true}"#);
        let err = persistent_ips_network_name(&nad).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed retrieving persistentIPsNetworkName: failed to obtain network name: missing required field"
        );
    }

    #[test]
    fn test_malformed_config() {
        let nad = create_test_nad("ns", "red-net", r#"{"allowPersistentIPs": tru"#);
        let err = persistent_ips_conf(&nad).unwrap_err();
        assert!(err.to_string().contains("failed to unmarshal NAD spec.config JSON"));

    }

    #[test]
    fn test_non_boolean_allow_persistent_ips_rejected() {
        for value in [r#""true""#, "1", "null", r#"{"enabled": true}"#] {
            let config = format!(r#"{{"allowPersistentIPs": {}, "name": "tenantblue"}}"#, value);
            let nad = create_test_nad("ns", "red-net", &config);
            let err = persistent_ips_conf(&nad).unwrap_err();
            assert_eq!(
                err.to_string(),
                "failed retrieving persistentIPsNetworkName: value for key allowPersistentIPs is not a boolean",
                "allowPersistentIPs: {}",
                value
            );
        }
    }

    #[test]
    fn test_config_that_is_not_an_object() {
        let nad = create_test_nad("ns", "red-net", "42");
        let err = persistent_ips_conf(&nad).unwrap_err();
        assert!(err.to_string().contains("failed to unmarshal NAD spec.config JSON"));
    }
}
