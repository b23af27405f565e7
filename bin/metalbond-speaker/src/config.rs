//! Speaker configuration from the environment

use lb_api::{node_finalizer, Vni};
use lb_core::RouteConfig;
use lb_runtime::config::{self, invalid, optional, required, ConfigError, Lookup};
use lb_runtime::ControllerSettings;
use std::net::{IpAddr, SocketAddr};

#[derive(Clone, Debug)]
pub struct SpeakerConfig {
    pub route: RouteConfig,
    pub controller: ControllerSettings,
    pub metrics_addr: SocketAddr,
}

impl SpeakerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&config::env)
    }

    /// `NODE_ADDRESS` and `VNI` are required; `SERVICE_FINALIZER` defaults to
    /// a finalizer derived from the node address, unique per speaker
    pub fn from_lookup(lookup: &impl Lookup) -> Result<Self, ConfigError> {
        let node_address: IpAddr = required(lookup, "NODE_ADDRESS")?;
        let vni: u32 = required(lookup, "VNI")?;
        let finalizer: String =
            optional(lookup, "SERVICE_FINALIZER", node_finalizer(node_address))?;
        if !finalizer.contains('/') {
            return Err(invalid(
                "SERVICE_FINALIZER",
                &finalizer,
                "must be a domain-qualified name like example.com/name",
            ));
        }

        Ok(Self {
            route: RouteConfig {
                node_address,
                vni: Vni(vni),
                finalizer,
            },
            controller: ControllerSettings::from_lookup(lookup)?,
            metrics_addr: config::metrics_addr(lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_minimal_config() {
        let config =
            SpeakerConfig::from_lookup(&lookup(&[("NODE_ADDRESS", "2001:db8::1"), ("VNI", "50")]))
                .unwrap();
        assert_eq!(config.route.node_address, "2001:db8::1".parse::<IpAddr>().unwrap());
        assert_eq!(config.route.vni, Vni(50));
        assert_eq!(
            config.route.finalizer,
            node_finalizer("2001:db8::1".parse().unwrap())
        );
        assert_eq!(config.controller.concurrency, 4);
    }

    #[test]
    fn test_default_finalizer_differs_per_node() {
        let a = SpeakerConfig::from_lookup(&lookup(&[("NODE_ADDRESS", "2001:db8::1"), ("VNI", "50")]))
            .unwrap();
        let b = SpeakerConfig::from_lookup(&lookup(&[("NODE_ADDRESS", "2001:db8::2"), ("VNI", "50")]))
            .unwrap();
        assert_ne!(a.route.finalizer, b.route.finalizer);
    }

    #[test]
    fn test_custom_finalizer() {
        let config = SpeakerConfig::from_lookup(&lookup(&[
            ("NODE_ADDRESS", "2001:db8::1"),
            ("VNI", "50"),
            ("SERVICE_FINALIZER", "metal-loadbalancer.ironcore.dev/node-a"),
        ]))
        .unwrap();
        assert_eq!(config.route.finalizer, "metal-loadbalancer.ironcore.dev/node-a");
    }

    #[test]
    fn test_missing_node_address() {
        let result = SpeakerConfig::from_lookup(&lookup(&[("VNI", "50")]));
        assert!(matches!(result, Err(ConfigError::Missing("NODE_ADDRESS"))));
    }

    #[test]
    fn test_invalid_vni() {
        let result =
            SpeakerConfig::from_lookup(&lookup(&[("NODE_ADDRESS", "2001:db8::1"), ("VNI", "-1")]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "VNI", .. })));
    }

    #[test]
    fn test_unqualified_finalizer_rejected() {
        let result = SpeakerConfig::from_lookup(&lookup(&[
            ("NODE_ADDRESS", "2001:db8::1"),
            ("VNI", "50"),
            ("SERVICE_FINALIZER", "cleanup"),
        ]));
        assert!(result.is_err());
    }
}
