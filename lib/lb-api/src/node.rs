//! Typed view of a Node's pod CIDR assignment

use crate::{ObjectKey, NODE_INTERNAL_IP};
use k8s_openapi::api::core::v1::Node;
use kube::ResourceExt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeAddressing {
    pub key: ObjectKey,
    /// `spec.podCIDR`; empty when unassigned
    pub pod_cidr: String,
    pub pod_cidrs: Vec<String>,
    /// First address of type InternalIP in `status.addresses`
    pub internal_ip: Option<String>,
    pub resource_version: Option<String>,
}

impl NodeAddressing {
    pub fn from_node(node: &Node) -> Self {
        let spec = node.spec.as_ref();
        let internal_ip = node
            .status
            .as_ref()
            .and_then(|status| status.addresses.as_ref())
            .and_then(|addresses| {
                addresses
                    .iter()
                    .find(|addr| addr.type_ == NODE_INTERNAL_IP)
                    .map(|addr| addr.address.clone())
            });

        Self {
            key: ObjectKey::cluster_scoped(node.name_any()),
            pod_cidr: spec.and_then(|s| s.pod_cidr.clone()).unwrap_or_default(),
            pod_cidrs: spec.and_then(|s| s.pod_cidrs.clone()).unwrap_or_default(),
            internal_ip,
            resource_version: node.resource_version(),
        }
    }

    pub fn has_pod_cidr(&self) -> bool {
        !self.pod_cidr.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{NodeAddress, NodeSpec, NodeStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_picks_first_internal_ip() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("node-1".to_string()),
                ..Default::default()
            },
            spec: Some(NodeSpec::default()),
            status: Some(NodeStatus {
                addresses: Some(vec![
                    NodeAddress {
                        type_: "Hostname".to_string(),
                        address: "node-1".to_string(),
                    },
                    NodeAddress {
                        type_: "InternalIP".to_string(),
                        address: "1a10:c0de::1".to_string(),
                    },
                    NodeAddress {
                        type_: "InternalIP".to_string(),
                        address: "1a10:c0de::2".to_string(),
                    },
                ]),
                ..Default::default()
            }),
        };

        let view = NodeAddressing::from_node(&node);
        assert_eq!(view.key, ObjectKey::cluster_scoped("node-1"));
        assert_eq!(view.internal_ip.as_deref(), Some("1a10:c0de::1"));
        assert!(!view.has_pod_cidr());
        assert!(view.pod_cidrs.is_empty());
    }
}
