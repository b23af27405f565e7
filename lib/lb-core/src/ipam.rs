//! Pod CIDR assignment for nodes

use crate::{CoreError, NodeStore, Reconcile, Result};
use async_trait::async_trait;
use ipnetwork::IpNetwork;
use lb_api::ObjectKey;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Network of `address` with all host bits cleared
pub fn pod_cidr_for(address: &str, mask_size: u8) -> Result<IpNetwork> {
    let ip: IpAddr = address
        .trim()
        .parse()
        .map_err(|e| CoreError::invalid_address(address, e))?;
    let network = IpNetwork::new(ip, mask_size)
        .map_err(|e| CoreError::invalid_address(address, format!("mask /{mask_size}: {e}")))?;
    IpNetwork::new(network.network(), mask_size)
        .map_err(|e| CoreError::invalid_address(address, e))
}

/// Populates `spec.podCIDR` of nodes that have none, once
pub struct NodeIpamReconciler {
    store: Arc<dyn NodeStore>,
    mask_size: u8,
}

impl NodeIpamReconciler {
    pub fn new(store: Arc<dyn NodeStore>, mask_size: u8) -> Self {
        Self { store, mask_size }
    }
}

#[async_trait]
impl Reconcile for NodeIpamReconciler {
    fn name(&self) -> &'static str {
        "node-ipam"
    }

    #[instrument(skip(self), fields(node = %key))]
    async fn reconcile(&self, key: &ObjectKey) -> Result<()> {
        let Some(node) = self.store.get_node(key).await? else {
            debug!("Node no longer exists");
            return Ok(());
        };

        if node.has_pod_cidr() {
            debug!(pod_cidr = %node.pod_cidr, "PodCIDR is already populated");
            return Ok(());
        }

        let Some(internal_ip) = node.internal_ip.as_deref() else {
            debug!("Node has no InternalIP yet");
            return Ok(());
        };

        let pod_cidr = pod_cidr_for(internal_ip, self.mask_size)?.to_string();
        self.store.patch_pod_cidr(&node, &pod_cidr).await?;
        info!(%pod_cidr, "Patched node PodCIDR and PodCIDRs");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockNodeStore;
    use lb_api::NodeAddressing;

    fn node(pod_cidr: &str, internal_ip: Option<&str>) -> NodeAddressing {
        NodeAddressing {
            key: ObjectKey::cluster_scoped("node-1"),
            pod_cidr: pod_cidr.to_string(),
            pod_cidrs: if pod_cidr.is_empty() {
                vec![]
            } else {
                vec![pod_cidr.to_string()]
            },
            internal_ip: internal_ip.map(str::to_string),
            resource_version: Some("7".to_string()),
        }
    }

    #[test]
    fn test_pod_cidr_ipv6() {
        let cidr = pod_cidr_for("1a10:c0de::1", 64).unwrap();
        assert_eq!(cidr.to_string(), "1a10:c0de::/64");
    }

    #[test]
    fn test_pod_cidr_ipv4() {
        let cidr = pod_cidr_for("10.0.1.7", 24).unwrap();
        assert_eq!(cidr.to_string(), "10.0.1.0/24");
    }

    #[test]
    fn test_pod_cidr_rejects_bad_input() {
        assert!(pod_cidr_for("1a10:code::1", 64).is_err());
        assert!(pod_cidr_for("10.0.1.7", 64).is_err());
    }

    #[tokio::test]
    async fn test_assigns_pod_cidr() {
        let mut store = MockNodeStore::new();
        store
            .expect_get_node()
            .returning(|_| Ok(Some(node("", Some("1a10:c0de::1")))));
        store
            .expect_patch_pod_cidr()
            .withf(|_, cidr| cidr == "1a10:c0de::/64")
            .times(1)
            .returning(|_, _| Ok(()));

        let reconciler = NodeIpamReconciler::new(Arc::new(store), 64);
        reconciler
            .reconcile(&ObjectKey::cluster_scoped("node-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_populated_node_is_untouched() {
        let mut store = MockNodeStore::new();
        store
            .expect_get_node()
            .returning(|_| Ok(Some(node("cafe:c0de::/80", Some("1a10:c0de::1")))));
        store.expect_patch_pod_cidr().never();

        let reconciler = NodeIpamReconciler::new(Arc::new(store), 64);
        reconciler
            .reconcile(&ObjectKey::cluster_scoped("node-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_node_without_internal_ip_waits() {
        let mut store = MockNodeStore::new();
        store.expect_get_node().returning(|_| Ok(Some(node("", None))));
        store.expect_patch_pod_cidr().never();

        let reconciler = NodeIpamReconciler::new(Arc::new(store), 64);
        assert!(reconciler
            .reconcile(&ObjectKey::cluster_scoped("node-1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_invalid_internal_ip_is_reported() {
        let mut store = MockNodeStore::new();
        store
            .expect_get_node()
            .returning(|_| Ok(Some(node("", Some("1a10:code::1")))));
        store.expect_patch_pod_cidr().never();

        let reconciler = NodeIpamReconciler::new(Arc::new(store), 64);
        let result = reconciler
            .reconcile(&ObjectKey::cluster_scoped("node-1"))
            .await;
        assert!(matches!(result, Err(CoreError::InvalidAddress { .. })));
    }
}
