//! Kube-backed stores for Services and Nodes
//!
//! Finalizer and pod CIDR patches are JSON merge patches that carry the
//! resourceVersion the caller read, so the API server rejects them with a
//! 409 Conflict when the object changed in between.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Service};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use lb_api::{ExposedService, NodeAddressing, ObjectKey};
use lb_core::{NodeStore, Result, ServiceStatusStore, ServiceStore};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Merge patch body for `metadata`, conditional on `resource_version` when known
fn metadata_patch(resource_version: Option<&str>, mut metadata: Map<String, Value>) -> Value {
    if let Some(version) = resource_version {
        metadata.insert("resourceVersion".to_string(), json!(version));
    }
    json!({ "metadata": metadata })
}

pub fn finalizer_patch(service: &ExposedService, finalizers: &[String]) -> Value {
    let mut metadata = Map::new();
    metadata.insert("finalizers".to_string(), json!(finalizers));
    metadata_patch(service.resource_version.as_deref(), metadata)
}

pub fn ingress_patch(ip: &str) -> Value {
    json!({
        "status": {
            "loadBalancer": {
                "ingress": [{ "ip": ip }]
            }
        }
    })
}

pub fn pod_cidr_patch(node: &NodeAddressing, pod_cidr: &str) -> Value {
    let mut pod_cidrs = node.pod_cidrs.clone();
    pod_cidrs.push(pod_cidr.to_string());

    let mut patch = metadata_patch(node.resource_version.as_deref(), Map::new());
    patch["spec"] = json!({
        "podCIDR": pod_cidr,
        "podCIDRs": pod_cidrs,
    });
    patch
}

/// Services through the Kubernetes API
pub struct KubeServiceStore {
    client: Client,
}

impl KubeServiceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, key: &ObjectKey) -> Api<Service> {
        match &key.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::default_namespaced(self.client.clone()),
        }
    }

    async fn fetch(&self, key: &ObjectKey) -> Result<Option<ExposedService>> {
        let service = self.api(key).get_opt(&key.name).await?;
        Ok(service.as_ref().map(ExposedService::from_service))
    }
}

#[async_trait]
impl ServiceStore for KubeServiceStore {
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<ExposedService>> {
        self.fetch(key).await
    }

    async fn patch_finalizers(
        &self,
        service: &ExposedService,
        finalizers: Vec<String>,
    ) -> Result<()> {
        let patch = finalizer_patch(service, &finalizers);
        self.api(&service.key)
            .patch(&service.key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!(service = %service.key, ?finalizers, "Patched finalizers");
        Ok(())
    }
}

#[async_trait]
impl ServiceStatusStore for KubeServiceStore {
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<ExposedService>> {
        self.fetch(key).await
    }

    async fn patch_ingress_ip(&self, service: &ExposedService, ip: &str) -> Result<()> {
        let patch = ingress_patch(ip);
        self.api(&service.key)
            .patch_status(&service.key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Nodes through the Kubernetes API
pub struct KubeNodeStore {
    client: Client,
}

impl KubeNodeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NodeStore for KubeNodeStore {
    async fn get_node(&self, key: &ObjectKey) -> Result<Option<NodeAddressing>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let node = nodes.get_opt(&key.name).await?;
        Ok(node.as_ref().map(NodeAddressing::from_node))
    }

    async fn patch_pod_cidr(&self, node: &NodeAddressing, pod_cidr: &str) -> Result<()> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let patch = pod_cidr_patch(node, pod_cidr);
        nodes
            .patch(&node.key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_api::ServiceKind;

    fn service(resource_version: Option<&str>) -> ExposedService {
        ExposedService {
            key: ObjectKey::namespaced("default", "web"),
            kind: ServiceKind::LoadBalancer,
            address: "2001:db8::5".to_string(),
            deletion_requested: false,
            finalizers: vec![],
            resource_version: resource_version.map(str::to_string),
            ingress_ips: vec![],
        }
    }

    #[test]
    fn test_finalizer_patch_carries_resource_version() {
        let finalizers = vec!["metal-loadbalancer.ironcore.dev/service".to_string()];
        let patch = finalizer_patch(&service(Some("12")), &finalizers);
        assert_eq!(
            patch,
            json!({
                "metadata": {
                    "finalizers": ["metal-loadbalancer.ironcore.dev/service"],
                    "resourceVersion": "12"
                }
            })
        );
    }

    #[test]
    fn test_finalizer_patch_can_clear_list() {
        let patch = finalizer_patch(&service(None), &[]);
        assert_eq!(patch, json!({ "metadata": { "finalizers": [] } }));
    }

    #[test]
    fn test_ingress_patch() {
        assert_eq!(
            ingress_patch("fd00::2:5"),
            json!({ "status": { "loadBalancer": { "ingress": [{ "ip": "fd00::2:5" }] } } })
        );
    }

    #[test]
    fn test_pod_cidr_patch_appends() {
        let node = NodeAddressing {
            key: ObjectKey::cluster_scoped("node-1"),
            pod_cidr: String::new(),
            pod_cidrs: vec![],
            internal_ip: Some("1a10:c0de::1".to_string()),
            resource_version: Some("9".to_string()),
        };
        assert_eq!(
            pod_cidr_patch(&node, "1a10:c0de::/64"),
            json!({
                "metadata": { "resourceVersion": "9" },
                "spec": {
                    "podCIDR": "1a10:c0de::/64",
                    "podCIDRs": ["1a10:c0de::/64"]
                }
            })
        );
    }
}
