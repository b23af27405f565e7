//! Seams to the control plane's object storage

use crate::Result;
use async_trait::async_trait;
use lb_api::{ExposedService, NodeAddressing, ObjectKey};

#[cfg(test)]
use mockall::automock;

/// Read and compare-and-swap access to Services
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Fetch the latest state of a service; None when it no longer exists
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<ExposedService>>;

    /// Replace the finalizer list
    ///
    /// The patch is conditional on `service.resource_version`; it fails with a
    /// conflict when the object changed since it was read.
    async fn patch_finalizers(&self, service: &ExposedService, finalizers: Vec<String>)
        -> Result<()>;
}

/// Access to the status subresource of Services
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ServiceStatusStore: Send + Sync {
    async fn get_service(&self, key: &ObjectKey) -> Result<Option<ExposedService>>;

    /// Publish `ip` as the only load balancer ingress
    async fn patch_ingress_ip(&self, service: &ExposedService, ip: &str) -> Result<()>;
}

/// Read and compare-and-swap access to Nodes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn get_node(&self, key: &ObjectKey) -> Result<Option<NodeAddressing>>;

    /// Set `spec.podCIDR` and append it to `spec.podCIDRs`, conditional on
    /// `node.resource_version`
    async fn patch_pod_cidr(&self, node: &NodeAddressing, pod_cidr: &str) -> Result<()>;
}

/// Adds `finalizer` if missing. Returns whether a patch was sent.
pub async fn ensure_finalizer(
    store: &dyn ServiceStore,
    service: &ExposedService,
    finalizer: &str,
) -> Result<bool> {
    if service.finalizer_present(finalizer) {
        return Ok(false);
    }

    let mut finalizers = service.finalizers.clone();
    finalizers.push(finalizer.to_string());
    store.patch_finalizers(service, finalizers).await?;
    Ok(true)
}

/// Removes `finalizer` if present. Returns whether a patch was sent.
pub async fn ensure_no_finalizer(
    store: &dyn ServiceStore,
    service: &ExposedService,
    finalizer: &str,
) -> Result<bool> {
    if !service.finalizer_present(finalizer) {
        return Ok(false);
    }

    let finalizers = service
        .finalizers
        .iter()
        .filter(|f| *f != finalizer)
        .cloned()
        .collect();
    store.patch_finalizers(service, finalizers).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_api::ServiceKind;

    fn service(finalizers: &[&str]) -> ExposedService {
        ExposedService {
            key: ObjectKey::namespaced("default", "web"),
            kind: ServiceKind::LoadBalancer,
            address: "2001:db8::5".to_string(),
            deletion_requested: false,
            finalizers: finalizers.iter().map(|f| f.to_string()).collect(),
            resource_version: Some("1".to_string()),
            ingress_ips: vec![],
        }
    }

    #[tokio::test]
    async fn test_ensure_finalizer_appends() {
        let mut store = MockServiceStore::new();
        store
            .expect_patch_finalizers()
            .withf(|_, finalizers| finalizers == &["a.io/x".to_string(), "b.io/y".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let modified = ensure_finalizer(&store, &service(&["a.io/x"]), "b.io/y").await.unwrap();
        assert!(modified);
    }

    #[tokio::test]
    async fn test_ensure_finalizer_already_present() {
        let mut store = MockServiceStore::new();
        store.expect_patch_finalizers().never();

        let modified = ensure_finalizer(&store, &service(&["b.io/y"]), "b.io/y").await.unwrap();
        assert!(!modified);
    }

    #[tokio::test]
    async fn test_ensure_no_finalizer_keeps_others() {
        let mut store = MockServiceStore::new();
        store
            .expect_patch_finalizers()
            .withf(|_, finalizers| finalizers == &["a.io/x".to_string()])
            .times(1)
            .returning(|_, _| Ok(()));

        let modified = ensure_no_finalizer(&store, &service(&["a.io/x", "b.io/y"]), "b.io/y")
            .await
            .unwrap();
        assert!(modified);
    }

    #[tokio::test]
    async fn test_ensure_no_finalizer_absent() {
        let mut store = MockServiceStore::new();
        store.expect_patch_finalizers().never();

        let modified = ensure_no_finalizer(&store, &service(&[]), "b.io/y").await.unwrap();
        assert!(!modified);
    }
}
