//! Typed view of a Kubernetes Service as seen by the load balancer

use crate::LOAD_BALANCER_TYPE;
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::fmt;

/// Identity of a watched object: namespace (if any) and name
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster_scoped(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Key of any kube resource
    pub fn of<K: ResourceExt>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace(),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Service type, resolved once when the object is read
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceKind {
    /// Externally reachable; the only kind that gets a route
    LoadBalancer,
    /// Any other service type (ClusterIP, NodePort, ExternalName, ...)
    Other(String),
}

impl ServiceKind {
    pub fn from_type(service_type: Option<&str>) -> Self {
        match service_type {
            Some(LOAD_BALANCER_TYPE) => ServiceKind::LoadBalancer,
            Some(other) => ServiceKind::Other(other.to_string()),
            // The API server defaults an unset type to ClusterIP
            None => ServiceKind::Other("ClusterIP".to_string()),
        }
    }
}

/// The parts of a Service the reconcilers act on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedService {
    pub key: ObjectKey,
    pub kind: ServiceKind,
    /// `spec.clusterIP`; empty when not yet allocated
    pub address: String,
    pub deletion_requested: bool,
    pub finalizers: Vec<String>,
    pub resource_version: Option<String>,
    /// IPs currently published in `status.loadBalancer.ingress`
    pub ingress_ips: Vec<String>,
}

impl ExposedService {
    pub fn from_service(service: &Service) -> Self {
        let spec = service.spec.as_ref();
        let ingress_ips = service
            .status
            .as_ref()
            .and_then(|status| status.load_balancer.as_ref())
            .and_then(|lb| lb.ingress.as_ref())
            .map(|ingress| ingress.iter().filter_map(|i| i.ip.clone()).collect())
            .unwrap_or_default();

        Self {
            key: ObjectKey::of(service),
            kind: ServiceKind::from_type(spec.and_then(|s| s.type_.as_deref())),
            address: spec
                .and_then(|s| s.cluster_ip.clone())
                .unwrap_or_default(),
            deletion_requested: service.metadata.deletion_timestamp.is_some(),
            finalizers: service.finalizers().to_vec(),
            resource_version: service.resource_version(),
            ingress_ips,
        }
    }

    pub fn is_load_balancer(&self) -> bool {
        self.kind == ServiceKind::LoadBalancer
    }

    pub fn finalizer_present(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Cluster address, or None for unallocated and headless services
    pub fn routable_address(&self) -> Option<&str> {
        match self.address.trim() {
            "" | "None" => None,
            address => Some(address),
        }
    }
}
