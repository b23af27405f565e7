//! Typed views and routing vocabulary for the metal load balancer
//!
//! This library defines the types shared by the speaker and the controller:
//! - ExposedService: the typed view of a Kubernetes Service
//! - NodeAddressing: the typed view of a Node's pod CIDR assignment
//! - Route, Destination, NextHop: entries of the overlay routing fabric

pub mod node;
pub mod route;
pub mod service;

pub use node::NodeAddressing;
pub use route::{Destination, IpVersion, NextHop, NextHopType, Route, Vni};
pub use service::{ExposedService, ObjectKey, ServiceKind};

use std::net::IpAddr;

/// Finalizer attached to LoadBalancer services while a route is owned for them
pub const SERVICE_FINALIZER: &str = "metal-loadbalancer.ironcore.dev/service";

/// Service type that triggers route management
pub const LOAD_BALANCER_TYPE: &str = "LoadBalancer";

/// Node address type used for pod CIDR assignment
pub const NODE_INTERNAL_IP: &str = "InternalIP";

/// Finalizer owned by the speaker whose next hop is `node_address`
///
/// Every node announces its own route for a service, so each one holds a
/// separate claim and releases it only after withdrawing that route. The
/// address is hex encoded to stay within the qualified-name charset.
pub fn node_finalizer(node_address: IpAddr) -> String {
    let suffix = match node_address {
        IpAddr::V4(ip) => format!("{:08x}", u32::from(ip)),
        IpAddr::V6(ip) => format!("{:032x}", u128::from(ip)),
    };
    format!("{SERVICE_FINALIZER}-{suffix}")
}
