//! Reconciliation core of the metal load balancer
//!
//! This library provides:
//! - Route lifecycle reconciliation for LoadBalancer services
//! - Pod CIDR assignment for nodes
//! - Load balancer status publication for services
//! - The seams to the control plane and the routing fabric, with a local
//!   route table implementation

pub mod backoff;
pub mod error;
pub mod fabric;
pub mod ipam;
pub mod metrics;
pub mod reconcile;
pub mod route_reconciler;
pub mod route_table;
pub mod service_status;
pub mod store;

pub use backoff::RetryBackoff;
pub use error::{CoreError, Result};
pub use fabric::RouteFabric;
pub use ipam::NodeIpamReconciler;
pub use metrics::ReconcileMetrics;
pub use reconcile::Reconcile;
pub use route_reconciler::{RouteConfig, RouteReconciler};
pub use route_table::LocalRouteTable;
pub use service_status::ServiceStatusReconciler;
pub use store::{NodeStore, ServiceStatusStore, ServiceStore};
