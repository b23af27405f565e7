//! Keeps fabric routes in step with LoadBalancer services
//!
//! Every invocation classifies the freshly read service and acts on the
//! result alone:
//! - eligible (live LoadBalancer): attach the finalizer, then announce the
//!   host route unless the fabric already has it
//! - tombstoned (deletion requested): withdraw the route, then release the
//!   finalizer so the API server can drop the object
//! - ineligible (any other live service): nothing
//!
//! A patch that changed the object ends the invocation; the resulting watch
//! event drives the next step.

use crate::store::{ensure_finalizer, ensure_no_finalizer};
use crate::{CoreError, Reconcile, ReconcileMetrics, Result, RouteFabric, ServiceStore};
use async_trait::async_trait;
use lb_api::{Destination, ExposedService, NextHop, ObjectKey, Route, Vni};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Node-wide settings for the routes this speaker owns
#[derive(Clone, Debug)]
pub struct RouteConfig {
    /// Underlay address of this node, used as next hop
    pub node_address: IpAddr,
    pub vni: Vni,
    pub finalizer: String,
}

/// What a service currently asks of the reconciler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Tombstoned,
    Ineligible,
    Eligible,
}

pub fn classify(service: &ExposedService) -> ServiceState {
    if service.deletion_requested {
        ServiceState::Tombstoned
    } else if service.is_load_balancer() {
        ServiceState::Eligible
    } else {
        ServiceState::Ineligible
    }
}

pub struct RouteReconciler {
    store: Arc<dyn ServiceStore>,
    fabric: Arc<dyn RouteFabric>,
    config: RouteConfig,
    metrics: ReconcileMetrics,
}

impl RouteReconciler {
    pub fn new(
        store: Arc<dyn ServiceStore>,
        fabric: Arc<dyn RouteFabric>,
        config: RouteConfig,
        metrics: ReconcileMetrics,
    ) -> Self {
        Self {
            store,
            fabric,
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Host route for a cluster address, pointing at this node
    pub fn route_for(&self, address: &str) -> Result<Route> {
        let ip: IpAddr = address
            .trim()
            .parse()
            .map_err(|e| CoreError::invalid_address(address, e))?;
        let IpAddr::V6(ip) = ip else {
            return Err(CoreError::UnsupportedAddressFamily(address.to_string()));
        };

        Ok(Route {
            vni: self.config.vni,
            destination: Destination::host(ip),
            next_hop: NextHop::standard(self.config.node_address, self.config.vni),
        })
    }

    /// Converge one already-fetched service
    pub async fn reconcile_service(&self, service: &ExposedService) -> Result<()> {
        match classify(service) {
            ServiceState::Tombstoned => self.reconcile_deleted(service).await,
            ServiceState::Eligible => self.reconcile_exposed(service).await,
            ServiceState::Ineligible => {
                debug!(kind = ?service.kind, "Service is not a LoadBalancer, skipping");
                Ok(())
            }
        }
    }

    async fn reconcile_exposed(&self, service: &ExposedService) -> Result<()> {
        let Some(address) = service.routable_address() else {
            debug!("Service has no cluster IP yet");
            return Ok(());
        };
        let route = self.route_for(address)?;

        if ensure_finalizer(self.store.as_ref(), service, &self.config.finalizer).await? {
            self.metrics
                .finalizer_patches_total
                .with_label_values(&["add"])
                .inc();
            debug!(finalizer = %self.config.finalizer, "Added finalizer");
            return Ok(());
        }

        let announced = self
            .fabric
            .is_route_announced(route.vni, &route.destination, &route.next_hop)
            .await?;
        if announced {
            debug!(%route, "Route already announced");
            return Ok(());
        }

        self.fabric
            .announce_route(route.vni, &route.destination, &route.next_hop)
            .await?;
        self.metrics.routes_announced_total.inc();
        info!(%route, "Announced route");
        Ok(())
    }

    async fn reconcile_deleted(&self, service: &ExposedService) -> Result<()> {
        let finalizer = &self.config.finalizer;
        if !service.is_load_balancer() && !service.finalizer_present(finalizer) {
            debug!("Deleted service was never managed, skipping");
            return Ok(());
        }

        match service.routable_address().map(|address| self.route_for(address)) {
            Some(Ok(route)) => {
                self.fabric
                    .withdraw_route(route.vni, &route.destination, &route.next_hop)
                    .await?;
                self.metrics.routes_withdrawn_total.inc();
                info!(%route, "Withdrew route");
            }
            Some(Err(error)) => {
                // A route is never announced for an address that does not parse
                warn!(%error, "Deleted service has no routable address, nothing to withdraw");
            }
            None => debug!("Deleted service has no cluster IP, nothing to withdraw"),
        }

        if ensure_no_finalizer(self.store.as_ref(), service, finalizer).await? {
            self.metrics
                .finalizer_patches_total
                .with_label_values(&["remove"])
                .inc();
            debug!(%finalizer, "Removed finalizer");
        }
        Ok(())
    }
}

#[async_trait]
impl Reconcile for RouteReconciler {
    fn name(&self) -> &'static str {
        "service-route"
    }

    #[instrument(skip(self), fields(service = %key))]
    async fn reconcile(&self, key: &ObjectKey) -> Result<()> {
        match self.store.get_service(key).await? {
            Some(service) => self.reconcile_service(&service).await,
            None => {
                debug!("Service no longer exists");
                Ok(())
            }
        }
    }
}
