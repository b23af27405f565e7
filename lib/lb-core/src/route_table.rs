//! Process-local route table

use crate::{Result, RouteFabric};
use async_trait::async_trait;
use lb_api::{Destination, NextHop, Route, Vni};
use prometheus::IntGauge;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// LocalRouteTable keeps announced routes in memory, per VNI
pub struct LocalRouteTable {
    routes: Arc<RwLock<Routes>>,
    size: Option<IntGauge>,
}

type Routes = HashMap<Vni, HashSet<(Destination, NextHop)>>;

impl LocalRouteTable {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
            size: None,
        }
    }

    /// Keep `gauge` set to the number of held routes
    pub fn with_gauge(mut self, gauge: IntGauge) -> Self {
        gauge.set(0);
        self.size = Some(gauge);
        self
    }

    fn publish_size(&self, routes: &Routes) {
        if let Some(gauge) = &self.size {
            let count: usize = routes.values().map(HashSet::len).sum();
            gauge.set(i64::try_from(count).unwrap_or(i64::MAX));
        }
    }

    /// All announced routes, sorted by VNI
    pub async fn list_routes(&self) -> Vec<Route> {
        let routes = self.routes.read().await;
        let mut listed: Vec<Route> = routes
            .iter()
            .flat_map(|(vni, entries)| {
                entries.iter().map(move |(destination, next_hop)| Route {
                    vni: *vni,
                    destination: *destination,
                    next_hop: *next_hop,
                })
            })
            .collect();
        listed.sort_by_key(|route| (route.vni, route.destination.to_string()));
        listed
    }

    /// Announced routes for one destination, across next hops
    pub async fn routes_for(&self, vni: Vni, destination: &Destination) -> Vec<NextHop> {
        let routes = self.routes.read().await;
        routes
            .get(&vni)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(dest, _)| dest == destination)
                    .map(|(_, hop)| *hop)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn route_count(&self) -> usize {
        let routes = self.routes.read().await;
        routes.values().map(HashSet::len).sum()
    }
}

impl Default for LocalRouteTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RouteFabric for LocalRouteTable {
    async fn is_route_announced(
        &self,
        vni: Vni,
        destination: &Destination,
        next_hop: &NextHop,
    ) -> Result<bool> {
        let routes = self.routes.read().await;
        Ok(routes
            .get(&vni)
            .is_some_and(|entries| entries.contains(&(*destination, *next_hop))))
    }

    async fn announce_route(
        &self,
        vni: Vni,
        destination: &Destination,
        next_hop: &NextHop,
    ) -> Result<()> {
        let mut routes = self.routes.write().await;
        routes
            .entry(vni)
            .or_default()
            .insert((*destination, *next_hop));
        self.publish_size(&routes);
        debug!(%vni, %destination, %next_hop, "Announced route");
        Ok(())
    }

    async fn withdraw_route(
        &self,
        vni: Vni,
        destination: &Destination,
        next_hop: &NextHop,
    ) -> Result<()> {
        let mut routes = self.routes.write().await;
        let removed = match routes.get_mut(&vni) {
            Some(entries) => {
                let removed = entries.remove(&(*destination, *next_hop));
                if entries.is_empty() {
                    routes.remove(&vni);
                }
                removed
            }
            None => false,
        };
        self.publish_size(&routes);
        debug!(%vni, %destination, %next_hop, removed, "Withdrew route");
        Ok(())
    }
}
