//! Seam to the overlay routing fabric

use crate::Result;
use async_trait::async_trait;
use lb_api::{Destination, NextHop, Vni};

#[cfg(test)]
use mockall::automock;

/// Route table of the overlay fabric, keyed by (vni, destination, next hop)
///
/// Implementations must be last-writer-wins per key. Announcing is not
/// assumed to be idempotent, callers check `is_route_announced` first.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RouteFabric: Send + Sync {
    /// Whether this exact route is currently announced
    async fn is_route_announced(
        &self,
        vni: Vni,
        destination: &Destination,
        next_hop: &NextHop,
    ) -> Result<bool>;

    /// Announce a route to peers
    async fn announce_route(
        &self,
        vni: Vni,
        destination: &Destination,
        next_hop: &NextHop,
    ) -> Result<()>;

    /// Withdraw a route; withdrawing an absent route succeeds
    async fn withdraw_route(
        &self,
        vni: Vni,
        destination: &Destination,
        next_hop: &NextHop,
    ) -> Result<()>;
}
